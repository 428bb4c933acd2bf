use super::{Association, ResourceDef};
use crate::validation::{Field, Schema};

pub fn resource() -> ResourceDef {
    let schema = Schema::new()
        .field("name", Field::text().required())
        .field("email", Field::email())
        .field("phone", Field::text().max_len(50))
        .field("address", Field::text().max_len(500))
        .field("contact_name", Field::text())
        .field("website", Field::url());

    ResourceDef::new("suppliers", "supplier", schema)
        .with_association(Association::has_many("stocks", "stocks", "supplier_id"))
}
