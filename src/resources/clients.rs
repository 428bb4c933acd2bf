use super::{Association, ResourceDef};
use crate::validation::{Field, Schema};

pub fn resource() -> ResourceDef {
    let schema = Schema::new()
        .field("name", Field::text().required())
        .field("email", Field::email())
        .field("phone", Field::text().max_len(50))
        .field("address", Field::text().max_len(500))
        .field("company", Field::text())
        .field("notes", Field::long_text());

    ResourceDef::new("clients", "client", schema)
        .with_association(Association::has_many("quotes", "quotes", "client_id"))
        .with_association(Association::has_many("orders", "orders", "client_id"))
}
