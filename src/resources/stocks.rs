use super::ResourceDef;
use crate::validation::{Field, Schema};

pub fn resource() -> ResourceDef {
    let schema = Schema::new()
        .field("name", Field::text().required())
        .field("sku", Field::text().max_len(100).unique())
        .field("unit", Field::text().max_len(50))
        .field("quantity", Field::integer().min(0.0).default(0))
        .field("reorder_level", Field::integer().min(0.0))
        .field("unit_cost", Field::decimal().min(0.0))
        .field("supplier_id", Field::reference("suppliers"));

    ResourceDef::new("stocks", "stock item", schema)
}
