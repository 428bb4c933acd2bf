use super::ResourceDef;
use crate::validation::{Field, Schema};

/// Billable services offered to clients (labour, call-outs, installs)
pub fn resource() -> ResourceDef {
    let schema = Schema::new()
        .field("name", Field::text().required())
        .field("description", Field::long_text())
        .field("unit", Field::text().max_len(50))
        .field("unit_price", Field::decimal().required().min(0.0))
        .field("is_active", Field::boolean().default(true));

    ResourceDef::new("services", "service", schema)
}
