use super::ResourceDef;
use crate::validation::{Field, Schema};

/// Named grants such as `"get orders"`; issued tokens carry these strings
pub fn resource() -> ResourceDef {
    let schema = Schema::new()
        .field("name", Field::text().max_len(100).required().unique())
        .field("description", Field::text().max_len(500));

    ResourceDef::new("permissions", "permission", schema)
}
