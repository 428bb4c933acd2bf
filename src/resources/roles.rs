use super::{Association, ResourceDef};
use crate::validation::{Field, Schema};

pub fn resource() -> ResourceDef {
    let schema = Schema::new()
        .field("name", Field::text().max_len(100).required().unique())
        .field("description", Field::text().max_len(500));

    ResourceDef::new("roles", "role", schema).with_association(Association::many_to_many(
        "permissions",
        "permissions",
        "role_permissions",
        "role_id",
        "permission_id",
    ))
}
