use super::{Association, ResourceDef};
use crate::validation::{Field, Schema};

pub fn resource() -> ResourceDef {
    let schema = Schema::new()
        .field("email", Field::email().required().unique())
        .field("first_name", Field::text().max_len(100))
        .field("last_name", Field::text().max_len(100))
        .field("phone", Field::text().max_len(50))
        .field("is_active", Field::boolean().default(true));

    ResourceDef::new("users", "user", schema).with_association(Association::many_to_many(
        "roles",
        "roles",
        "user_roles",
        "user_id",
        "role_id",
    ))
}
