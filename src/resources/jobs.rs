use super::ResourceDef;
use crate::validation::{Field, Schema};

pub const STATUSES: &[&str] = &["scheduled", "in_progress", "on_hold", "completed", "cancelled"];

pub fn resource() -> ResourceDef {
    let schema = Schema::new()
        .field("order_id", Field::reference("orders").required())
        .field("title", Field::text().required())
        .field("description", Field::long_text())
        .field("status", Field::one_of(STATUSES).default("scheduled"))
        .field("scheduled_at", Field::timestamp())
        .field("completed_at", Field::timestamp())
        .field("assigned_to", Field::reference("users"));

    ResourceDef::new("jobs", "job", schema)
}
