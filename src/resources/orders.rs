use super::{Association, ResourceDef};
use crate::validation::{Field, Schema};

pub const STATUSES: &[&str] = &["pending", "confirmed", "in_progress", "completed", "cancelled"];

pub fn resource() -> ResourceDef {
    let schema = Schema::new()
        .field("client_id", Field::reference("clients").required())
        .field("quote_id", Field::reference("quotes"))
        .field("reference", Field::text().max_len(100))
        .field("status", Field::one_of(STATUSES).default("pending"))
        .field("ordered_on", Field::date())
        .field("due_on", Field::date())
        .field("total", Field::decimal().min(0.0).default(0))
        .field("notes", Field::long_text());

    ResourceDef::new("orders", "order", schema)
        .with_association(Association::has_many("jobs", "jobs", "order_id"))
        .with_association(Association::many_to_many(
            "services",
            "services",
            "order_services",
            "order_id",
            "service_id",
        ))
}
