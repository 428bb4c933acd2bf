use super::{Association, ResourceDef};
use crate::validation::{Field, Schema};

pub const STATUSES: &[&str] = &["draft", "sent", "accepted", "rejected", "expired"];

pub fn resource() -> ResourceDef {
    let schema = Schema::new()
        .field("client_id", Field::reference("clients").required())
        .field("reference", Field::text().max_len(100))
        .field("status", Field::one_of(STATUSES).default("draft"))
        .field("issued_on", Field::date())
        .field("valid_until", Field::date())
        .field("total", Field::decimal().min(0.0).default(0))
        .field("notes", Field::long_text());

    ResourceDef::new("quotes", "quote", schema).with_association(Association::many_to_many(
        "services",
        "services",
        "quote_services",
        "quote_id",
        "service_id",
    ))
}
