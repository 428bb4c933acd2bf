/// Shared types used across the codebase

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A database row as it travels through the API: column name to JSON value.
pub type Record = Map<String, Value>;

/// Columns maintained by the server and never accepted from API input
pub const SYSTEM_FIELDS: &[&str] = &[
    "id",
    "tenant_id",
    "created_at",
    "updated_at",
    "deleted_at",
    "created_by",
    "updated_by",
    "deleted_by",
];

/// System columns that clients may read, filter and sort on
pub const READABLE_SYSTEM_FIELDS: &[&str] = &["id", "created_at", "updated_at", "created_by", "updated_by"];

/// Operations a token must be granted per resource.
/// The permission string is `"{verb} {resource}"`, e.g. `"get orders"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Get,
    Create,
    Update,
    Delete,
}

impl Action {
    pub const ALL: [Action; 4] = [Action::Get, Action::Create, Action::Update, Action::Delete];

    pub fn verb(&self) -> &'static str {
        match self {
            Action::Get => "get",
            Action::Create => "create",
            Action::Update => "update",
            Action::Delete => "delete",
        }
    }

    pub fn permission(&self, resource: &str) -> String {
        format!("{} {}", self.verb(), resource)
    }
}

/// Tenant and acting user attached to every repository call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub tenant_id: i64,
    pub user_id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permission_strings() {
        assert_eq!(Action::Get.permission("orders"), "get orders");
        assert_eq!(Action::Delete.permission("stocks"), "delete stocks");
    }
}
