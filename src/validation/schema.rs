use std::collections::BTreeMap;

use serde_json::Value;

use super::error::ValidationError;
use super::field::Field;
use crate::filter::{ColumnType, Columns};
use crate::types::{Record, READABLE_SYSTEM_FIELDS, SYSTEM_FIELDS};

/// Declarative description of the writable columns of a resource.
///
/// ```ignore
/// Schema::new()
///     .field("name", Field::text().required())
///     .field("email", Field::email())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Schema {
    fields: Vec<(&'static str, Field)>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: &'static str, field: Field) -> Self {
        self.fields.push((name, field));
        self
    }

    pub fn fields(&self) -> impl Iterator<Item = (&'static str, &Field)> {
        self.fields.iter().map(|(name, field)| (*name, field))
    }

    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|(n, _)| *n == name).map(|(_, f)| f)
    }

    /// Everything a client may select, filter or sort on
    pub fn columns(&self) -> Columns {
        let mut columns = Columns::new();
        for name in READABLE_SYSTEM_FIELDS {
            let column_type = match *name {
                "created_at" | "updated_at" => ColumnType::Timestamp,
                _ => ColumnType::Integer,
            };
            columns.insert(*name, column_type);
        }
        for (name, field) in &self.fields {
            columns.insert(*name, field.column_type());
        }
        columns
    }

    pub fn validate_create(&self, body: &Value) -> Result<Record, ValidationError> {
        let input = body.as_object().ok_or(ValidationError::NotAnObject)?;
        let mut errors = self.reject_foreign_keys(input);
        let mut record = Record::new();

        for (name, field) in &self.fields {
            match input.get(*name) {
                Some(Value::Null) | None if field.required => {
                    errors.insert(name.to_string(), "is required".to_string());
                }
                Some(Value::Null) => {
                    record.insert(name.to_string(), Value::Null);
                }
                Some(value) => match field.check(value) {
                    Ok(v) => {
                        record.insert(name.to_string(), v);
                    }
                    Err(msg) => {
                        errors.insert(name.to_string(), msg);
                    }
                },
                None => {
                    if let Some(default) = &field.default {
                        record.insert(name.to_string(), default.clone());
                    }
                }
            }
        }

        if errors.is_empty() {
            Ok(record)
        } else {
            Err(ValidationError::Fields(errors))
        }
    }

    pub fn validate_update(&self, body: &Value) -> Result<Record, ValidationError> {
        let input = body.as_object().ok_or(ValidationError::NotAnObject)?;
        if input.is_empty() {
            return Err(ValidationError::Empty);
        }

        let mut errors = self.reject_foreign_keys(input);
        let mut record = Record::new();

        for (name, field) in &self.fields {
            match input.get(*name) {
                None => {}
                Some(Value::Null) if field.required => {
                    errors.insert(name.to_string(), "cannot be null".to_string());
                }
                Some(Value::Null) => {
                    record.insert(name.to_string(), Value::Null);
                }
                Some(value) => match field.check(value) {
                    Ok(v) => {
                        record.insert(name.to_string(), v);
                    }
                    Err(msg) => {
                        errors.insert(name.to_string(), msg);
                    }
                },
            }
        }

        if errors.is_empty() {
            Ok(record)
        } else {
            Err(ValidationError::Fields(errors))
        }
    }

    fn reject_foreign_keys(&self, input: &Record) -> BTreeMap<String, String> {
        input
            .keys()
            .filter(|key| self.get(key).is_none())
            .map(|key| {
                let msg = if SYSTEM_FIELDS.contains(&key.as_str()) {
                    "is managed by the server"
                } else {
                    "is not a recognised field"
                };
                (key.clone(), msg.to_string())
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> Schema {
        Schema::new()
            .field("name", Field::text().required())
            .field("email", Field::email())
            .field("status", Field::one_of(&["draft", "sent"]).default("draft"))
    }

    #[test]
    fn create_applies_defaults_and_requires_fields() {
        let record = schema().validate_create(&json!({ "name": "Acme" })).unwrap();
        assert_eq!(record.get("status"), Some(&json!("draft")));
        assert!(record.get("email").is_none());

        match schema().validate_create(&json!({ "email": "bad" })) {
            Err(ValidationError::Fields(errors)) => {
                assert_eq!(errors.get("name").map(String::as_str), Some("is required"));
                assert!(errors.contains_key("email"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn rejects_system_and_unknown_keys() {
        match schema().validate_create(&json!({ "name": "Acme", "id": 4, "colour": "red" })) {
            Err(ValidationError::Fields(errors)) => {
                assert_eq!(errors.get("id").map(String::as_str), Some("is managed by the server"));
                assert_eq!(errors.get("colour").map(String::as_str), Some("is not a recognised field"));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(schema().validate_create(&json!([1, 2])), Err(ValidationError::NotAnObject)));
    }

    #[test]
    fn update_is_partial() {
        let record = schema().validate_update(&json!({ "status": "sent" })).unwrap();
        assert_eq!(record.len(), 1);
        assert!(matches!(schema().validate_update(&json!({})), Err(ValidationError::Empty)));
        assert!(schema().validate_update(&json!({ "name": null })).is_err());
        let cleared = schema().validate_update(&json!({ "email": null })).unwrap();
        assert_eq!(cleared.get("email"), Some(&Value::Null));
    }

    #[test]
    fn columns_include_readable_system_fields_only() {
        let columns = schema().columns();
        assert_eq!(columns.get("created_at"), Some(ColumnType::Timestamp));
        assert_eq!(columns.get("id"), Some(ColumnType::Integer));
        assert!(columns.contains("status"));
        assert!(!columns.contains("tenant_id"));
        assert!(!columns.contains("deleted_at"));
    }
}
