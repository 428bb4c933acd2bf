use chrono::{DateTime, NaiveDate};
use serde_json::Value;
use validator::{ValidateEmail, ValidateUrl};

use crate::filter::ColumnType;

#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Text,
    Email,
    Url,
    Integer,
    Decimal,
    Boolean,
    Date,
    Timestamp,
    Enumeration(&'static [&'static str]),
}

/// One column of a resource schema with its declarative constraints
#[derive(Debug, Clone)]
pub struct Field {
    pub kind: FieldKind,
    pub required: bool,
    pub default: Option<Value>,
    pub unique: bool,
    /// Resource whose `id` this column points at
    pub references: Option<&'static str>,
    min_len: Option<usize>,
    max_len: Option<usize>,
    min: Option<f64>,
    max: Option<f64>,
}

impl Field {
    fn of(kind: FieldKind) -> Self {
        Self {
            kind,
            required: false,
            default: None,
            unique: false,
            references: None,
            min_len: None,
            max_len: None,
            min: None,
            max: None,
        }
    }

    pub fn text() -> Self {
        Self::of(FieldKind::Text).max_len(255)
    }

    /// Unbounded free text (notes, descriptions)
    pub fn long_text() -> Self {
        Self::of(FieldKind::Text).max_len(10_000)
    }

    pub fn email() -> Self {
        Self::of(FieldKind::Email).max_len(255)
    }

    pub fn url() -> Self {
        Self::of(FieldKind::Url).max_len(2048)
    }

    pub fn integer() -> Self {
        Self::of(FieldKind::Integer)
    }

    pub fn decimal() -> Self {
        Self::of(FieldKind::Decimal)
    }

    pub fn boolean() -> Self {
        Self::of(FieldKind::Boolean)
    }

    pub fn date() -> Self {
        Self::of(FieldKind::Date)
    }

    pub fn timestamp() -> Self {
        Self::of(FieldKind::Timestamp)
    }

    pub fn one_of(values: &'static [&'static str]) -> Self {
        Self::of(FieldKind::Enumeration(values))
    }

    /// Foreign key to another resource's `id`
    pub fn reference(resource: &'static str) -> Self {
        Self::of(FieldKind::Integer).min(1.0).references(resource)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn references(mut self, resource: &'static str) -> Self {
        self.references = Some(resource);
        self
    }

    pub fn min_len(mut self, n: usize) -> Self {
        self.min_len = Some(n);
        self
    }

    pub fn max_len(mut self, n: usize) -> Self {
        self.max_len = Some(n);
        self
    }

    pub fn min(mut self, n: f64) -> Self {
        self.min = Some(n);
        self
    }

    pub fn max(mut self, n: f64) -> Self {
        self.max = Some(n);
        self
    }

    pub fn column_type(&self) -> ColumnType {
        match self.kind {
            FieldKind::Text | FieldKind::Email | FieldKind::Url | FieldKind::Enumeration(_) => ColumnType::Text,
            FieldKind::Integer => ColumnType::Integer,
            FieldKind::Decimal => ColumnType::Decimal,
            FieldKind::Boolean => ColumnType::Boolean,
            FieldKind::Date => ColumnType::Date,
            FieldKind::Timestamp => ColumnType::Timestamp,
        }
    }

    /// Check a non-null input value, returning the normalized value to store
    pub fn check(&self, value: &Value) -> Result<Value, String> {
        let normalized = match (&self.kind, value) {
            (FieldKind::Text, Value::String(s)) => Value::String(s.trim().to_string()),
            (FieldKind::Email, Value::String(s)) => {
                let s = s.trim();
                if !s.validate_email() {
                    return Err("must be a valid email address".to_string());
                }
                Value::String(s.to_lowercase())
            }
            (FieldKind::Url, Value::String(s)) => {
                let s = s.trim();
                if !s.validate_url() {
                    return Err("must be a valid URL".to_string());
                }
                Value::String(s.to_string())
            }
            (FieldKind::Integer, Value::Number(n)) => match n.as_i64() {
                Some(i) => Value::from(i),
                None => return Err("must be an integer".to_string()),
            },
            (FieldKind::Decimal, Value::Number(_)) => value.clone(),
            (FieldKind::Boolean, Value::Bool(_)) => value.clone(),
            (FieldKind::Date, Value::String(s)) => match NaiveDate::parse_from_str(s, "%Y-%m-%d") {
                Ok(date) => Value::String(date.format("%Y-%m-%d").to_string()),
                Err(_) => return Err("must be a date formatted YYYY-MM-DD".to_string()),
            },
            (FieldKind::Timestamp, Value::String(s)) => match DateTime::parse_from_rfc3339(s) {
                Ok(ts) => Value::String(ts.to_rfc3339()),
                Err(_) => return Err("must be an RFC 3339 timestamp".to_string()),
            },
            (FieldKind::Enumeration(values), Value::String(s)) => {
                if !values.contains(&s.as_str()) {
                    return Err(format!("must be one of: {}", values.join(", ")));
                }
                value.clone()
            }
            (kind, _) => return Err(format!("must be {}", kind.describe())),
        };

        if let Value::String(s) = &normalized {
            let len = s.chars().count();
            if let Some(min) = self.min_len {
                if len < min {
                    return Err(format!("must be at least {} characters", min));
                }
            }
            if let Some(max) = self.max_len {
                if len > max {
                    return Err(format!("must be at most {} characters", max));
                }
            }
            if self.required && len == 0 {
                return Err("must not be empty".to_string());
            }
        }

        if let Some(n) = normalized.as_f64() {
            if let Some(min) = self.min {
                if n < min {
                    return Err(format!("must be greater than or equal to {}", min));
                }
            }
            if let Some(max) = self.max {
                if n > max {
                    return Err(format!("must be less than or equal to {}", max));
                }
            }
        }

        Ok(normalized)
    }
}

impl FieldKind {
    fn describe(&self) -> &'static str {
        match self {
            FieldKind::Text => "a string",
            FieldKind::Email => "an email address string",
            FieldKind::Url => "a URL string",
            FieldKind::Integer => "an integer",
            FieldKind::Decimal => "a number",
            FieldKind::Boolean => "a boolean",
            FieldKind::Date => "a date string",
            FieldKind::Timestamp => "a timestamp string",
            FieldKind::Enumeration(_) => "a string",
        }
    }
}
