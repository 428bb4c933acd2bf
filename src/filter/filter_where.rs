use chrono::{DateTime, NaiveDate};
use serde_json::{Map, Value};

use super::error::FilterError;
use super::types::{ColumnType, Columns, Condition, FilterOp};

/// Parses the JSON WHERE dialect into a [`Condition`] tree.
///
/// ```json
/// { "status": "draft", "total": { "$gte": 100 }, "$or": [{ "client_id": 4 }, { "client_id": 9 }] }
/// ```
pub struct FilterWhere<'a> {
    columns: &'a Columns,
    max_depth: u32,
}

impl<'a> FilterWhere<'a> {
    pub fn new(columns: &'a Columns, max_depth: u32) -> Self {
        Self { columns, max_depth }
    }

    pub fn parse(&self, where_data: &Value) -> Result<Condition, FilterError> {
        match where_data {
            Value::Null => Ok(Condition::all()),
            Value::Object(obj) => self.parse_object(obj, 1),
            _ => Err(FilterError::InvalidWhereClause("WHERE must be a JSON object".to_string())),
        }
    }

    fn parse_object(&self, obj: &Map<String, Value>, depth: u32) -> Result<Condition, FilterError> {
        if depth > self.max_depth {
            return Err(FilterError::TooDeep(self.max_depth));
        }

        let mut parts = Vec::with_capacity(obj.len());
        for (key, value) in obj {
            if key.starts_with('$') {
                parts.push(self.parse_logical_operator(key, value, depth)?);
            } else {
                parts.extend(self.parse_field_condition(key, value)?);
            }
        }

        Ok(if parts.len() == 1 { parts.remove(0) } else { Condition::And(parts) })
    }

    fn parse_logical_operator(&self, op: &str, value: &Value, depth: u32) -> Result<Condition, FilterError> {
        match op {
            "$and" | "$or" => {
                let arr = value
                    .as_array()
                    .ok_or_else(|| FilterError::InvalidOperatorData(format!("{} requires an array", op)))?;
                let mut parts = Vec::with_capacity(arr.len());
                for v in arr {
                    let obj = v.as_object().ok_or_else(|| {
                        FilterError::InvalidOperatorData(format!("{} entries must be objects", op))
                    })?;
                    parts.push(self.parse_object(obj, depth + 1)?);
                }
                Ok(if op == "$and" { Condition::And(parts) } else { Condition::Or(parts) })
            }
            "$not" => {
                let obj = value
                    .as_object()
                    .ok_or_else(|| FilterError::InvalidOperatorData("$not requires an object".to_string()))?;
                Ok(Condition::Not(Box::new(self.parse_object(obj, depth + 1)?)))
            }
            other => Err(FilterError::UnsupportedOperator(other.to_string())),
        }
    }

    fn parse_field_condition(&self, field: &str, value: &Value) -> Result<Vec<Condition>, FilterError> {
        let column_type = self
            .columns
            .get(field)
            .ok_or_else(|| FilterError::InvalidColumn(field.to_string()))?;

        match value {
            Value::Object(obj) => obj
                .iter()
                .map(|(op_key, op_val)| {
                    let op = Self::map_operator(op_key)?;
                    Self::compare(field, column_type, op, op_val)
                })
                .collect(),
            // Implicit membership: { field: [a, b] }
            Value::Array(_) => Ok(vec![Self::compare(field, column_type, FilterOp::In, value)?]),
            // Implicit equality: { field: value }
            _ => Ok(vec![Self::compare(field, column_type, FilterOp::Eq, value)?]),
        }
    }

    fn map_operator(op_key: &str) -> Result<FilterOp, FilterError> {
        Ok(match op_key {
            "$eq" => FilterOp::Eq,
            "$ne" | "$neq" => FilterOp::Ne,
            "$gt" => FilterOp::Gt,
            "$gte" => FilterOp::Gte,
            "$lt" => FilterOp::Lt,
            "$lte" => FilterOp::Lte,
            "$like" => FilterOp::Like,
            "$ilike" => FilterOp::ILike,
            "$in" => FilterOp::In,
            "$nin" => FilterOp::NIn,
            "$between" => FilterOp::Between,
            "$null" => FilterOp::Null,
            other => return Err(FilterError::UnsupportedOperator(other.to_string())),
        })
    }

    fn compare(column: &str, column_type: ColumnType, op: FilterOp, data: &Value) -> Result<Condition, FilterError> {
        let value = match op {
            FilterOp::Eq | FilterOp::Ne => {
                if data.is_null() {
                    Value::Null
                } else {
                    coerce(column, column_type, data)?
                }
            }
            FilterOp::Gt | FilterOp::Gte | FilterOp::Lt | FilterOp::Lte => {
                if data.is_null() {
                    return Err(FilterError::InvalidOperatorData(format!("{}: comparison with null", column)));
                }
                coerce(column, column_type, data)?
            }
            FilterOp::Like | FilterOp::ILike => {
                if column_type != ColumnType::Text {
                    return Err(FilterError::InvalidOperatorData(format!(
                        "{}: pattern matching requires a text column",
                        column
                    )));
                }
                match data {
                    Value::String(_) => data.clone(),
                    _ => return Err(FilterError::InvalidOperatorData(format!("{}: pattern must be a string", column))),
                }
            }
            FilterOp::In | FilterOp::NIn => {
                let values = data
                    .as_array()
                    .ok_or_else(|| FilterError::InvalidOperatorData(format!("{}: $in/$nin require an array", column)))?;
                Value::Array(
                    values
                        .iter()
                        .map(|v| coerce(column, column_type, v))
                        .collect::<Result<Vec<_>, _>>()?,
                )
            }
            FilterOp::Between => match data.as_array() {
                Some(values) if values.len() == 2 && values.iter().all(|v| !v.is_null()) => Value::Array(vec![
                    coerce(column, column_type, &values[0])?,
                    coerce(column, column_type, &values[1])?,
                ]),
                _ => {
                    return Err(FilterError::InvalidOperatorData(format!(
                        "{}: $between requires exactly 2 values",
                        column
                    )))
                }
            },
            FilterOp::Null => match data {
                Value::Bool(_) => data.clone(),
                _ => return Err(FilterError::InvalidOperatorData(format!("{}: $null requires true or false", column))),
            },
        };

        Ok(Condition::Compare {
            column: column.to_string(),
            column_type,
            op,
            value,
        })
    }
}

/// Coerce a scalar into the column's type. Strings are accepted for numbers
/// and booleans because query-string filters arrive untyped.
pub fn coerce(column: &str, column_type: ColumnType, value: &Value) -> Result<Value, FilterError> {
    let invalid = || FilterError::InvalidOperatorData(format!("{}: expected {:?} value, got {}", column, column_type, value));

    match (column_type, value) {
        (_, Value::Array(_)) | (_, Value::Object(_)) | (_, Value::Null) => Err(invalid()),
        (ColumnType::Text, Value::String(_)) => Ok(value.clone()),
        (ColumnType::Text, _) => Err(invalid()),
        (ColumnType::Integer, Value::Number(n)) => n.as_i64().map(Value::from).ok_or_else(invalid),
        (ColumnType::Integer, Value::String(s)) => s.trim().parse::<i64>().map(Value::from).map_err(|_| invalid()),
        (ColumnType::Decimal, Value::Number(_)) => Ok(value.clone()),
        (ColumnType::Decimal, Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .ok_or_else(invalid),
        (ColumnType::Boolean, Value::Bool(_)) => Ok(value.clone()),
        (ColumnType::Boolean, Value::String(s)) => match s.as_str() {
            "true" | "1" => Ok(Value::Bool(true)),
            "false" | "0" => Ok(Value::Bool(false)),
            _ => Err(invalid()),
        },
        (ColumnType::Date, Value::String(s)) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(|date| Value::String(date.format("%Y-%m-%d").to_string()))
            .map_err(|_| invalid()),
        (ColumnType::Timestamp, Value::String(s)) => DateTime::parse_from_rfc3339(s)
            .map(|_| value.clone())
            .map_err(|_| invalid()),
        _ => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn columns() -> Columns {
        Columns::new()
            .with("id", ColumnType::Integer)
            .with("name", ColumnType::Text)
            .with("total", ColumnType::Decimal)
            .with("due_on", ColumnType::Date)
            .with("is_active", ColumnType::Boolean)
    }

    #[test]
    fn implicit_equality_and_membership() {
        let cols = columns();
        let c = FilterWhere::new(&cols, 5).parse(&json!({ "name": "Acme" })).unwrap();
        assert_eq!(c, Condition::eq("name", ColumnType::Text, json!("Acme")));

        let c = FilterWhere::new(&cols, 5).parse(&json!({ "id": [1, "2"] })).unwrap();
        match c {
            Condition::Compare { op, value, .. } => {
                assert_eq!(op, FilterOp::In);
                assert_eq!(value, json!([1, 2]));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn rejects_unknown_columns_and_operators() {
        let cols = columns();
        let fw = FilterWhere::new(&cols, 5);
        assert!(matches!(fw.parse(&json!({ "tenant_id": 1 })), Err(FilterError::InvalidColumn(_))));
        assert!(matches!(
            fw.parse(&json!({ "name": { "$regex": "x" } })),
            Err(FilterError::UnsupportedOperator(_))
        ));
        assert!(matches!(fw.parse(&json!("1=1")), Err(FilterError::InvalidWhereClause(_))));
    }

    #[test]
    fn validates_operator_data() {
        let cols = columns();
        let fw = FilterWhere::new(&cols, 5);
        assert!(fw.parse(&json!({ "total": { "$between": [1] } })).is_err());
        assert!(fw.parse(&json!({ "total": { "$like": "1%" } })).is_err());
        assert!(fw.parse(&json!({ "due_on": { "$gt": "not-a-date" } })).is_err());
        assert!(fw.parse(&json!({ "is_active": { "$null": "yes" } })).is_err());
        assert!(fw.parse(&json!({ "due_on": { "$between": ["2024-01-01", "2024-12-31"] } })).is_ok());
    }

    #[test]
    fn dates_are_normalized_to_stored_form() {
        let cols = columns();
        let c = FilterWhere::new(&cols, 5).parse(&json!({ "due_on": "2024-1-5" })).unwrap();
        assert_eq!(c, Condition::eq("due_on", ColumnType::Date, json!("2024-01-05")));

        let row = json!({ "due_on": "2024-01-05" }).as_object().cloned().unwrap();
        assert!(c.matches(&row));
        let range = FilterWhere::new(&cols, 5)
            .parse(&json!({ "due_on": { "$between": ["2024-1-1", "2024-1-31"] } }))
            .unwrap();
        assert!(range.matches(&row));
    }

    #[test]
    fn enforces_nesting_depth() {
        let cols = columns();
        let nested = json!({ "$or": [{ "$and": [{ "$not": { "id": 1 } }] }] });
        assert!(FilterWhere::new(&cols, 4).parse(&nested).is_ok());
        assert!(matches!(FilterWhere::new(&cols, 3).parse(&nested), Err(FilterError::TooDeep(3))));
    }
}
