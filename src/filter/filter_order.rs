use serde_json::Value;

use super::error::FilterError;
use super::types::{Columns, FilterOrderInfo, SortDirection};

pub struct FilterOrder;

impl FilterOrder {
    /// Accepts `"name asc, created_at desc"`, `["name asc", "id"]` or
    /// `{ "name": "asc", "created_at": "desc" }`.
    pub fn validate_and_parse(order: &Value, columns: &Columns) -> Result<Vec<FilterOrderInfo>, FilterError> {
        match order {
            Value::Null => Ok(vec![]),
            Value::String(s) => Self::parse_order_string(s, columns),
            Value::Array(arr) => {
                let mut out = Vec::new();
                for v in arr {
                    match v {
                        Value::String(s) => out.extend(Self::parse_order_string(s, columns)?),
                        _ => return Err(FilterError::InvalidOrder("order entries must be strings".to_string())),
                    }
                }
                Ok(out)
            }
            Value::Object(obj) => {
                let mut out = Vec::new();
                for (k, v) in obj {
                    let dir = v
                        .as_str()
                        .ok_or_else(|| FilterError::InvalidOrder(format!("direction for {} must be a string", k)))?;
                    out.push(Self::info(k, dir, columns)?);
                }
                Ok(out)
            }
            _ => Err(FilterError::InvalidOrder("unsupported order format".to_string())),
        }
    }

    fn parse_order_string(s: &str, columns: &Columns) -> Result<Vec<FilterOrderInfo>, FilterError> {
        let mut out = Vec::new();
        for part in s.split(',') {
            let trimmed = part.trim();
            if trimmed.is_empty() {
                continue;
            }
            let mut it = trimmed.split_whitespace();
            let col = it.next().unwrap_or_default();
            let dir = it.next().unwrap_or("asc");
            if it.next().is_some() {
                return Err(FilterError::InvalidOrder(format!("unexpected token in '{}'", trimmed)));
            }
            out.push(Self::info(col, dir, columns)?);
        }
        Ok(out)
    }

    fn info(column: &str, dir: &str, columns: &Columns) -> Result<FilterOrderInfo, FilterError> {
        let column_type = columns
            .get(column)
            .ok_or_else(|| FilterError::InvalidColumn(column.to_string()))?;
        let sort = match dir.to_ascii_lowercase().as_str() {
            "asc" => SortDirection::Asc,
            "desc" => SortDirection::Desc,
            other => return Err(FilterError::InvalidOrder(format!("unknown direction '{}'", other))),
        };
        Ok(FilterOrderInfo {
            column: column.to_string(),
            column_type,
            sort,
        })
    }

    pub fn generate(infos: &[FilterOrderInfo]) -> String {
        if infos.is_empty() {
            return String::new();
        }
        let parts: Vec<String> = infos
            .iter()
            .map(|i| format!("\"{}\" {}", i.column, i.sort.to_sql()))
            .collect();
        format!("ORDER BY {}", parts.join(", "))
    }
}
