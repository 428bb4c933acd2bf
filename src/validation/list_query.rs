use std::collections::HashMap;

use serde_json::{Map, Value};

use super::error::ValidationError;
use crate::filter::{Columns, FilterData, FilterError};

const RESERVED: &[&str] = &["limit", "offset", "page", "order", "attributes", "where"];

/// Translate list query-string parameters into [`FilterData`].
///
/// `?status=draft&order=created_at desc&limit=10&attributes=id,name&where={"total":{"$gt":0}}`
///
/// Unreserved keys become equality filters on allow-listed columns.
pub fn filter_data_from_params(params: &HashMap<String, String>, columns: &Columns) -> Result<FilterData, ValidationError> {
    let mut data = FilterData {
        limit: parse_number(params, "limit", FilterError::InvalidLimit)?,
        offset: parse_number(params, "offset", FilterError::InvalidOffset)?,
        page: parse_number(params, "page", FilterError::InvalidPage)?,
        ..Default::default()
    };

    if let Some(order) = params.get("order").filter(|s| !s.trim().is_empty()) {
        data.order = Some(Value::String(order.clone()));
    }

    if let Some(attributes) = params.get("attributes").filter(|s| !s.trim().is_empty()) {
        data.select = Some(
            attributes
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        );
    }

    let mut implicit = Map::new();
    let mut keys: Vec<&String> = params.keys().filter(|k| !RESERVED.contains(&k.as_str())).collect();
    keys.sort();
    for key in keys {
        if !columns.contains(key) {
            return Err(FilterError::InvalidColumn(key.clone()).into());
        }
        implicit.insert(key.clone(), Value::String(params[key].clone()));
    }

    let explicit = match params.get("where").filter(|s| !s.trim().is_empty()) {
        Some(raw) => Some(serde_json::from_str::<Value>(raw).map_err(FilterError::from)?),
        None => None,
    };

    data.where_clause = match (explicit, implicit.is_empty()) {
        (None, true) => None,
        (None, false) => Some(Value::Object(implicit)),
        (Some(explicit), true) => Some(explicit),
        (Some(explicit), false) => {
            let mut both = Map::new();
            both.insert("$and".to_string(), Value::Array(vec![explicit, Value::Object(implicit)]));
            Some(Value::Object(both))
        }
    };

    Ok(data)
}

fn parse_number(
    params: &HashMap<String, String>,
    key: &str,
    err: fn(String) -> FilterError,
) -> Result<Option<i64>, ValidationError> {
    match params.get(key).map(|s| s.trim()).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<i64>()
            .map(Some)
            .map_err(|_| err(format!("'{}' is not an integer", raw)).into()),
    }
}
