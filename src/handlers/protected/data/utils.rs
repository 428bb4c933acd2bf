use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::Query;
use axum::http::Uri;
use serde::de::DeserializeOwned;
use serde_json::Value;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::resources::{Association, ResourceDef};

/// Look up `/v1/:resource`; unknown names are 404
pub fn resolve<'a>(state: &'a AppState, name: &str) -> Result<&'a ResourceDef, ApiError> {
    state
        .service
        .catalog()
        .get(name)
        .ok_or_else(|| ApiError::not_found(format!("Unknown resource '{}'", name)))
}

pub fn resolve_association<'a>(resource: &'a ResourceDef, name: &str) -> Result<&'a Association, ApiError> {
    resource
        .association(name)
        .ok_or_else(|| ApiError::not_found(format!("{} has no association '{}'", resource.name, name)))
}

/// Path ids are positive integers
pub fn parse_id(raw: &str) -> Result<i64, ApiError> {
    match raw.parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(invalid_id(raw)),
    }
}

pub fn invalid_id(raw: &str) -> ApiError {
    ApiError::bad_request(format!("'{}' is not a valid id", raw))
}

pub fn query_params(uri: &Uri) -> Result<HashMap<String, String>, ApiError> {
    Query::<HashMap<String, String>>::try_from_uri(uri)
        .map(|Query(params)| params)
        .map_err(|e| ApiError::bad_request(format!("Invalid query string: {}", e.body_text())))
}

/// Body bytes, with an over-limit body reported in the API envelope
pub fn body_bytes(body: Result<Bytes, BytesRejection>) -> Result<Bytes, ApiError> {
    body.map_err(|e| match e {
        BytesRejection::FailedToBufferBody(_) => ApiError::PayloadTooLarge("Request body is too large".to_string()),
        other => ApiError::bad_request(other.body_text()),
    })
}

/// Parse a required JSON body
pub fn parse_json(body: &Bytes) -> Result<Value, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ApiError::invalid_json("Request body is required"));
    }
    serde_json::from_slice(body).map_err(|e| ApiError::invalid_json(format!("Invalid JSON body: {}", e)))
}

/// Deserialize an optional JSON body; an empty body yields `T::default()`
pub fn parse_or_default<T>(body: &Bytes) -> Result<T, ApiError>
where
    T: DeserializeOwned + Default,
{
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| ApiError::invalid_json(format!("Invalid JSON body: {}", e)))
}

/// Deserialize then run the type's `validator` rules
pub fn parse_typed<T>(body: &Bytes) -> Result<T, ApiError>
where
    T: DeserializeOwned + Validate + Default,
{
    let value: T = parse_or_default(body)?;
    value.validate().map_err(|errors| {
        let fields = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let message = errs
                    .first()
                    .and_then(|e| e.message.as_ref().map(|m| m.to_string()))
                    .unwrap_or_else(|| "is invalid".to_string());
                (field.to_string(), message)
            })
            .collect();
        ApiError::validation_error("Validation failed", Some(fields))
    })?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, Deserialize, Validate)]
    struct Probe {
        #[validate(range(min = 1, message = "must be a positive integer"))]
        id: i64,
    }

    #[test]
    fn ids_must_be_positive_integers() {
        assert_eq!(parse_id("42").unwrap(), 42);
        assert!(parse_id("0").is_err());
        assert!(parse_id("abc").is_err());
        assert!(parse_id("-3").is_err());
    }

    #[test]
    fn typed_bodies_report_field_messages() {
        let err = parse_typed::<Probe>(&Bytes::from_static(br#"{"id": 0}"#)).unwrap_err();
        let body = err.to_json();
        assert_eq!(body["error"]["fields"]["id"], "must be a positive integer");
        assert!(parse_typed::<Probe>(&Bytes::from_static(b"{oops")).is_err());
        assert_eq!(parse_typed::<Probe>(&Bytes::from_static(br#"{"id": 3}"#)).unwrap().id, 3);
        assert!(parse_typed::<Probe>(&Bytes::new()).is_err());
    }

    #[test]
    fn empty_json_body_is_rejected() {
        assert!(parse_json(&Bytes::from_static(b"  ")).is_err());
        assert!(parse_json(&Bytes::from_static(br#"{"a":1}"#)).is_ok());
    }

    #[test]
    fn reads_query_params() {
        let uri: Uri = "/v1/clients?limit=5&name=Acme%20Ltd".parse().unwrap();
        let params = query_params(&uri).unwrap();
        assert_eq!(params.get("name").map(String::as_str), Some("Acme Ltd"));
        assert_eq!(params.get("limit").map(String::as_str), Some("5"));
    }
}
