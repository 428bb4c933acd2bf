use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config;

/// Bearer token payload. `permissions` holds strings such as `"get orders"`;
/// `roles` is informational and never consulted for access decisions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Acting user id
    pub sub: i64,
    pub tenant_id: i64,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
    pub iat: i64,
    pub exp: i64,
    #[serde(default)]
    pub jti: Option<String>,
}

impl Claims {
    pub fn new(user_id: i64, tenant_id: i64, roles: Vec<String>, permissions: Vec<String>) -> Self {
        let expiry_hours = config::config().security.jwt_expiry_hours;
        Self::with_ttl(user_id, tenant_id, roles, permissions, Duration::hours(expiry_hours as i64))
    }

    pub fn with_ttl(user_id: i64, tenant_id: i64, roles: Vec<String>, permissions: Vec<String>, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id,
            tenant_id,
            roles,
            permissions,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            jti: Some(Uuid::new_v4().to_string()),
        }
    }
}

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("JWT secret not configured")]
    InvalidSecret,

    #[error("Token has expired")]
    Expired,

    #[error("Invalid token: {0}")]
    Invalid(String),
}

/// Sign with the configured secret
pub fn generate_jwt(claims: &Claims) -> Result<String, JwtError> {
    encode_jwt(claims, &config::config().security.jwt_secret)
}

/// Verify signature and expiry with the configured secret
pub fn decode_jwt(token: &str) -> Result<Claims, JwtError> {
    decode_jwt_with(token, &config::config().security.jwt_secret)
}

pub fn encode_jwt(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }
    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), claims, &encoding_key).map_err(|e| JwtError::TokenGeneration(e.to_string()))
}

pub fn decode_jwt_with(token: &str, secret: &str) -> Result<Claims, JwtError> {
    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }
    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let mut validation = Validation::default();
    validation.leeway = 0;

    decode::<Claims>(token, &decoding_key, &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => JwtError::Expired,
            _ => JwtError::Invalid(e.to_string()),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    fn claims() -> Claims {
        Claims::with_ttl(4, 1, vec!["sales".into()], vec!["get orders".into()], Duration::hours(1))
    }

    #[test]
    fn round_trips_claims() {
        let token = encode_jwt(&claims(), SECRET).unwrap();
        let decoded = decode_jwt_with(&token, SECRET).unwrap();
        assert_eq!(decoded.sub, 4);
        assert_eq!(decoded.tenant_id, 1);
        assert_eq!(decoded.permissions, vec!["get orders".to_string()]);
        assert!(decoded.jti.is_some());
    }

    #[test]
    fn rejects_wrong_secret_and_expired_tokens() {
        let token = encode_jwt(&claims(), SECRET).unwrap();
        assert!(matches!(decode_jwt_with(&token, "other"), Err(JwtError::Invalid(_))));

        let expired = Claims::with_ttl(4, 1, vec![], vec![], Duration::hours(-2));
        let token = encode_jwt(&expired, SECRET).unwrap();
        assert!(matches!(decode_jwt_with(&token, SECRET), Err(JwtError::Expired)));
    }

    #[test]
    fn refuses_empty_secret() {
        assert!(matches!(encode_jwt(&claims(), ""), Err(JwtError::InvalidSecret)));
    }
}
