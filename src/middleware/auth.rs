use axum::{extract::Request, http::HeaderMap, middleware::Next, response::Response};
use serde::Serialize;

use crate::auth::{decode_jwt, Claims};
use crate::error::ApiError;
use crate::resources::ResourceDef;
use crate::types::{Action, Actor};

/// Authenticated caller extracted from the bearer token
#[derive(Clone, Debug, Serialize)]
pub struct AuthUser {
    pub user_id: i64,
    pub tenant_id: i64,
    pub roles: Vec<String>,
    pub permissions: Vec<String>,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            tenant_id: claims.tenant_id,
            roles: claims.roles,
            permissions: claims.permissions,
        }
    }
}

impl AuthUser {
    pub fn can(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }

    /// 403 unless the token grants `action` on `resource`
    pub fn require(&self, resource: &ResourceDef, action: Action) -> Result<(), ApiError> {
        let permission = resource.permission(action);
        if self.can(&permission) {
            Ok(())
        } else {
            tracing::info!(user_id = self.user_id, tenant_id = self.tenant_id, %permission, "permission denied");
            Err(ApiError::forbidden(format!("Missing permission '{}'", permission)))
        }
    }

    pub fn actor(&self) -> Actor {
        Actor {
            tenant_id: self.tenant_id,
            user_id: self.user_id,
        }
    }
}

/// JWT authentication middleware that validates tokens and extracts user context
pub async fn jwt_auth_middleware(headers: HeaderMap, mut request: Request, next: Next) -> Result<Response, ApiError> {
    let token = extract_jwt_from_headers(&headers).map_err(ApiError::unauthorized)?;
    let claims = decode_jwt(token)?;

    request.extensions_mut().insert(AuthUser::from(claims));
    Ok(next.run(request).await)
}

/// Extract JWT token from Authorization header
fn extract_jwt_from_headers(headers: &HeaderMap) -> Result<&str, &'static str> {
    let auth_header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or("Missing Authorization header")?;

    let auth_str = auth_header.to_str().map_err(|_| "Invalid Authorization header format")?;

    match auth_str.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim()),
        Some(_) => Err("Empty JWT token"),
        None => Err("Authorization header must use Bearer token format"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn reads_bearer_tokens_only() {
        let mut headers = HeaderMap::new();
        assert!(extract_jwt_from_headers(&headers).is_err());

        headers.insert("authorization", HeaderValue::from_static("Basic abc"));
        assert!(extract_jwt_from_headers(&headers).is_err());

        headers.insert("authorization", HeaderValue::from_static("Bearer   "));
        assert_eq!(extract_jwt_from_headers(&headers), Err("Empty JWT token"));

        headers.insert("authorization", HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(extract_jwt_from_headers(&headers), Ok("abc.def.ghi"));
    }

    #[test]
    fn permissions_are_exact_strings() {
        let user = AuthUser {
            user_id: 1,
            tenant_id: 1,
            roles: vec!["admin".into()],
            permissions: vec!["get orders".into()],
        };
        let catalog = crate::resources::Catalog::standard();
        let orders = catalog.get("orders").unwrap();
        assert!(user.require(orders, Action::Get).is_ok());
        assert!(user.require(orders, Action::Delete).is_err());
        assert!(!user.can("get order"));
    }
}
