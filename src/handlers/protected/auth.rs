use axum::extract::Extension;

use crate::middleware::{ApiResponse, ApiResult, AuthUser};

/// GET /v1/auth/whoami - the caller as seen by the API
pub async fn whoami(Extension(auth_user): Extension<AuthUser>) -> ApiResult<AuthUser> {
    Ok(ApiResponse::success(auth_user))
}
