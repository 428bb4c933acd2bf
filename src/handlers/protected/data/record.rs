use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, Extension, Path, State},
    http::{Method, Uri},
};

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::types::{Action, Record};

use super::utils::{body_bytes, invalid_id, parse_id, parse_json, query_params, resolve};

/// GET /v1/:resource/:id - one record, optionally `?attributes=a,b`
pub async fn get(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path((resource, id)): Path<(String, String)>,
    uri: Uri,
) -> ApiResult<Record> {
    let resource = resolve(&state, &resource)?;
    auth_user.require(resource, Action::Get)?;

    let id = parse_id(&id)?;
    let attributes = query_params(&uri)?.get("attributes").map(|raw| {
        raw.split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
    });
    let record = state.service.select_404(resource, auth_user.tenant_id, id, attributes).await?;
    Ok(ApiResponse::success(record))
}

/// PATCH /v1/:resource/:id - partial update
pub async fn patch(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path((resource, id)): Path<(String, String)>,
    body: Result<Bytes, BytesRejection>,
) -> ApiResult<Record> {
    let resource = resolve(&state, &resource)?;
    auth_user.require(resource, Action::Update)?;

    let id = parse_id(&id)?;
    let payload = parse_json(&body_bytes(body)?)?;
    let record = state.service.update_404(resource, auth_user.actor(), id, &payload).await?;
    Ok(ApiResponse::success(record))
}

/// DELETE /v1/:resource/:id - soft delete, returns the deleted record
pub async fn delete(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path((resource, id)): Path<(String, String)>,
) -> ApiResult<Record> {
    let resource = resolve(&state, &resource)?;
    auth_user.require(resource, Action::Delete)?;

    let id = parse_id(&id)?;
    let record = state.service.delete_404(resource, auth_user.actor(), id).await?;
    Ok(ApiResponse::success(record))
}

/// GET|PATCH|DELETE /v1/:resource/search - `search` is not a record id
pub async fn search_as_id(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(resource): Path<String>,
    method: Method,
) -> ApiResult<Record> {
    let resource = resolve(&state, &resource)?;
    let action = match method {
        Method::PATCH => Action::Update,
        Method::DELETE => Action::Delete,
        _ => Action::Get,
    };
    auth_user.require(resource, action)?;
    Err(invalid_id("search"))
}
