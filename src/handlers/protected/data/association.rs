use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, Extension, Path, State},
    http::Uri,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use validator::Validate;

use crate::app::AppState;
use crate::database::Page;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::types::{Action, Record};
use crate::validation::filter_data_from_params;

use super::utils::{body_bytes, parse_id, parse_typed, query_params, resolve, resolve_association};

/// Body of `POST /v1/:resource/:id/:association`
#[derive(Debug, Default, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct LinkRequest {
    #[validate(range(min = 1, message = "must be a positive integer"))]
    #[serde(default)]
    pub id: i64,
}

/// GET /v1/:resource/:id/:association
pub async fn list(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path((resource, id, association)): Path<(String, String, String)>,
    uri: Uri,
) -> ApiResult<Page> {
    let owner = resolve(&state, &resource)?;
    let association = resolve_association(owner, &association)?;
    auth_user.require(owner, Action::Get)?;

    let id = parse_id(&id)?;
    let target = resolve(&state, association.target)?;
    let params = query_params(&uri)?;
    let filter_data = filter_data_from_params(&params, target.columns())?;
    let page = state
        .service
        .select_associated(owner, association, auth_user.tenant_id, id, filter_data)
        .await?;
    Ok(ApiResponse::success(page))
}

/// POST /v1/:resource/:id/:association - link an existing record
pub async fn link(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path((resource, id, association)): Path<(String, String, String)>,
    body: Result<Bytes, BytesRejection>,
) -> ApiResult<Record> {
    let owner = resolve(&state, &resource)?;
    let association = resolve_association(owner, &association)?;
    auth_user.require(owner, Action::Update)?;

    let id = parse_id(&id)?;
    let request: LinkRequest = parse_typed(&body_bytes(body)?)?;
    let record = state
        .service
        .link_one(owner, association, auth_user.actor(), id, request.id)
        .await?;
    Ok(ApiResponse::created(record))
}

/// DELETE /v1/:resource/:id/:association/:target_id - remove a link
pub async fn unlink(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path((resource, id, association, target_id)): Path<(String, String, String, String)>,
) -> ApiResult<Value> {
    let owner = resolve(&state, &resource)?;
    let association = resolve_association(owner, &association)?;
    auth_user.require(owner, Action::Update)?;

    let id = parse_id(&id)?;
    let target_id = parse_id(&target_id)?;
    state
        .service
        .unlink_one(owner, association, auth_user.actor(), id, target_id)
        .await?;
    Ok(ApiResponse::success(json!({
        "owner": { "resource": owner.name, "id": id },
        "target": { "resource": association.target, "id": target_id },
        "linked": false
    })))
}
