use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, Extension, Path, State},
    http::Uri,
};

use crate::app::AppState;
use crate::database::Page;
use crate::filter::FilterData;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::types::{Action, Record};
use crate::validation::filter_data_from_params;

use super::utils::{body_bytes, parse_json, parse_or_default, query_params, resolve};

/// GET /v1/:resource - list with query-string filters
pub async fn list(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(resource): Path<String>,
    uri: Uri,
) -> ApiResult<Page> {
    let resource = resolve(&state, &resource)?;
    auth_user.require(resource, Action::Get)?;

    let params = query_params(&uri)?;
    let filter_data = filter_data_from_params(&params, resource.columns())?;
    let page = state.service.select_any(resource, auth_user.tenant_id, filter_data).await?;
    Ok(ApiResponse::success(page))
}

/// POST /v1/:resource/search - list with a JSON filter body
pub async fn search(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(resource): Path<String>,
    body: Result<Bytes, BytesRejection>,
) -> ApiResult<Page> {
    let resource = resolve(&state, &resource)?;
    auth_user.require(resource, Action::Get)?;

    let filter_data: FilterData = parse_or_default(&body_bytes(body)?)?;
    let page = state.service.select_any(resource, auth_user.tenant_id, filter_data).await?;
    Ok(ApiResponse::success(page))
}

/// POST /v1/:resource - create one record
pub async fn create(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(resource): Path<String>,
    body: Result<Bytes, BytesRejection>,
) -> ApiResult<Record> {
    let resource = resolve(&state, &resource)?;
    auth_user.require(resource, Action::Create)?;

    let payload = parse_json(&body_bytes(body)?)?;
    let record = state.service.create_one(resource, auth_user.actor(), &payload).await?;
    Ok(ApiResponse::created(record))
}
