// handlers/public/mod.rs - endpoints that need no token
use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::error::ApiError;

/// GET / - service description
pub async fn root(State(state): State<AppState>) -> Json<Value> {
    let resources: Vec<&str> = state.service.catalog().iter().map(|r| r.name).collect();

    Json(json!({
        "success": true,
        "data": {
            "name": "BizOps API",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Multi-tenant business management REST API",
            "resources": resources,
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "whoami": "/v1/auth/whoami",
                "collection": "/v1/:resource (GET list, POST create)",
                "search": "/v1/:resource/search (POST filter body)",
                "record": "/v1/:resource/:id (GET, PATCH, DELETE)",
                "association": "/v1/:resource/:id/:association[/:target_id]",
            }
        }
    }))
}

/// GET /health - 503 when the store cannot be reached
pub async fn health(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let store = state.service.store();
    store.ping().await.map_err(|e| {
        tracing::error!("Health check failed: {}", e);
        ApiError::service_unavailable("database unavailable")
    })?;

    Ok(Json(json!({
        "success": true,
        "data": {
            "status": "ok",
            "timestamp": chrono::Utc::now(),
            "database": store.backend()
        }
    })))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::http::StatusCode;

    use super::*;
    use crate::database::{LinkSpec, MemoryStore, Page, RecordStore, RepositoryError, RepositoryResult};
    use crate::filter::Query;
    use crate::resources::{Catalog, ResourceDef};
    use crate::types::{Actor, Record};

    /// Store whose every call fails as if Postgres refused the connection
    struct Unreachable;

    fn refused<T>() -> RepositoryResult<T> {
        Err(RepositoryError::Connection("connection refused".to_string()))
    }

    #[async_trait]
    impl RecordStore for Unreachable {
        fn backend(&self) -> &'static str {
            "postgres"
        }
        async fn ping(&self) -> RepositoryResult<()> {
            refused()
        }
        async fn find_many(&self, _: &ResourceDef, _: i64, _: &Query) -> RepositoryResult<Page> {
            refused()
        }
        async fn find_linked(&self, _: &ResourceDef, _: LinkSpec, _: i64, _: i64, _: &Query) -> RepositoryResult<Page> {
            refused()
        }
        async fn find_by_id(&self, _: &ResourceDef, _: i64, _: i64, _: &[String]) -> RepositoryResult<Option<Record>> {
            refused()
        }
        async fn insert(&self, _: &ResourceDef, _: Actor, _: Record) -> RepositoryResult<Record> {
            refused()
        }
        async fn update(&self, _: &ResourceDef, _: Actor, _: i64, _: Record) -> RepositoryResult<Option<Record>> {
            refused()
        }
        async fn soft_delete(&self, _: &ResourceDef, _: Actor, _: i64) -> RepositoryResult<Option<Record>> {
            refused()
        }
        async fn link(&self, _: LinkSpec, _: Actor, _: i64, _: i64) -> RepositoryResult<bool> {
            refused()
        }
        async fn unlink(&self, _: LinkSpec, _: i64, _: i64, _: i64) -> RepositoryResult<bool> {
            refused()
        }
    }

    #[tokio::test]
    async fn health_reports_the_backend() {
        let state = AppState::new(Arc::new(MemoryStore::new()), Catalog::standard());
        let Json(body) = health(State(state)).await.unwrap();
        assert_eq!(body["data"]["status"], json!("ok"));
        assert_eq!(body["data"]["database"], json!("memory"));
    }

    #[tokio::test]
    async fn health_is_503_when_the_store_is_down() {
        let state = AppState::new(Arc::new(Unreachable), Catalog::standard());
        let err = health(State(state)).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.to_json()["error"]["code"], json!("SERVICE_UNAVAILABLE"));
    }
}
