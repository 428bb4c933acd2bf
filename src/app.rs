use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    middleware,
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::database::RecordStore;
use crate::handlers::{protected, public};
use crate::middleware::jwt_auth_middleware;
use crate::resources::Catalog;
use crate::services::ResourceService;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub service: ResourceService,
}

impl AppState {
    pub fn new(store: Arc<dyn RecordStore>, catalog: Catalog) -> Self {
        Self {
            service: ResourceService::new(store, Arc::new(catalog)),
        }
    }
}

/// Full router: public endpoints, the authenticated `/v1` API and global layers
pub fn app(state: AppState, config: &AppConfig) -> Router {
    let router = Router::new()
        .route("/", get(public::root))
        .route("/health", get(public::health))
        .merge(api_routes())
        .with_state(state)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(config.api.max_request_size_bytes))
        .layer(cors_layer(config));

    if config.api.enable_request_logging {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

fn api_routes() -> Router<AppState> {
    use protected::data::{association, collection, record};

    Router::new()
        .route("/v1/auth/whoami", get(protected::auth::whoami))
        .route("/v1/:resource", get(collection::list).post(collection::create))
        .route(
            "/v1/:resource/search",
            post(collection::search)
                .get(record::search_as_id)
                .patch(record::search_as_id)
                .delete(record::search_as_id),
        )
        .route(
            "/v1/:resource/:id",
            get(record::get).patch(record::patch).delete(record::delete),
        )
        .route(
            "/v1/:resource/:id/:association",
            get(association::list).post(association::link),
        )
        .route(
            "/v1/:resource/:id/:association/:target_id",
            delete(association::unlink),
        )
        // route_layer keeps unmatched paths at 404 instead of 401
        .route_layer(middleware::from_fn(jwt_auth_middleware))
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let security = &config.security;
    if !security.enable_cors {
        return CorsLayer::new();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter(|o| o.as_str() != "*")
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {:?}", o);
                None
            }
        })
        .collect();

    let allow_origin = if origins.is_empty() || security.cors_origins.iter().any(|o| o == "*") {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any)
}
