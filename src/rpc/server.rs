//! HTTP transport for the JSON-RPC endpoint.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::Recover;

/// Health check path
pub const HEALTH_PATH: &str = "/_health";

/// Build the service router
pub fn router(service: Recover) -> Router {
    Router::new()
        .route("/", post(rpc_handler))
        .route(HEALTH_PATH, get(health_check))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
        .with_state(Arc::new(service))
}

/// CORS policy: any origin, simple methods and headers
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::ORIGIN,
            HeaderName::from_static("x-requested-with"),
            header::CONTENT_TYPE,
            header::ACCEPT,
        ])
}

/// GET /_health
async fn health_check() -> impl IntoResponse {
    StatusCode::OK
}

/// POST / - JSON-RPC endpoint
async fn rpc_handler(State(service): State<Arc<Recover>>, body: Bytes) -> impl IntoResponse {
    Json(service.handle_body(&body).await)
}
