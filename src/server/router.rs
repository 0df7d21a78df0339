use std::sync::Arc;

use axum::http::{header, Method, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::core::errors::ApiError;
use crate::server::handlers::{frontend, health, query};
use crate::state::AppState;

/// Creates the application router with all routes and middleware.
///
/// This function sets up:
/// - CORS middleware (any origin; the frontend may be served from anywhere)
/// - Health check endpoint
/// - Knowledge-base query endpoints
/// - Static frontend serving
/// - JSON fallbacks for unknown routes and panicking handlers
///
/// # Arguments
///
/// * `state` - Shared application state
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(health::health))
        .route("/api/query", post(query::ask))
        .route("/api/product/:code", get(query::product_info))
        .route("/api/compare", post(query::compare_products))
        .route("/api/search", post(query::search_by_features))
        .route("/api/installation/:code", get(query::installation_guide))
        .route("/api/parts/:code", get(query::parts_info))
        .route("/", get(frontend::index))
        .route("/:filename", get(frontend::asset))
        .fallback(not_found)
        .with_state(state)
        .layer(build_cors_layer())
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(handle_panic))
}

async fn not_found() -> ApiError {
    ApiError::NotFound("Endpoint not found".to_string())
}

fn build_cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::ACCEPT, header::CONTENT_TYPE])
}

/// Clients always get a JSON body, even out of a panicking handler. The
/// payload itself only goes to the logs.
fn handle_panic(err: Box<dyn std::any::Any + Send + 'static>) -> axum::response::Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!("Handler panicked: {detail}");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "success": false, "error": "Internal server error" })),
    )
        .into_response()
}
