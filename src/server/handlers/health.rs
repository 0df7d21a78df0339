use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::state::AppState;

/// Liveness plus engine readiness. Always 200; a degraded engine shows up
/// as `query_engine_ready: false` and a null model.
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "query_engine_ready": state.engine.is_some(),
        "store_id": state.settings.store_id,
        "model": state.engine.as_ref().map(|engine| engine.model()),
    }))
}
