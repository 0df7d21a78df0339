use std::fs;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::IntoResponse;

use crate::core::errors::ApiError;
use crate::state::AppState;

pub async fn index(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    serve_asset(&state, "index.html")
}

pub async fn asset(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    // Base names only; path separators, "..", and absolute paths are refused.
    let safe_name = sanitize_filename(&filename)
        .ok_or_else(|| ApiError::BadRequest("Invalid filename".to_string()))?;
    serve_asset(&state, safe_name)
}

fn serve_asset(state: &AppState, name: &str) -> Result<impl IntoResponse, ApiError> {
    let path = state.settings.frontend_dir.join(name);
    if !path.exists() {
        return Err(ApiError::NotFound("Endpoint not found".to_string()));
    }

    let bytes = fs::read(&path).map_err(ApiError::internal)?;
    Ok(([(header::CONTENT_TYPE, content_type_for(name))], bytes))
}

fn sanitize_filename(filename: &str) -> Option<&str> {
    let base = std::path::Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())?;
    // Backslash is checked by hand so Windows-style prefixes are refused on
    // every platform.
    if base == filename && !filename.contains("..") && !filename.contains('\\') {
        Some(base)
    } else {
        None
    }
}

fn content_type_for(filename: &str) -> &'static str {
    let ext = std::path::Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();
    match ext.to_ascii_lowercase().as_str() {
        "html" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" | "mjs" => "text/javascript; charset=utf-8",
        "json" => "application/json",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "webp" => "image/webp",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "txt" => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}
