use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::Value;

use crate::core::errors::ApiError;
use crate::engine::query::log_preview;
use crate::state::AppState;

/// POST /api/query. Free-form question with optional sampling overrides.
pub async fn ask(
    State(state): State<Arc<AppState>>,
    body: Option<Json<Value>>,
) -> Result<impl IntoResponse, ApiError> {
    let engine = state.engine()?;
    let data = require_json(body)?;

    let query = match data.get("query").and_then(Value::as_str).map(str::trim) {
        Some(text) if !text.is_empty() => text.to_string(),
        _ => return Err(ApiError::BadRequest("Query cannot be empty".to_string())),
    };
    let temperature = sampling_param(
        &data,
        "temperature",
        "Temperature must be a number between 0.0 and 1.0",
    )?;
    let top_p = sampling_param(&data, "top_p", "Top_p must be a number between 0.0 and 1.0")?;

    tracing::info!("API Query received: {}", log_preview(&query));

    let result = engine.ask(&query, temperature, top_p).await?;
    Ok(Json(result))
}

/// GET /api/product/:code
pub async fn product_info(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let engine = state.engine()?;
    tracing::info!("API Product info request: {code}");
    let result = engine.product_info(&code).await?;
    Ok(Json(result))
}

/// POST /api/compare with `{"products": [code, ...]}`
pub async fn compare_products(
    State(state): State<Arc<AppState>>,
    body: Option<Json<Value>>,
) -> Result<impl IntoResponse, ApiError> {
    let engine = state.engine()?;
    let data = require_json(body)?;

    let products = string_list(
        &data,
        "products",
        "Products must be a list",
        "Products must be a list of strings",
    )?;
    if products.len() < 2 {
        return Err(ApiError::BadRequest(
            "At least 2 products required for comparison".to_string(),
        ));
    }

    tracing::info!("API Compare request: {}", products.join(", "));

    let result = engine.compare_products(&products).await?;
    Ok(Json(result))
}

/// POST /api/search with `{"category": ..., "features": [...]}`
pub async fn search_by_features(
    State(state): State<Arc<AppState>>,
    body: Option<Json<Value>>,
) -> Result<impl IntoResponse, ApiError> {
    let engine = state.engine()?;
    let data = require_json(body)?;

    let category = match data.get("category").and_then(Value::as_str).map(str::trim) {
        Some(text) if !text.is_empty() => text.to_string(),
        _ => return Err(ApiError::BadRequest("Category is required".to_string())),
    };
    let features = string_list(
        &data,
        "features",
        "Features must be a non-empty list",
        "Features must be a list of strings",
    )?;
    if features.is_empty() {
        return Err(ApiError::BadRequest(
            "Features must be a non-empty list".to_string(),
        ));
    }

    tracing::info!("API Search request: {category} - {}", features.join(", "));

    let result = engine.search_by_features(&category, &features).await?;
    Ok(Json(result))
}

/// GET /api/installation/:code
pub async fn installation_guide(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let engine = state.engine()?;
    tracing::info!("API Installation guide request: {code}");
    let result = engine.installation_guide(&code).await?;
    Ok(Json(result))
}

/// GET /api/parts/:code
pub async fn parts_info(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let engine = state.engine()?;
    tracing::info!("API Parts info request: {code}");
    let result = engine.parts_info(&code).await?;
    Ok(Json(result))
}

/// A body is required and must be a non-empty JSON object. Undecodable
/// bodies land here as `None` and get the same message as an empty one.
fn require_json(body: Option<Json<Value>>) -> Result<Value, ApiError> {
    match body {
        Some(Json(value)) if value.as_object().is_some_and(|map| !map.is_empty()) => Ok(value),
        _ => Err(ApiError::BadRequest("No JSON data provided".to_string())),
    }
}

/// Optional sampling parameter: absent and null pass through as None;
/// numbers and numeric strings must land in [0.0, 1.0].
fn sampling_param(data: &Value, key: &str, message: &str) -> Result<Option<f64>, ApiError> {
    let value = match data.get(key) {
        None | Some(Value::Null) => return Ok(None),
        Some(value) => value,
    };
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match number {
        Some(n) if (0.0..=1.0).contains(&n) => Ok(Some(n)),
        _ => Err(ApiError::BadRequest(message.to_string())),
    }
}

/// List-of-strings field. A missing key is an empty list; the caller
/// decides whether that is acceptable.
fn string_list(
    data: &Value,
    key: &str,
    not_list_message: &str,
    not_strings_message: &str,
) -> Result<Vec<String>, ApiError> {
    let Some(value) = data.get(key) else {
        return Ok(Vec::new());
    };
    let Some(items) = value.as_array() else {
        return Err(ApiError::BadRequest(not_list_message.to_string()));
    };
    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| ApiError::BadRequest(not_strings_message.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bad_request_message(err: ApiError) -> String {
        match err {
            ApiError::BadRequest(msg) => msg,
            other => panic!("expected BadRequest, got {other:?}"),
        }
    }

    #[test]
    fn sampling_param_accepts_numbers_and_numeric_strings() {
        let data = json!({"temperature": 0.5});
        assert_eq!(sampling_param(&data, "temperature", "bad").unwrap(), Some(0.5));

        let data = json!({"temperature": "0.75"});
        assert_eq!(
            sampling_param(&data, "temperature", "bad").unwrap(),
            Some(0.75)
        );

        let data = json!({});
        assert_eq!(sampling_param(&data, "temperature", "bad").unwrap(), None);

        let data = json!({"temperature": null});
        assert_eq!(sampling_param(&data, "temperature", "bad").unwrap(), None);
    }

    #[test]
    fn sampling_param_rejects_out_of_range_and_junk() {
        for value in [json!(1.5), json!(-0.1), json!("abc"), json!(true), json!([0.2])] {
            let data = json!({ "top_p": value });
            let err = sampling_param(
                &data,
                "top_p",
                "Top_p must be a number between 0.0 and 1.0",
            )
            .unwrap_err();
            assert_eq!(
                bad_request_message(err),
                "Top_p must be a number between 0.0 and 1.0"
            );
        }
    }

    #[test]
    fn string_list_defaults_missing_key_to_empty() {
        let data = json!({});
        assert!(string_list(&data, "products", "not list", "not strings")
            .unwrap()
            .is_empty());
    }

    #[test]
    fn string_list_rejects_non_lists_and_non_string_items() {
        let data = json!({"products": "A,B"});
        let err = string_list(&data, "products", "Products must be a list", "x").unwrap_err();
        assert_eq!(bad_request_message(err), "Products must be a list");

        let data = json!({"products": null});
        let err = string_list(&data, "products", "Products must be a list", "x").unwrap_err();
        assert_eq!(bad_request_message(err), "Products must be a list");

        let data = json!({"products": ["A", 5]});
        let err = string_list(
            &data,
            "products",
            "Products must be a list",
            "Products must be a list of strings",
        )
        .unwrap_err();
        assert_eq!(bad_request_message(err), "Products must be a list of strings");
    }

    #[test]
    fn require_json_rejects_missing_empty_and_non_object_bodies() {
        let err = require_json(None).unwrap_err();
        assert_eq!(bad_request_message(err), "No JSON data provided");

        let err = require_json(Some(Json(json!("hello")))).unwrap_err();
        assert_eq!(bad_request_message(err), "No JSON data provided");

        let err = require_json(Some(Json(json!({})))).unwrap_err();
        assert_eq!(bad_request_message(err), "No JSON data provided");

        let data = require_json(Some(Json(json!({"query": "q"})))).unwrap();
        assert_eq!(data["query"], "q");
    }
}
