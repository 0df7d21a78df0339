use thiserror::Error;

use crate::core::errors::ApiError;

/// Failures inside the query engine and its provider client.
///
/// The first three variants are caller faults and keep the exact messages
/// the HTTP layer returns to clients. `Http` and `Api` are provider faults;
/// `QueryEngine::ask` converts those into `success: false` results instead
/// of letting them escape as errors.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{0} is required")]
    MissingConfig(&'static str),
    #[error("Query cannot be empty")]
    EmptyQuery,
    #[error("At least 2 products required for comparison")]
    NotEnoughProducts,
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match &err {
            EngineError::MissingConfig(_)
            | EngineError::EmptyQuery
            | EngineError::NotEnoughProducts => ApiError::BadRequest(err.to_string()),
            EngineError::Http(_) | EngineError::Api { .. } => ApiError::internal(err),
        }
    }
}
