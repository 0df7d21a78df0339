use std::sync::Arc;

use crate::core::config::Settings;
use crate::core::errors::ApiError;
use crate::engine::QueryEngine;

/// Global application state shared across all routes.
///
/// The engine is `None` when construction failed (missing or blank
/// credentials). The server keeps running in that state so the health
/// endpoint can report it; query endpoints answer with a 500 until the
/// configuration is fixed and the process restarted.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub engine: Option<Arc<QueryEngine>>,
}

impl AppState {
    /// Builds the state, degrading instead of failing when the query
    /// engine cannot be constructed.
    pub fn initialize(settings: Settings) -> Arc<Self> {
        let engine = match QueryEngine::new(&settings.api_key, &settings.store_id) {
            Ok(engine) => {
                tracing::info!(
                    "Query engine initialized (model: {}, store: {})",
                    engine.model(),
                    engine.store_id()
                );
                Some(Arc::new(engine))
            }
            Err(err) => {
                tracing::error!("Failed to initialize query engine: {err}");
                tracing::error!("API will return errors until this is fixed");
                None
            }
        };

        Arc::new(Self {
            settings: Arc::new(settings),
            engine,
        })
    }

    /// State with a caller-supplied engine, bypassing provider construction.
    pub fn with_engine(settings: Settings, engine: Option<QueryEngine>) -> Arc<Self> {
        Arc::new(Self {
            settings: Arc::new(settings),
            engine: engine.map(Arc::new),
        })
    }

    pub fn engine(&self) -> Result<&Arc<QueryEngine>, ApiError> {
        self.engine.as_ref().ok_or(ApiError::EngineNotReady)
    }
}
