pub mod error;
pub mod gemini;
pub mod provider;
pub mod query;
pub mod types;

pub use error::EngineError;
pub use gemini::GeminiFileSearch;
pub use provider::FileSearchProvider;
pub use query::QueryEngine;
