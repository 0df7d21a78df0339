use async_trait::async_trait;

use super::error::EngineError;
use super::types::GenerateResponse;

#[async_trait]
pub trait FileSearchProvider: Send + Sync {
    /// model identifier reported in result metadata (e.g. "gemini-2.5-flash")
    fn model(&self) -> &str;

    /// knowledge store this provider searches
    fn store_id(&self) -> &str;

    /// run one retrieval-augmented generation call with the given sampling
    /// parameters; the prompt already contains the system instruction
    async fn generate(
        &self,
        prompt: &str,
        temperature: f64,
        top_p: f64,
    ) -> Result<GenerateResponse, EngineError>;
}
