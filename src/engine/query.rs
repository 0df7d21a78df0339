use std::collections::HashSet;
use std::sync::Arc;

use super::error::EngineError;
use super::gemini::GeminiFileSearch;
use super::provider::FileSearchProvider;
use super::types::{GroundingChunk, QueryMetadata, QueryResult, SourceCitation};

pub const DEFAULT_TEMPERATURE: f64 = 0.2;
pub const DEFAULT_TOP_P: f64 = 0.8;

const SYSTEM_INSTRUCTION: &str = "You are an expert assistant for Flusso Faucets, a premium plumbing fixtures company. Your role is to help users find information about Flusso products, including specifications, installation instructions, parts diagrams, and product details.

**Your Responsibilities:**
1. Provide accurate, detailed information about Flusso products
2. Help users find specific product specifications and features
3. Explain installation procedures and requirements
4. Identify parts and their functions from diagrams
5. Compare products when requested
6. Recommend products based on user requirements

**Guidelines:**
- Always cite specific product codes when referring to products
- Provide exact specifications from the knowledge base
- If information is not available, clearly state that
- For installation questions, reference official installation guides
- For parts questions, refer to parts diagrams when available
- Be professional, clear, and concise
- Format responses for easy readability
- When comparing products, create clear comparison tables

**Response Format:**
- Use markdown formatting for better readability
- Use bullet points for lists
- Use tables for comparisons
- Bold important product codes and specifications
- Include relevant measurements with units

**Important:**
- Only provide information from the knowledge base
- Don't make assumptions about products not in the database
- If unsure, ask for clarification rather than guessing";

/// Orchestrates knowledge-base queries: prompt templating, the provider
/// call, and normalization of the response into [`QueryResult`].
pub struct QueryEngine {
    provider: Arc<dyn FileSearchProvider>,
}

impl QueryEngine {
    /// Build the engine backed by the Gemini File Search provider. Fails
    /// when either credential is blank; the caller decides whether that is
    /// fatal.
    pub fn new(api_key: &str, store_id: &str) -> Result<Self, EngineError> {
        let provider = GeminiFileSearch::new(api_key, store_id)?;
        Ok(Self::with_provider(Arc::new(provider)))
    }

    pub fn with_provider(provider: Arc<dyn FileSearchProvider>) -> Self {
        Self { provider }
    }

    pub fn model(&self) -> &str {
        self.provider.model()
    }

    pub fn store_id(&self) -> &str {
        self.provider.store_id()
    }

    /// Answer a free-form question against the knowledge store.
    ///
    /// Provider failures never escape as `Err`; they come back as a
    /// `success: false` result carrying the error message. `Err` is
    /// reserved for invalid input and happens before any network call.
    pub async fn ask(
        &self,
        query: &str,
        temperature: Option<f64>,
        top_p: Option<f64>,
    ) -> Result<QueryResult, EngineError> {
        if query.trim().is_empty() {
            return Err(EngineError::EmptyQuery);
        }

        tracing::info!("Processing query: {}", log_preview(query));

        let temperature = temperature.unwrap_or(DEFAULT_TEMPERATURE);
        let top_p = top_p.unwrap_or(DEFAULT_TOP_P);
        let prompt = format!("{SYSTEM_INSTRUCTION}\n\nUser Query: {query}");

        match self.provider.generate(&prompt, temperature, top_p).await {
            Ok(response) => {
                let candidate = response.candidates.into_iter().next();

                let answer = candidate
                    .as_ref()
                    .and_then(|c| c.content.as_ref())
                    .map(|content| {
                        content
                            .parts
                            .iter()
                            .filter_map(|part| part.text.as_deref())
                            .collect::<String>()
                    })
                    .filter(|text| !text.is_empty())
                    .unwrap_or_else(|| "No response generated".to_string());

                let grounding = candidate.and_then(|c| c.grounding_metadata);
                let has_grounding = grounding.is_some();
                let sources = grounding
                    .and_then(|g| g.grounding_chunks)
                    .map(|chunks| dedup_sources(&chunks))
                    .unwrap_or_default();

                tracing::info!("Query processed, {} sources found", sources.len());

                Ok(QueryResult::success(
                    query,
                    answer,
                    sources,
                    QueryMetadata {
                        model: self.provider.model().to_string(),
                        temperature,
                        top_p,
                        has_grounding,
                    },
                ))
            }
            Err(err) => {
                tracing::error!("Error processing query: {err}");
                Ok(QueryResult::failure(query, err.to_string()))
            }
        }
    }

    pub async fn product_info(&self, product_code: &str) -> Result<QueryResult, EngineError> {
        let query = format!("Provide comprehensive information about product {product_code}, including specifications, features, available finishes, and any installation requirements.");
        self.ask(&query, None, None).await
    }

    pub async fn compare_products(
        &self,
        product_codes: &[String],
    ) -> Result<QueryResult, EngineError> {
        if product_codes.len() < 2 {
            return Err(EngineError::NotEnoughProducts);
        }
        let codes = product_codes.join(", ");
        let query = format!("Create a detailed comparison of these products: {codes}. Include specifications, features, finishes, dimensions, and key differences. Present the information in a table format.");
        self.ask(&query, None, None).await
    }

    pub async fn search_by_features(
        &self,
        category: &str,
        features: &[String],
    ) -> Result<QueryResult, EngineError> {
        let features = features.join(", ");
        let query = format!("Find all {category} products that have these features: {features}. List the products with their codes and brief descriptions.");
        self.ask(&query, None, None).await
    }

    pub async fn installation_guide(&self, product_code: &str) -> Result<QueryResult, EngineError> {
        let query = format!("Provide detailed installation instructions for product {product_code}, including required tools, steps, and any important warnings.");
        self.ask(&query, None, None).await
    }

    pub async fn parts_info(&self, product_code: &str) -> Result<QueryResult, EngineError> {
        let query = format!("Show the parts list and assembly diagram information for product {product_code}. List all parts with their numbers and descriptions.");
        self.ask(&query, None, None).await
    }
}

/// Collapse grounding chunks into citations: chunks without a title are
/// skipped, and only the first chunk per title is kept, in encounter order.
fn dedup_sources(chunks: &[GroundingChunk]) -> Vec<SourceCitation> {
    let mut seen = HashSet::new();
    let mut sources = Vec::new();
    for chunk in chunks {
        let Some(context) = &chunk.retrieved_context else {
            continue;
        };
        let Some(title) = context.title.as_deref().filter(|t| !t.is_empty()) else {
            continue;
        };
        if seen.insert(title.to_string()) {
            sources.push(SourceCitation {
                title: title.to_string(),
                uri: context.uri.clone(),
            });
        }
    }
    sources
}

/// First 100 characters of a query, for log lines.
pub fn log_preview(text: &str) -> String {
    const MAX_CHARS: usize = 100;
    let mut preview: String = text.chars().take(MAX_CHARS).collect();
    if preview.len() < text.len() {
        preview.push_str("...");
    }
    preview
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::{json, Value};

    use super::*;
    use crate::engine::types::GenerateResponse;

    #[derive(Debug, Clone)]
    struct RecordedCall {
        prompt: String,
        temperature: f64,
        top_p: f64,
    }

    enum StubOutcome {
        Respond(Value),
        Fail(u16, &'static str),
    }

    struct StubProvider {
        outcome: StubOutcome,
        calls: AtomicUsize,
        recorded: Mutex<Vec<RecordedCall>>,
    }

    impl StubProvider {
        fn respond(body: Value) -> Arc<Self> {
            Arc::new(Self {
                outcome: StubOutcome::Respond(body),
                calls: AtomicUsize::new(0),
                recorded: Mutex::new(Vec::new()),
            })
        }

        fn fail(status: u16, message: &'static str) -> Arc<Self> {
            Arc::new(Self {
                outcome: StubOutcome::Fail(status, message),
                calls: AtomicUsize::new(0),
                recorded: Mutex::new(Vec::new()),
            })
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn last_call(&self) -> RecordedCall {
            self.recorded.lock().unwrap().last().cloned().unwrap()
        }
    }

    #[async_trait]
    impl FileSearchProvider for StubProvider {
        fn model(&self) -> &str {
            "stub-model"
        }

        fn store_id(&self) -> &str {
            "fileSearchStores/test"
        }

        async fn generate(
            &self,
            prompt: &str,
            temperature: f64,
            top_p: f64,
        ) -> Result<GenerateResponse, EngineError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.recorded.lock().unwrap().push(RecordedCall {
                prompt: prompt.to_string(),
                temperature,
                top_p,
            });
            match &self.outcome {
                StubOutcome::Respond(body) => Ok(serde_json::from_value(body.clone()).unwrap()),
                StubOutcome::Fail(status, message) => Err(EngineError::Api {
                    status: *status,
                    message: (*message).to_string(),
                }),
            }
        }
    }

    fn grounded(answer: &str, chunks: &[(&str, Option<&str>)]) -> Value {
        let chunks: Vec<Value> = chunks
            .iter()
            .map(|(title, uri)| json!({"retrievedContext": {"title": title, "uri": uri}}))
            .collect();
        json!({
            "candidates": [{
                "content": {"parts": [{"text": answer}]},
                "groundingMetadata": {"groundingChunks": chunks}
            }]
        })
    }

    #[tokio::test]
    async fn uses_default_sampling_parameters() {
        let provider = StubProvider::respond(grounded("hi", &[]));
        let engine = QueryEngine::with_provider(provider.clone());

        let result = engine.ask("What taps exist?", None, None).await.unwrap();

        let call = provider.last_call();
        assert_eq!(call.temperature, DEFAULT_TEMPERATURE);
        assert_eq!(call.top_p, DEFAULT_TOP_P);

        let metadata = result.metadata.unwrap();
        assert_eq!(metadata.temperature, 0.2);
        assert_eq!(metadata.top_p, 0.8);
        assert_eq!(metadata.model, "stub-model");
        assert!(metadata.has_grounding);
    }

    #[tokio::test]
    async fn explicit_sampling_parameters_are_passed_through() {
        let provider = StubProvider::respond(grounded("hi", &[]));
        let engine = QueryEngine::with_provider(provider.clone());

        let result = engine
            .ask("What taps exist?", Some(0.7), Some(0.4))
            .await
            .unwrap();

        let call = provider.last_call();
        assert_eq!(call.temperature, 0.7);
        assert_eq!(call.top_p, 0.4);
        let metadata = result.metadata.unwrap();
        assert_eq!(metadata.temperature, 0.7);
        assert_eq!(metadata.top_p, 0.4);
    }

    #[tokio::test]
    async fn empty_query_is_rejected_before_any_call() {
        let provider = StubProvider::respond(grounded("unused", &[]));
        let engine = QueryEngine::with_provider(provider.clone());

        let err = engine.ask("   ", None, None).await.unwrap_err();

        assert!(matches!(err, EngineError::EmptyQuery));
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn prompt_carries_system_instruction_and_query() {
        let provider = StubProvider::respond(grounded("hi", &[]));
        let engine = QueryEngine::with_provider(provider.clone());

        engine.ask("What taps exist?", None, None).await.unwrap();

        let call = provider.last_call();
        assert!(call
            .prompt
            .starts_with("You are an expert assistant for Flusso Faucets"));
        assert!(call.prompt.ends_with("User Query: What taps exist?"));
    }

    #[tokio::test]
    async fn sources_are_deduplicated_by_title_keeping_first() {
        let provider = StubProvider::respond(grounded(
            "answer",
            &[
                ("Guide A", Some("files/a1")),
                ("Guide A", Some("files/a2")),
                ("Guide B", None),
            ],
        ));
        let engine = QueryEngine::with_provider(provider);

        let result = engine.ask("q", None, None).await.unwrap();

        assert_eq!(
            result.sources,
            vec![
                SourceCitation {
                    title: "Guide A".to_string(),
                    uri: Some("files/a1".to_string()),
                },
                SourceCitation {
                    title: "Guide B".to_string(),
                    uri: None,
                },
            ]
        );
        assert_eq!(result.source_count, 2);
    }

    #[tokio::test]
    async fn untitled_chunks_are_skipped() {
        let provider = StubProvider::respond(json!({
            "candidates": [{
                "content": {"parts": [{"text": "answer"}]},
                "groundingMetadata": {"groundingChunks": [
                    {"retrievedContext": {}},
                    {"retrievedContext": {"title": "", "uri": "files/x"}},
                    {},
                    {"retrievedContext": {"title": "Spec Sheet"}}
                ]}
            }]
        }));
        let engine = QueryEngine::with_provider(provider);

        let result = engine.ask("q", None, None).await.unwrap();

        assert_eq!(result.sources.len(), 1);
        assert_eq!(result.sources[0].title, "Spec Sheet");
    }

    #[tokio::test]
    async fn missing_answer_text_falls_back() {
        let provider = StubProvider::respond(json!({
            "candidates": [{
                "content": {"parts": []},
                "groundingMetadata": {}
            }]
        }));
        let engine = QueryEngine::with_provider(provider);

        let result = engine.ask("q", None, None).await.unwrap();

        assert!(result.success);
        assert_eq!(result.answer.as_deref(), Some("No response generated"));
        assert!(result.metadata.unwrap().has_grounding);
        assert!(result.sources.is_empty());
    }

    #[tokio::test]
    async fn empty_candidate_list_means_no_grounding() {
        let provider = StubProvider::respond(json!({"candidates": []}));
        let engine = QueryEngine::with_provider(provider);

        let result = engine.ask("q", None, None).await.unwrap();

        assert!(result.success);
        assert_eq!(result.answer.as_deref(), Some("No response generated"));
        assert!(!result.metadata.unwrap().has_grounding);
        assert_eq!(result.source_count, 0);
    }

    #[tokio::test]
    async fn provider_failure_becomes_failure_result() {
        let provider = StubProvider::fail(500, "backend exploded");
        let engine = QueryEngine::with_provider(provider);

        let result = engine.ask("hello", None, None).await.unwrap();

        assert!(!result.success);
        assert_eq!(result.query, "hello");
        assert_eq!(result.answer, None);
        assert_eq!(result.error.as_deref(), Some("API error 500: backend exploded"));
        assert!(result.sources.is_empty());
        assert_eq!(result.source_count, 0);
        assert!(result.metadata.is_none());
    }

    #[tokio::test]
    async fn envelope_keys_match_outcome() {
        let provider = StubProvider::respond(grounded("fine", &[("Guide A", None)]));
        let engine = QueryEngine::with_provider(provider);
        let success = engine.ask("q", None, None).await.unwrap();

        let value = serde_json::to_value(&success).unwrap();
        assert_eq!(value["success"], json!(true));
        assert!(value.get("error").is_none());
        assert!(value.get("metadata").is_some());

        let provider = StubProvider::fail(503, "down");
        let engine = QueryEngine::with_provider(provider);
        let failure = engine.ask("q", None, None).await.unwrap();

        let value = serde_json::to_value(&failure).unwrap();
        assert_eq!(value["success"], json!(false));
        assert_eq!(value["answer"], Value::Null);
        assert!(value.get("error").is_some());
        assert!(value.get("metadata").is_none());
    }

    #[tokio::test]
    async fn compare_requires_at_least_two_products() {
        let provider = StubProvider::respond(grounded("unused", &[]));
        let engine = QueryEngine::with_provider(provider.clone());

        let err = engine
            .compare_products(&["100.1000".to_string()])
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::NotEnoughProducts));
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn helper_prompts_match_catalog_wording() {
        let provider = StubProvider::respond(grounded("ok", &[]));
        let engine = QueryEngine::with_provider(provider.clone());

        let result = engine.product_info("100.1000").await.unwrap();
        assert_eq!(
            result.query,
            "Provide comprehensive information about product 100.1000, including specifications, features, available finishes, and any installation requirements."
        );

        engine
            .compare_products(&["100.1000".to_string(), "TVH.2691".to_string()])
            .await
            .unwrap();
        assert!(provider
            .last_call()
            .prompt
            .contains("Create a detailed comparison of these products: 100.1000, TVH.2691."));

        engine
            .search_by_features(
                "kitchen faucet",
                &["pull-down spray".to_string(), "matte black".to_string()],
            )
            .await
            .unwrap();
        let call = provider.last_call();
        assert!(call.prompt.contains("Find all kitchen faucet products"));
        assert!(call.prompt.contains("pull-down spray, matte black"));

        engine.installation_guide("100.1000").await.unwrap();
        assert!(provider
            .last_call()
            .prompt
            .contains("Provide detailed installation instructions for product 100.1000"));

        engine.parts_info("100.1000").await.unwrap();
        assert!(provider
            .last_call()
            .prompt
            .contains("Show the parts list and assembly diagram information for product 100.1000"));
    }

    #[test]
    fn log_preview_truncates_long_text() {
        let short = "short query";
        assert_eq!(log_preview(short), "short query");

        let long = "x".repeat(150);
        let preview = log_preview(&long);
        assert_eq!(preview.chars().count(), 103);
        assert!(preview.ends_with("..."));
    }
}
