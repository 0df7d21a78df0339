use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use super::error::EngineError;
use super::provider::FileSearchProvider;
use super::types::GenerateResponse;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Client for the Gemini generateContent endpoint with the File Search tool
/// attached, so every call is answered from the configured knowledge store.
#[derive(Debug, Clone)]
pub struct GeminiFileSearch {
    api_key: String,
    store_id: String,
    model: String,
    base_url: String,
    client: Client,
}

impl GeminiFileSearch {
    pub fn new(api_key: &str, store_id: &str) -> Result<Self, EngineError> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(EngineError::MissingConfig("API key"));
        }
        let store_id = store_id.trim();
        if store_id.is_empty() {
            return Err(EngineError::MissingConfig("Store ID"));
        }

        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            api_key: api_key.to_string(),
            store_id: store_id.to_string(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            client,
        })
    }

    /// point the client at a different host
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    tools: Vec<Tool<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct Tool<'a> {
    #[serde(rename = "fileSearch")]
    file_search: FileSearchTool<'a>,
}

#[derive(Serialize)]
struct FileSearchTool<'a> {
    #[serde(rename = "fileSearchStoreNames")]
    file_search_store_names: Vec<&'a str>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f64,
    top_p: f64,
}

#[async_trait]
impl FileSearchProvider for GeminiFileSearch {
    fn model(&self) -> &str {
        &self.model
    }

    fn store_id(&self) -> &str {
        &self.store_id
    }

    async fn generate(
        &self,
        prompt: &str,
        temperature: f64,
        top_p: f64,
    ) -> Result<GenerateResponse, EngineError> {
        let url = format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model);

        let body = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
            tools: vec![Tool {
                file_search: FileSearchTool {
                    file_search_store_names: vec![&self.store_id],
                },
            }],
            generation_config: GenerationConfig { temperature, top_p },
        };

        let res = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let message = res.text().await.unwrap_or_default();
            return Err(EngineError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(res.json().await?)
    }
}
