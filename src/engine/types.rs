use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceCitation {
    pub title: String,
    pub uri: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryMetadata {
    pub model: String,
    pub temperature: f64,
    pub top_p: f64,
    pub has_grounding: bool,
}

/// Envelope returned by every query operation. Construct through
/// [`QueryResult::success`] or [`QueryResult::failure`] so the field pairing
/// stays consistent: a failure has a null answer and no metadata, a success
/// has no error key.
#[derive(Debug, Clone, Serialize)]
pub struct QueryResult {
    pub success: bool,
    pub query: String,
    pub answer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub sources: Vec<SourceCitation>,
    pub source_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<QueryMetadata>,
}

impl QueryResult {
    pub fn success(
        query: &str,
        answer: String,
        sources: Vec<SourceCitation>,
        metadata: QueryMetadata,
    ) -> Self {
        let source_count = sources.len();
        Self {
            success: true,
            query: query.to_string(),
            answer: Some(answer),
            error: None,
            sources,
            source_count,
            metadata: Some(metadata),
        }
    }

    pub fn failure(query: &str, error: String) -> Self {
        Self {
            success: false,
            query: query.to_string(),
            answer: None,
            error: Some(error),
            sources: Vec::new(),
            source_count: 0,
            metadata: None,
        }
    }
}

// Wire shape of the generateContent response, reduced to the fields this
// service reads. Everything the API may omit is an Option.

#[derive(Debug, Clone, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Candidate {
    pub content: Option<Content>,
    #[serde(rename = "groundingMetadata")]
    pub grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Part {
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GroundingMetadata {
    #[serde(rename = "groundingChunks")]
    pub grounding_chunks: Option<Vec<GroundingChunk>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GroundingChunk {
    #[serde(rename = "retrievedContext")]
    pub retrieved_context: Option<RetrievedContext>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RetrievedContext {
    pub title: Option<String>,
    pub uri: Option<String>,
}
