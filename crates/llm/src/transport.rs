use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::LlmError;

/// One logical "ask a model for text" request. The same request is
/// reused verbatim across retries and fallback models.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub system: String,
    pub user: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Ask the provider for object-shaped (JSON) output.
    pub json_mode: bool,
}

/// Token usage as reported by the provider. Absent fields count as 0.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
    #[serde(default)]
    pub total_tokens: u32,
}

/// Raw outcome of a single network attempt against a single model.
#[derive(Debug, Clone)]
pub struct ChatResponse {
    pub content: String,
    pub usage: TokenUsage,
}

/// One network attempt against one named model. Implementations make
/// exactly one request per call; all retry and fallback policy lives
/// in [`crate::ModelChain`].
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn complete(&self, model: &str, request: &ChatRequest) -> Result<ChatResponse, LlmError>;
}
