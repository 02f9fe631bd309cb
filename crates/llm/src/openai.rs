use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use crate::error::LlmError;
use crate::transport::{ChatRequest, ChatResponse, ChatTransport, TokenUsage};

/// OpenAI-compatible chat-completions transport. Works against any
/// provider speaking that contract (OpenAI, OpenRouter, vLLM, …);
/// the retry/fallback classification is keyed to its status codes.
pub struct OpenAiTransport {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl OpenAiTransport {
    pub fn new(api_key: String, base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url,
        }
    }
}

#[async_trait]
impl ChatTransport for OpenAiTransport {
    async fn complete(&self, model: &str, request: &ChatRequest) -> Result<ChatResponse, LlmError> {
        let url = format!("{}/v1/chat/completions", self.base_url);

        let mut body = json!({
            "model": model,
            "messages": [
                { "role": "system", "content": request.system },
                { "role": "user", "content": request.user },
            ],
            "temperature": request.temperature,
            "max_tokens": request.max_tokens,
        });
        if request.json_mode {
            body["response_format"] = json!({ "type": "json_object" });
        }

        debug!("chat completion request to {} (model {})", url, model);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status().as_u16();
        if status != 200 {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api { status, body });
        }

        let resp: serde_json::Value = response.json().await?;
        let content = resp["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| LlmError::Parse("missing choices[0].message.content".into()))?
            .to_string();
        let usage: TokenUsage =
            serde_json::from_value(resp["usage"].clone()).unwrap_or_default();

        Ok(ChatResponse { content, usage })
    }
}
