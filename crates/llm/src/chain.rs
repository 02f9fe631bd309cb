//! Resilient model-fallback chain.
//!
//! One logical call walks an ordered list of candidate models.
//! Transient errors retry the same model with linear backoff up to a
//! cap; server errors advance to the next model immediately; fatal
//! errors abort the whole chain. Attempts are strictly sequential —
//! the chain is a decision tree, and racing model i+1 against model i
//! would defeat the fallback semantics and could double-bill.

use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn};

use narradar_core::config::LlmConfig;

use crate::error::{ErrorClass, LlmError};
use crate::openai::OpenAiTransport;
use crate::pricing::estimate_cost_usd;
use crate::transport::{ChatRequest, ChatTransport};

/// Normalized result of one successful logical call. `model_used`
/// records which model actually served it so callers can tell
/// fallback occurred.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelCallResult {
    pub content: String,
    pub model_used: String,
    pub tokens_prompt: u32,
    pub tokens_completion: u32,
    pub tokens_total: u32,
    pub cost_usd: f64,
}

pub struct ModelChain {
    transport: Box<dyn ChatTransport>,
    /// Primary model first, then fallbacks, in order.
    models: Vec<String>,
    /// Additional attempts after the first on the same model.
    max_retries: u32,
    /// Base backoff; the sleep before retry n is `backoff * n`.
    backoff: Duration,
    temperature: f32,
    max_tokens: u32,
}

impl ModelChain {
    pub fn new(transport: Box<dyn ChatTransport>, models: Vec<String>) -> Self {
        Self {
            transport,
            models,
            max_retries: 2,
            backoff: Duration::from_secs(1),
            temperature: 0.3,
            max_tokens: 4096,
        }
    }

    pub fn with_retry(mut self, max_retries: u32, backoff: Duration) -> Self {
        self.max_retries = max_retries;
        self.backoff = backoff;
        self
    }

    pub fn with_sampling(mut self, temperature: f32, max_tokens: u32) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }

    /// Build a chain over the OpenAI-compatible HTTP transport from
    /// config. Fails fast when no API key is present.
    pub fn from_config(cfg: &LlmConfig) -> Result<Self, LlmError> {
        let api_key = cfg
            .api_key
            .clone()
            .ok_or_else(|| LlmError::NotConfigured("NARRADAR_LLM_API_KEY not set".into()))?;
        let transport = OpenAiTransport::new(api_key, cfg.base_url.clone());
        Ok(Self::new(Box::new(transport), cfg.model_chain())
            .with_retry(cfg.max_retries, Duration::from_millis(cfg.backoff_ms))
            .with_sampling(cfg.temperature, cfg.max_tokens))
    }

    /// Issue one logical completion. A `model_override` replaces the
    /// primary model; the fallback tail still applies.
    pub async fn complete(
        &self,
        system: &str,
        user: &str,
        model_override: Option<&str>,
        json_mode: bool,
    ) -> Result<ModelCallResult, LlmError> {
        let chain = self.effective_chain(model_override);
        if chain.is_empty() {
            return Err(LlmError::NotConfigured("model chain is empty".into()));
        }

        let request = ChatRequest {
            system: system.to_string(),
            user: user.to_string(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            json_mode,
        };

        let mut last_err: Option<LlmError> = None;

        for (model_idx, model) in chain.iter().enumerate() {
            // Attempts on this model: 1 initial + up to max_retries.
            let mut attempt: u32 = 0;
            loop {
                attempt += 1;
                match self.transport.complete(model, &request).await {
                    Ok(resp) => {
                        if model_idx > 0 {
                            info!("model fallback: {} served after {} failed", model, chain[0]);
                        }
                        let cost_usd = estimate_cost_usd(
                            model,
                            resp.usage.prompt_tokens,
                            resp.usage.completion_tokens,
                        );
                        return Ok(ModelCallResult {
                            content: resp.content,
                            model_used: model.clone(),
                            tokens_prompt: resp.usage.prompt_tokens,
                            tokens_completion: resp.usage.completion_tokens,
                            tokens_total: resp.usage.total_tokens,
                            cost_usd,
                        });
                    }
                    Err(err) => match err.class() {
                        ErrorClass::Fatal => {
                            warn!("fatal error from {}, abandoning chain: {}", model, err);
                            return Err(err);
                        }
                        ErrorClass::Server => {
                            warn!("server error from {}, advancing chain: {}", model, err);
                            last_err = Some(err);
                            break;
                        }
                        ErrorClass::Transient => {
                            if attempt > self.max_retries {
                                warn!(
                                    "retries exhausted on {} after {} attempts: {}",
                                    model, attempt, err
                                );
                                last_err = Some(err);
                                break;
                            }
                            let delay = self.backoff * attempt;
                            warn!(
                                "transient error from {} (attempt {}), retrying in {:?}: {}",
                                model, attempt, delay, err
                            );
                            tokio::time::sleep(delay).await;
                        }
                    },
                }
            }
        }

        // Chain is non-empty, so at least one error was recorded.
        Err(last_err
            .unwrap_or_else(|| LlmError::NotConfigured("model chain produced no result".into())))
    }

    fn effective_chain(&self, model_override: Option<&str>) -> Vec<String> {
        match model_override {
            Some(primary) => {
                let mut chain = vec![primary.to_string()];
                chain.extend(self.models.iter().skip(1).cloned());
                chain
            }
            None => self.models.clone(),
        }
    }
}
