use thiserror::Error;

use narradar_core::error::CoreError;
use narradar_llm::LlmError;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("model call failed: {0}")]
    Llm(#[from] LlmError),

    /// The model answered but its output could not be normalized into
    /// narratives. Never silently coerced into an empty result here;
    /// degradation policy belongs to the caller.
    #[error("malformed clustering response: {0}")]
    MalformedResponse(String),

    #[error("snapshot storage error: {0}")]
    Storage(#[from] CoreError),
}
