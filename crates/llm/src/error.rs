use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error: {status} — {body}")]
    Api { status: u16, body: String },
    #[error("failed to parse model output: {0}")]
    Parse(String),
    #[error("provider not configured: {0}")]
    NotConfigured(String),
}

/// Three-way classification driving the retry/fallback state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Retry the same model after a backoff (401/408/429, connection
    /// failures).
    Transient,
    /// Advance to the next model in the chain without retrying (5xx).
    Server,
    /// Abort the whole chain (any other 4xx, parse failures,
    /// misconfiguration) — no retry or fallback can fix these.
    Fatal,
}

impl LlmError {
    pub fn class(&self) -> ErrorClass {
        match self {
            // Connection-level failures look like network weather.
            LlmError::Http(_) => ErrorClass::Transient,
            LlmError::Api { status, .. } => match status {
                401 | 408 | 429 => ErrorClass::Transient,
                500..=599 => ErrorClass::Server,
                _ => ErrorClass::Fatal,
            },
            LlmError::Parse(_) | LlmError::NotConfigured(_) => ErrorClass::Fatal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(status: u16) -> LlmError {
        LlmError::Api {
            status,
            body: String::new(),
        }
    }

    #[test]
    fn status_classification() {
        assert_eq!(api(401).class(), ErrorClass::Transient);
        assert_eq!(api(408).class(), ErrorClass::Transient);
        assert_eq!(api(429).class(), ErrorClass::Transient);
        assert_eq!(api(500).class(), ErrorClass::Server);
        assert_eq!(api(502).class(), ErrorClass::Server);
        assert_eq!(api(503).class(), ErrorClass::Server);
        assert_eq!(api(400).class(), ErrorClass::Fatal);
        assert_eq!(api(403).class(), ErrorClass::Fatal);
        assert_eq!(api(404).class(), ErrorClass::Fatal);
        assert_eq!(api(422).class(), ErrorClass::Fatal);
    }

    #[test]
    fn parse_errors_are_fatal() {
        assert_eq!(LlmError::Parse("bad".into()).class(), ErrorClass::Fatal);
    }
}
