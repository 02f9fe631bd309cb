use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

fn env_f64(key: &str, default: f64) -> f64 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_u32(key: &str, default: u32) -> u32 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub llm: LlmConfig,
    pub anomaly: AnomalyConfig,
    pub matcher: MatcherConfig,
    pub storage: StorageConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    pub fn from_env() -> Self {
        Self {
            llm: LlmConfig::from_env(),
            anomaly: AnomalyConfig::from_env(),
            matcher: MatcherConfig::from_env(),
            storage: StorageConfig::from_env(),
        }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded:");
        tracing::info!(
            "  llm:      model={}, fallbacks={}",
            self.llm.model,
            self.llm.fallback_models.join(",")
        );
        tracing::info!("  anomaly:  threshold={}", self.anomaly.z_threshold);
        tracing::info!(
            "  matcher:  fuzzy_threshold={}, stop_words={}",
            self.matcher.fuzzy_threshold,
            self.matcher.stop_words.len()
        );
        tracing::info!("  storage:  snapshot_dir={}", self.storage.snapshot_dir.display());
    }
}

// ── LLM ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    /// Primary model, tried first on every call.
    pub model: String,
    /// Ordered fallback chain, tried after the primary is exhausted.
    pub fallback_models: Vec<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Additional attempts after the first on transient errors.
    pub max_retries: u32,
    /// Base backoff in milliseconds; scales linearly with attempt number.
    pub backoff_ms: u64,
}

impl LlmConfig {
    fn from_env() -> Self {
        let fallback_models = env_or(
            "NARRADAR_FALLBACK_MODELS",
            "openai/gpt-4o-mini,anthropic/claude-3-5-haiku",
        )
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
        Self {
            api_key: env_opt("NARRADAR_LLM_API_KEY").or_else(|| env_opt("OPENROUTER_API_KEY")),
            base_url: env_or("NARRADAR_LLM_BASE_URL", "https://openrouter.ai/api"),
            model: env_or("NARRADAR_LLM_MODEL", "anthropic/claude-sonnet-4"),
            fallback_models,
            temperature: env_f64("NARRADAR_LLM_TEMPERATURE", 0.3) as f32,
            max_tokens: env_u32("NARRADAR_LLM_MAX_TOKENS", 4096),
            max_retries: env_u32("NARRADAR_LLM_MAX_RETRIES", 2),
            backoff_ms: env_u32("NARRADAR_LLM_BACKOFF_MS", 1000) as u64,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// The full model chain: primary first, then fallbacks.
    pub fn model_chain(&self) -> Vec<String> {
        let mut chain = vec![self.model.clone()];
        chain.extend(self.fallback_models.iter().cloned());
        chain
    }
}

// ── Anomaly detection ─────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnomalyConfig {
    /// |z| at or above this flags an entity as anomalous.
    pub z_threshold: f64,
}

impl AnomalyConfig {
    fn from_env() -> Self {
        Self {
            z_threshold: env_f64("NARRADAR_Z_THRESHOLD", 2.0),
        }
    }
}

// ── Narrative matching ────────────────────────────────────────

/// Words stripped before fuzzy name comparison. Includes the ecosystem
/// name because nearly every narrative is prefixed with it.
const DEFAULT_STOP_WORDS: &[&str] = &[
    "the", "a", "an", "and", "of", "in", "on", "for", "to", "with", "ecosystem", "narrative",
    "solana",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatcherConfig {
    pub stop_words: Vec<String>,
    /// Minimum Jaccard similarity for a fuzzy name match.
    pub fuzzy_threshold: f64,
}

impl MatcherConfig {
    fn from_env() -> Self {
        let stop_words = match env_opt("NARRADAR_STOP_WORDS") {
            Some(raw) => raw
                .split(',')
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect(),
            None => DEFAULT_STOP_WORDS.iter().map(|s| s.to_string()).collect(),
        };
        Self {
            stop_words,
            fuzzy_threshold: env_f64("NARRADAR_FUZZY_THRESHOLD", 0.4),
        }
    }
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            stop_words: DEFAULT_STOP_WORDS.iter().map(|s| s.to_string()).collect(),
            fuzzy_threshold: 0.4,
        }
    }
}

// ── Storage ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory of daily snapshot documents, one JSON file per date.
    pub snapshot_dir: PathBuf,
}

impl StorageConfig {
    fn from_env() -> Self {
        Self {
            snapshot_dir: PathBuf::from(env_or("NARRADAR_SNAPSHOT_DIR", "data/snapshots")),
        }
    }
}
