use serde::{Deserialize, Serialize};

/// One scored metric field: the collected value, the change against
/// the prior window (computed upstream), and the z-score written by
/// the anomaly engine over the full in-run population.
///
/// `z_score` is only meaningful after scoring has run for this metric
/// in this run; it is never persisted across runs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scored {
    pub raw: f64,
    pub delta: f64,
    #[serde(default)]
    pub z_score: f64,
}

impl Scored {
    pub fn new(raw: f64, delta: f64) -> Self {
        Self {
            raw,
            delta,
            z_score: 0.0,
        }
    }
}

// ── Per-layer signal records ──────────────────────────────────

/// Developer-activity layer: one tracked repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedRepo {
    pub name: String,
    pub commits: Scored,
    pub stars: Scored,
    pub forks: Scored,
}

/// Capital-flow layer: one DeFi protocol.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Protocol {
    pub name: String,
    pub tvl_usd: Scored,
}

/// Market layer: one token.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenMarket {
    pub symbol: String,
    pub volume_usd: Scored,
    pub price_change_pct: Scored,
}

/// Social layer: one tracked topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialTopic {
    pub topic: String,
    pub mentions: Scored,
}

/// Everything the collectors gathered for one run. Collection is
/// upstream of this core; the bundle must be complete before scoring
/// because population mean/stddev cannot be computed incrementally.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalBundle {
    #[serde(default)]
    pub repos: Vec<TrackedRepo>,
    #[serde(default)]
    pub protocols: Vec<Protocol>,
    #[serde(default)]
    pub tokens: Vec<TokenMarket>,
    #[serde(default)]
    pub social: Vec<SocialTopic>,
}

impl SignalBundle {
    pub fn is_empty(&self) -> bool {
        self.repos.is_empty()
            && self.protocols.is_empty()
            && self.tokens.is_empty()
            && self.social.is_empty()
    }
}
