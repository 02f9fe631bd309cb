//! Narrative data model.
//!
//! Narratives are created fresh every run from the clustering call's
//! output and never loaded back as live objects — the next run's
//! narratives are matched against this run's snapshot by slug and
//! name only, never by `id`.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Ordered maturity classification: how many independent signal
/// layers corroborate a narrative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Stage {
    Early,
    Emerging,
    Growing,
    Mainstream,
}

impl Stage {
    /// Tolerant parse of model-produced stage labels.
    pub fn parse_loose(raw: &str) -> Option<Stage> {
        match raw.trim().to_uppercase().as_str() {
            "EARLY" => Some(Stage::Early),
            "EMERGING" => Some(Stage::Emerging),
            "GROWING" => Some(Stage::Growing),
            "MAINSTREAM" => Some(Stage::Mainstream),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Momentum {
    Accelerating,
    Stable,
    Decelerating,
}

impl Momentum {
    pub fn parse_loose(raw: &str) -> Option<Momentum> {
        match raw.trim().to_lowercase().as_str() {
            "accelerating" => Some(Momentum::Accelerating),
            "stable" => Some(Momentum::Stable),
            "decelerating" => Some(Momentum::Decelerating),
            _ => None,
        }
    }
}

/// Free-text evidence strings grouped by how directly they lead the
/// narrative.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalRefs {
    #[serde(default)]
    pub leading: Vec<String>,
    #[serde(default)]
    pub coincident: Vec<String>,
    #[serde(default)]
    pub confirming: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedEntities {
    #[serde(default)]
    pub repos: Vec<String>,
    #[serde(default)]
    pub tokens: Vec<String>,
    #[serde(default)]
    pub protocols: Vec<String>,
}

/// One LLM-synthesized cluster of correlated anomalies. Ephemeral per
/// run; `previous_stage` / `stage_changed_at` / `is_new` are attached
/// once by the identity resolver.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Narrative {
    /// Run-local id ("n-3"); never used for cross-run identity.
    pub id: String,
    pub name: String,
    /// Derived deterministically from `name`.
    pub slug: String,
    pub description: String,
    pub stage: Stage,
    pub momentum: Momentum,
    /// Stated probability of persistence, 0–100.
    pub confidence: f64,
    #[serde(default)]
    pub signal_refs: SignalRefs,
    #[serde(default)]
    pub related_entities: RelatedEntities,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_stage: Option<Stage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage_changed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_new: Option<bool>,
}

impl Narrative {
    /// Minimal constructor used by the clustering normalizer and tests.
    pub fn new(id: impl Into<String>, name: impl Into<String>, stage: Stage) -> Self {
        let name = name.into();
        let slug = slugify(&name);
        Self {
            id: id.into(),
            name,
            slug,
            description: String::new(),
            stage,
            momentum: Momentum::Stable,
            confidence: 50.0,
            signal_refs: SignalRefs::default(),
            related_entities: RelatedEntities::default(),
            previous_stage: None,
            stage_changed_at: None,
            is_new: None,
        }
    }
}

/// One persisted daily snapshot: the narratives produced by a single
/// run, written as `YYYY-MM-DD.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotDocument {
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<DateTime<Utc>>,
    pub narratives: Vec<Narrative>,
}

/// Deterministic slug from a narrative name: lowercase, alphanumeric
/// runs joined by single hyphens.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_hyphen = true;
    for ch in name.to_lowercase().chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch);
            last_hyphen = false;
        } else if !last_hyphen {
            slug.push('-');
            last_hyphen = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}
