//! Population z-score anomaly detection.
//!
//! Scores each entity against its peers within the current run — no
//! rolling historical baseline, no persisted state. A uniform
//! population has no anomalies by construction, and fewer than two
//! data points never produce a signal.

pub mod detect;
pub mod score;

pub use detect::{detect_anomalies, detect_multi_metric_anomalies, Anomaly, MetricSpec};
pub use score::{enrich_with_z_scores, z_score};

/// Default |z| threshold for flagging an anomaly.
pub const DEFAULT_Z_THRESHOLD: f64 = 2.0;
