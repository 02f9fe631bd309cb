//! One batch run: score → cluster → resolve identity → diff → persist.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::{info, warn};

use narradar_core::config::MatcherConfig;
use narradar_core::signal::SignalBundle;
use narradar_llm::{ModelCallResult, ModelChain};
use narradar_narrative::history::{compute_report_diff, populate_history, ReportDiff};
use narradar_narrative::matcher::match_narratives;
use narradar_narrative::types::Narrative;

use crate::clustering::cluster_narratives;
use crate::error::PipelineError;
use crate::scoring::score_signals;
use crate::snapshot::SnapshotStore;

/// Model-call accounting surfaced in the run report (content omitted —
/// it already became the narratives).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallStats {
    pub model_used: String,
    pub tokens_total: u32,
    pub cost_usd: f64,
}

impl From<&ModelCallResult> for CallStats {
    fn from(result: &ModelCallResult) -> Self {
        Self {
            model_used: result.model_used.clone(),
            tokens_total: result.tokens_total,
            cost_usd: result.cost_usd,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub date: NaiveDate,
    pub generated_at: DateTime<Utc>,
    pub anomaly_count: usize,
    pub narratives: Vec<Narrative>,
    pub diff: ReportDiff,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call: Option<CallStats>,
}

pub struct RunOptions<'a> {
    pub date: NaiveDate,
    pub run_time: DateTime<Utc>,
    pub z_threshold: f64,
    pub matcher: &'a MatcherConfig,
    pub model_override: Option<&'a str>,
    /// Treat chain exhaustion or malformed model output as an
    /// empty-narrative run instead of failing. Storage errors still
    /// fail either way.
    pub degrade_empty: bool,
}

/// Execute one run over a fully collected signal bundle.
///
/// A quiet bundle (no anomalies) short-circuits to an empty narrative
/// set without spending a model call. Chain exhaustion and malformed
/// model output surface as errors; whether to degrade to an empty run
/// instead is the caller's policy.
pub async fn run(
    bundle: &mut SignalBundle,
    chain: &ModelChain,
    store: &SnapshotStore,
    opts: &RunOptions<'_>,
) -> Result<RunReport, PipelineError> {
    let summary = score_signals(bundle, opts.z_threshold);
    let anomaly_count = summary.entities.len();
    info!("run {}: {} anomalous entities", opts.date, anomaly_count);

    let (mut narratives, call) = if summary.is_empty() {
        info!("no anomalies; skipping clustering call");
        (Vec::new(), None)
    } else {
        match cluster_narratives(chain, &summary, opts.model_override).await {
            Ok((narratives, result)) => (narratives, Some(result)),
            Err(err) if opts.degrade_empty => {
                warn!("clustering failed, degrading to empty narrative set: {}", err);
                (Vec::new(), None)
            }
            Err(err) => return Err(err),
        }
    };

    let previous = store
        .load_latest_before(opts.date)
        .map(|doc| doc.narratives)
        .unwrap_or_default();

    let matches = match_narratives(&narratives, &previous, opts.matcher);
    populate_history(&mut narratives, &previous, &matches, opts.run_time);
    let diff = compute_report_diff(&narratives, &previous, opts.matcher);

    store.save(opts.date, &narratives, opts.run_time)?;

    Ok(RunReport {
        date: opts.date,
        generated_at: opts.run_time,
        anomaly_count,
        narratives,
        diff,
        call: call.as_ref().map(CallStats::from),
    })
}
