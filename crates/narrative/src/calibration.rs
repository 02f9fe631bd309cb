//! Offline calibration of stated narrative confidence.
//!
//! Treats each narrative's confidence as a predicted probability that
//! it persists into the next snapshot, resolves persistence with the
//! identity matcher over every consecutive snapshot pair, and scores
//! the whole history with a Brier score. Malformed or empty input
//! produces an all-zero report, never an error.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, warn};
use walkdir::WalkDir;

use narradar_core::config::MatcherConfig;
use narradar_core::error::CoreError;

use crate::matcher::match_narratives;
use crate::types::{Momentum, Narrative, SnapshotDocument};

pub const BUCKET_COUNT: usize = 10;

/// One fixed-width confidence bucket ([0,10) … [90,100]).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalibrationBucket {
    pub total: u32,
    pub persisted: u32,
    /// Persisted narratives that moved to a higher stage.
    pub stage_advanced: u32,
    /// Persisted narratives that were labeled "accelerating".
    pub accelerating: u32,
    /// Of those, how many actually advanced a stage.
    pub accelerating_advanced: u32,
}

/// Accumulates observations across many consecutive-pair comparisons.
#[derive(Debug, Clone, Default)]
pub struct CalibrationAccumulator {
    buckets: [CalibrationBucket; BUCKET_COUNT],
    observations: u32,
    squared_error_sum: f64,
    snapshot_pairs: u32,
}

impl CalibrationAccumulator {
    /// Fold one consecutive snapshot pair: every narrative in
    /// `earlier` yields one binary persistence observation against
    /// `later`.
    pub fn fold_pair(&mut self, earlier: &[Narrative], later: &[Narrative], cfg: &MatcherConfig) {
        self.snapshot_pairs += 1;

        // matches[li] = Some(ei) means later narrative li resolved to
        // earlier narrative ei; invert to look up persistence per
        // earlier narrative.
        let matches = match_narratives(later, earlier, cfg);
        let mut persisted_as: Vec<Option<usize>> = vec![None; earlier.len()];
        for (li, matched) in matches.iter().enumerate() {
            if let Some(ei) = matched {
                persisted_as[*ei] = Some(li);
            }
        }

        for (ei, e) in earlier.iter().enumerate() {
            let confidence = e.confidence.clamp(0.0, 100.0);
            let predicted = confidence / 100.0;
            let successor = persisted_as[ei].map(|li| &later[li]);
            let outcome = if successor.is_some() { 1.0 } else { 0.0 };

            self.observations += 1;
            self.squared_error_sum += (predicted - outcome).powi(2);

            let bucket = &mut self.buckets[bucket_index(confidence)];
            bucket.total += 1;

            if let Some(next) = successor {
                bucket.persisted += 1;
                let advanced = next.stage > e.stage;
                if advanced {
                    bucket.stage_advanced += 1;
                }
                if e.momentum == Momentum::Accelerating {
                    bucket.accelerating += 1;
                    if advanced {
                        bucket.accelerating_advanced += 1;
                    }
                }
            }
        }
    }

    pub fn report(&self) -> CalibrationReport {
        let persisted: u32 = self.buckets.iter().map(|b| b.persisted).sum();
        let stage_advanced: u32 = self.buckets.iter().map(|b| b.stage_advanced).sum();
        let accelerating: u32 = self.buckets.iter().map(|b| b.accelerating).sum();
        let accelerating_advanced: u32 =
            self.buckets.iter().map(|b| b.accelerating_advanced).sum();

        CalibrationReport {
            snapshot_pairs: self.snapshot_pairs,
            observations: self.observations,
            brier_score: if self.observations == 0 {
                0.0
            } else {
                self.squared_error_sum / self.observations as f64
            },
            stage_advance_rate: ratio(stage_advanced, persisted),
            momentum_accuracy: ratio(accelerating_advanced, accelerating),
            buckets: self.buckets,
        }
    }
}

/// Aggregate calibration over a snapshot history. Brier score is the
/// mean squared error between confidence/100 and the persistence
/// outcome — bounded [0,1], 0 is perfect.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalibrationReport {
    pub snapshot_pairs: u32,
    pub observations: u32,
    pub brier_score: f64,
    /// Among persisted narratives, the fraction that advanced a stage.
    pub stage_advance_rate: f64,
    /// Among persisted "accelerating" narratives, the fraction that
    /// actually advanced a stage.
    pub momentum_accuracy: f64,
    pub buckets: [CalibrationBucket; BUCKET_COUNT],
}

impl CalibrationReport {
    pub fn write_json(&self, path: &Path) -> Result<(), CoreError> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| CoreError::Serialize(e.to_string()))?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

fn bucket_index(confidence: f64) -> usize {
    ((confidence / 10.0) as usize).min(BUCKET_COUNT - 1)
}

fn ratio(num: u32, den: u32) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// Evaluate every consecutive pair of daily snapshot documents in
/// `dir` (one JSON file per calendar date, named `YYYY-MM-DD.json`).
/// Unreadable or malformed files are skipped with a warning; an empty
/// or missing directory yields an all-zero report.
pub fn evaluate_snapshot_dir(dir: &Path, cfg: &MatcherConfig) -> CalibrationReport {
    let mut dated: Vec<(NaiveDate, PathBuf)> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let path = entry.path().to_path_buf();
            let date = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())?;
            (path.extension().and_then(|e| e.to_str()) == Some("json")).then_some((date, path))
        })
        .collect();
    dated.sort_by_key(|(date, _)| *date);

    let mut acc = CalibrationAccumulator::default();
    let mut previous: Option<SnapshotDocument> = None;

    for (date, path) in dated {
        let doc = match load_snapshot(&path) {
            Ok(doc) => doc,
            Err(err) => {
                warn!("skipping snapshot {}: {}", path.display(), err);
                continue;
            }
        };
        debug!("loaded snapshot {} ({} narratives)", date, doc.narratives.len());
        if let Some(prev) = &previous {
            acc.fold_pair(&prev.narratives, &doc.narratives, cfg);
        }
        previous = Some(doc);
    }

    acc.report()
}

fn load_snapshot(path: &Path) -> Result<SnapshotDocument, CoreError> {
    let raw = std::fs::read_to_string(path)?;
    serde_json::from_str(&raw).map_err(|e| CoreError::Serialize(e.to_string()))
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::types::Stage;

    fn narrative(name: &str, stage: Stage, confidence: f64, momentum: Momentum) -> Narrative {
        let mut n = Narrative::new("n-1", name, stage);
        n.confidence = confidence;
        n.momentum = momentum;
        n
    }

    fn cfg() -> MatcherConfig {
        MatcherConfig::default()
    }

    #[test]
    fn certain_narrative_that_persists_scores_zero() {
        let earlier = vec![narrative("DePIN Growth", Stage::Early, 100.0, Momentum::Stable)];
        let later = vec![narrative("DePIN Growth", Stage::Early, 100.0, Momentum::Stable)];

        let mut acc = CalibrationAccumulator::default();
        acc.fold_pair(&earlier, &later, &cfg());
        let report = acc.report();

        assert_eq!(report.observations, 1);
        assert_eq!(report.brier_score, 0.0);
    }

    #[test]
    fn certain_narrative_that_vanishes_scores_one() {
        let earlier = vec![narrative("DePIN Growth", Stage::Early, 100.0, Momentum::Stable)];

        let mut acc = CalibrationAccumulator::default();
        acc.fold_pair(&earlier, &[], &cfg());

        assert_eq!(acc.report().brier_score, 1.0);
    }

    #[test]
    fn coin_flip_narrative_that_persists_scores_quarter() {
        let earlier = vec![narrative("DePIN Growth", Stage::Early, 50.0, Momentum::Stable)];
        let later = vec![narrative("DePIN Growth", Stage::Early, 50.0, Momentum::Stable)];

        let mut acc = CalibrationAccumulator::default();
        acc.fold_pair(&earlier, &later, &cfg());

        assert_eq!(acc.report().brier_score, 0.25);
    }

    #[test]
    fn buckets_accumulate_by_confidence() {
        let earlier = vec![
            narrative("Alpha Narrative", Stage::Early, 5.0, Momentum::Stable),
            narrative("Beta Narrative", Stage::Early, 95.0, Momentum::Stable),
            narrative("Gamma Narrative", Stage::Early, 100.0, Momentum::Stable),
        ];
        let later = vec![narrative("Beta Narrative", Stage::Early, 95.0, Momentum::Stable)];

        let mut acc = CalibrationAccumulator::default();
        acc.fold_pair(&earlier, &later, &cfg());
        let report = acc.report();

        assert_eq!(report.buckets[0].total, 1);
        assert_eq!(report.buckets[0].persisted, 0);
        // 95 and 100 both land in the top bucket ([90,100] is closed).
        assert_eq!(report.buckets[9].total, 2);
        assert_eq!(report.buckets[9].persisted, 1);
    }

    #[test]
    fn accelerating_momentum_tracked_against_stage_advance() {
        let earlier = vec![
            narrative("DePIN Growth", Stage::Early, 80.0, Momentum::Accelerating),
            narrative("Restaking Summer", Stage::Growing, 80.0, Momentum::Accelerating),
        ];
        let later = vec![
            // Advanced a stage.
            narrative("DePIN Growth", Stage::Emerging, 80.0, Momentum::Stable),
            // Persisted but did not advance.
            narrative("Restaking Summer", Stage::Growing, 80.0, Momentum::Stable),
        ];

        let mut acc = CalibrationAccumulator::default();
        acc.fold_pair(&earlier, &later, &cfg());
        let report = acc.report();

        assert_eq!(report.stage_advance_rate, 0.5);
        assert_eq!(report.momentum_accuracy, 0.5);
    }

    #[test]
    fn empty_history_is_all_zero_not_an_error() {
        let report = CalibrationAccumulator::default().report();
        assert_eq!(report.observations, 0);
        assert_eq!(report.brier_score, 0.0);
        assert_eq!(report.stage_advance_rate, 0.0);
        assert!(report.buckets.iter().all(|b| *b == CalibrationBucket::default()));
    }

    #[test]
    fn snapshot_dir_end_to_end() {
        let dir = tempfile::tempdir().unwrap();

        let days = [
            ("2026-08-01", vec![narrative("DePIN Growth", Stage::Early, 100.0, Momentum::Stable)]),
            ("2026-08-02", vec![narrative("DePIN Growth", Stage::Emerging, 50.0, Momentum::Stable)]),
            ("2026-08-03", vec![]),
        ];
        for (date, narratives) in days {
            let doc = SnapshotDocument {
                date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
                generated_at: None,
                narratives,
            };
            std::fs::write(
                dir.path().join(format!("{date}.json")),
                serde_json::to_string(&doc).unwrap(),
            )
            .unwrap();
        }
        // A stray file that is not a dated snapshot must be ignored.
        std::fs::write(dir.path().join("notes.txt"), "hello").unwrap();

        let report = evaluate_snapshot_dir(dir.path(), &cfg());

        // Day1→day2: persisted at 100% (error 0); day2→day3: vanished
        // at 50% (error 0.25). Mean = 0.125.
        assert_eq!(report.snapshot_pairs, 2);
        assert_eq!(report.observations, 2);
        assert_eq!(report.brier_score, 0.125);
        assert_eq!(report.stage_advance_rate, 1.0);
    }

    #[test]
    fn missing_dir_yields_zero_report() {
        let report = evaluate_snapshot_dir(Path::new("/nonexistent/narradar"), &cfg());
        assert_eq!(report.observations, 0);
    }

    #[test]
    fn malformed_snapshot_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("2026-08-01.json"), "{ not json").unwrap();
        let report = evaluate_snapshot_dir(dir.path(), &cfg());
        assert_eq!(report.snapshot_pairs, 0);
    }
}
