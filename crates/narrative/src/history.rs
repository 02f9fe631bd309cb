//! History annotation and run-over-run diffs.

use chrono::{DateTime, Utc};
use serde::Serialize;

use narradar_core::config::MatcherConfig;

use crate::matcher::{match_narratives, unclaimed_previous};
use crate::types::{Narrative, Stage};

/// Attach history to the current run's narratives from their resolved
/// previous counterparts: `is_new` for unmatched narratives,
/// `previous_stage` always, `stage_changed_at` only when the stage
/// actually moved.
pub fn populate_history(
    current: &mut [Narrative],
    previous: &[Narrative],
    matches: &[Option<usize>],
    run_time: DateTime<Utc>,
) {
    for (cur, matched) in current.iter_mut().zip(matches) {
        match matched {
            None => {
                cur.is_new = Some(true);
            }
            Some(pi) => {
                let prev = &previous[*pi];
                cur.is_new = Some(false);
                cur.previous_stage = Some(prev.stage);
                if prev.stage != cur.stage {
                    cur.stage_changed_at = Some(run_time);
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageTransition {
    pub name: String,
    pub from: Stage,
    pub to: Stage,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfidenceChange {
    pub name: String,
    /// Signed delta, current minus previous.
    pub delta: f64,
}

/// What changed between two runs. Derived, never stored — always
/// recomputable from the two narrative collections.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportDiff {
    pub new_narratives: Vec<Narrative>,
    pub removed_narratives: Vec<Narrative>,
    pub stage_transitions: Vec<StageTransition>,
    pub confidence_changes: Vec<ConfidenceChange>,
}

impl ReportDiff {
    pub fn is_empty(&self) -> bool {
        self.new_narratives.is_empty()
            && self.removed_narratives.is_empty()
            && self.stage_transitions.is_empty()
            && self.confidence_changes.is_empty()
    }
}

/// Diff two narrative collections. Pure; safe to call repeatedly.
pub fn compute_report_diff(
    current: &[Narrative],
    previous: &[Narrative],
    cfg: &MatcherConfig,
) -> ReportDiff {
    let matches = match_narratives(current, previous, cfg);

    let mut diff = ReportDiff::default();

    for (cur, matched) in current.iter().zip(&matches) {
        match matched {
            None => diff.new_narratives.push(cur.clone()),
            Some(pi) => {
                let prev = &previous[*pi];
                if prev.stage != cur.stage {
                    diff.stage_transitions.push(StageTransition {
                        name: cur.name.clone(),
                        from: prev.stage,
                        to: cur.stage,
                    });
                }
                if prev.confidence != cur.confidence {
                    diff.confidence_changes.push(ConfidenceChange {
                        name: cur.name.clone(),
                        delta: cur.confidence - prev.confidence,
                    });
                }
            }
        }
    }

    for pi in unclaimed_previous(&matches, previous.len()) {
        diff.removed_narratives.push(previous[pi].clone());
    }

    diff
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::types::Momentum;

    fn narrative(id: &str, name: &str, stage: Stage, confidence: f64) -> Narrative {
        let mut n = Narrative::new(id, name, stage);
        n.confidence = confidence;
        n
    }

    fn cfg() -> MatcherConfig {
        MatcherConfig::default()
    }

    fn run_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 27, 6, 0, 0).unwrap()
    }

    #[test]
    fn new_narrative_marked() {
        let mut current = vec![narrative("n-1", "Fresh Narrative", Stage::Early, 40.0)];
        let matches = vec![None];
        populate_history(&mut current, &[], &matches, run_time());

        assert_eq!(current[0].is_new, Some(true));
        assert_eq!(current[0].previous_stage, None);
        assert_eq!(current[0].stage_changed_at, None);
    }

    #[test]
    fn matched_narrative_carries_previous_stage() {
        let previous = vec![narrative("n-9", "DePIN Growth", Stage::Early, 50.0)];
        let mut current = vec![narrative("n-1", "DePIN Growth", Stage::Early, 60.0)];
        let matches = match_narratives(&current, &previous, &cfg());
        populate_history(&mut current, &previous, &matches, run_time());

        assert_eq!(current[0].is_new, Some(false));
        assert_eq!(current[0].previous_stage, Some(Stage::Early));
        // Stage unchanged: no timestamp.
        assert_eq!(current[0].stage_changed_at, None);
    }

    #[test]
    fn stage_change_is_stamped() {
        let previous = vec![narrative("n-9", "DePIN Growth", Stage::Early, 50.0)];
        let mut current = vec![narrative("n-1", "DePIN Growth", Stage::Emerging, 60.0)];
        let matches = match_narratives(&current, &previous, &cfg());
        populate_history(&mut current, &previous, &matches, run_time());

        assert_eq!(current[0].previous_stage, Some(Stage::Early));
        assert_eq!(current[0].stage_changed_at, Some(run_time()));
    }

    #[test]
    fn identical_lists_yield_empty_diff() {
        let narratives = vec![
            narrative("n-1", "DePIN Growth", Stage::Emerging, 70.0),
            narrative("n-2", "Restaking Summer", Stage::Growing, 55.0),
        ];
        let diff = compute_report_diff(&narratives, &narratives, &cfg());
        assert!(diff.is_empty());
    }

    #[test]
    fn diff_covers_all_four_fields() {
        let previous = vec![
            narrative("n-1", "DePIN Growth", Stage::Early, 50.0),
            narrative("n-2", "Gone Narrative", Stage::Growing, 80.0),
        ];
        let mut current = vec![
            narrative("n-1", "DePIN Growth", Stage::Emerging, 65.0),
            narrative("n-2", "Brand New Thing", Stage::Early, 30.0),
        ];
        current[0].momentum = Momentum::Accelerating;

        let diff = compute_report_diff(&current, &previous, &cfg());

        assert_eq!(diff.new_narratives.len(), 1);
        assert_eq!(diff.new_narratives[0].name, "Brand New Thing");
        assert_eq!(diff.removed_narratives.len(), 1);
        assert_eq!(diff.removed_narratives[0].name, "Gone Narrative");
        assert_eq!(
            diff.stage_transitions,
            vec![StageTransition {
                name: "DePIN Growth".into(),
                from: Stage::Early,
                to: Stage::Emerging,
            }]
        );
        assert_eq!(diff.confidence_changes.len(), 1);
        assert_eq!(diff.confidence_changes[0].delta, 15.0);
    }

    #[test]
    fn confidence_delta_is_signed() {
        let previous = vec![narrative("n-1", "DePIN Growth", Stage::Early, 70.0)];
        let current = vec![narrative("n-1", "DePIN Growth", Stage::Early, 55.0)];
        let diff = compute_report_diff(&current, &previous, &cfg());
        assert_eq!(diff.confidence_changes[0].delta, -15.0);
    }
}
