pub mod calibration;
pub mod history;
pub mod matcher;
pub mod types;

pub use calibration::{evaluate_snapshot_dir, CalibrationAccumulator, CalibrationReport};
pub use history::{compute_report_diff, populate_history, ReportDiff};
pub use matcher::match_narratives;
pub use types::{slugify, Momentum, Narrative, SnapshotDocument, Stage};
