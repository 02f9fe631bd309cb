pub mod clustering;
pub mod error;
pub mod run;
pub mod scoring;
pub mod snapshot;

pub use error::PipelineError;
pub use run::{run, RunOptions, RunReport};
pub use scoring::{score_signals, AnomalySummary};
pub use snapshot::SnapshotStore;
