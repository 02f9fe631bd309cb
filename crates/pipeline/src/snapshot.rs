//! Date-keyed snapshot persistence: one JSON document per calendar
//! date, named `YYYY-MM-DD.json`.

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, warn};
use walkdir::WalkDir;

use narradar_core::error::CoreError;
use narradar_narrative::types::{Narrative, SnapshotDocument};

pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.dir.join(format!("{}.json", date.format("%Y-%m-%d")))
    }

    /// Write this run's narratives as the snapshot for `date`,
    /// overwriting any earlier run of the same day.
    pub fn save(
        &self,
        date: NaiveDate,
        narratives: &[Narrative],
        generated_at: DateTime<Utc>,
    ) -> Result<PathBuf, CoreError> {
        std::fs::create_dir_all(&self.dir)?;
        let doc = SnapshotDocument {
            date,
            generated_at: Some(generated_at),
            narratives: narratives.to_vec(),
        };
        let path = self.path_for(date);
        let json = serde_json::to_string_pretty(&doc)
            .map_err(|e| CoreError::Serialize(e.to_string()))?;
        std::fs::write(&path, json)?;
        debug!("saved snapshot {} ({} narratives)", path.display(), doc.narratives.len());
        Ok(path)
    }

    pub fn load(&self, date: NaiveDate) -> Result<SnapshotDocument, CoreError> {
        let raw = std::fs::read_to_string(self.path_for(date))?;
        serde_json::from_str(&raw).map_err(|e| CoreError::Serialize(e.to_string()))
    }

    /// Dates with a snapshot on disk, ascending.
    pub fn list_dates(&self) -> Vec<NaiveDate> {
        let mut dates: Vec<NaiveDate> = WalkDir::new(&self.dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let path = entry.path();
                (path.extension().and_then(|e| e.to_str()) == Some("json"))
                    .then(|| path.file_stem())
                    .flatten()
                    .and_then(|s| s.to_str())
                    .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
            })
            .collect();
        dates.sort();
        dates
    }

    /// The newest snapshot strictly before `date`, if any. Unreadable
    /// documents are skipped so one corrupt file cannot wedge a run.
    pub fn load_latest_before(&self, date: NaiveDate) -> Option<SnapshotDocument> {
        for prior in self.list_dates().into_iter().filter(|d| *d < date).rev() {
            match self.load(prior) {
                Ok(doc) => return Some(doc),
                Err(err) => warn!("skipping unreadable snapshot {}: {}", prior, err),
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use narradar_narrative::types::Stage;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn narrative(name: &str) -> Narrative {
        Narrative::new("n-1", name, Stage::Early)
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());

        store
            .save(date("2026-08-27"), &[narrative("DePIN Growth")], Utc::now())
            .unwrap();

        let doc = store.load(date("2026-08-27")).unwrap();
        assert_eq!(doc.date, date("2026-08-27"));
        assert_eq!(doc.narratives.len(), 1);
        assert_eq!(doc.narratives[0].slug, "depin-growth");
    }

    #[test]
    fn latest_before_picks_newest_prior_date() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());
        for d in ["2026-08-01", "2026-08-15", "2026-08-27"] {
            store.save(date(d), &[narrative(d)], Utc::now()).unwrap();
        }

        let doc = store.load_latest_before(date("2026-08-27")).unwrap();
        assert_eq!(doc.date, date("2026-08-15"));
        assert_eq!(store.list_dates().len(), 3);
    }

    #[test]
    fn no_prior_snapshot_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());
        assert!(store.load_latest_before(date("2026-08-27")).is_none());

        store.save(date("2026-08-27"), &[], Utc::now()).unwrap();
        // Same-day snapshot is not "before".
        assert!(store.load_latest_before(date("2026-08-27")).is_none());
    }

    #[test]
    fn non_snapshot_files_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());
        std::fs::write(dir.path().join("README.md"), "notes").unwrap();
        std::fs::write(dir.path().join("not-a-date.json"), "{}").unwrap();
        assert!(store.list_dates().is_empty());
    }
}
