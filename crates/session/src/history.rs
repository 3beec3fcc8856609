//! On-disk session history and results export.
//!
//! Layout under the history directory:
//!
//! ```text
//! history.json                      last 20 records, oldest first
//! last_session.json                 most recent record
//! exercise_results_<id>.json        export of one record
//! exercise_results_<id>.txt         plain-text summary of one record
//! ```

use std::path::{Path, PathBuf};

use repcoach_common::error::RepcoachError;
use repcoach_pose_model::results::{ResultsRecord, SessionHistory};

pub const HISTORY_FILE: &str = "history.json";
pub const LAST_SESSION_FILE: &str = "last_session.json";

/// Errors raised while reading or writing session history.
#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode session record: {0}")]
    Encode(#[from] serde_json::Error),
}

impl From<HistoryError> for RepcoachError {
    fn from(err: HistoryError) -> Self {
        RepcoachError::persistence(err.to_string())
    }
}

/// Files written by [`HistoryStore::export`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportPaths {
    pub json: PathBuf,
    pub summary: PathBuf,
}

/// Reads and writes session records in one directory.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    dir: PathBuf,
}

impl HistoryStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The stored history. A missing file is an empty history; an unreadable
    /// one is logged and treated as empty.
    pub fn load_history(&self) -> Result<SessionHistory, HistoryError> {
        let path = self.dir.join(HISTORY_FILE);
        if !path.exists() {
            return Ok(SessionHistory::new());
        }
        let content = read(&path)?;
        match serde_json::from_str(&content) {
            Ok(history) => Ok(history),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Discarding unreadable history");
                Ok(SessionHistory::new())
            }
        }
    }

    /// The most recently saved record, if any.
    pub fn last_session(&self) -> Result<Option<ResultsRecord>, HistoryError> {
        let path = self.dir.join(LAST_SESSION_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let content = read(&path)?;
        match serde_json::from_str(&content) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Ignoring unreadable last session"
                );
                Ok(None)
            }
        }
    }

    /// Append `record` to the history and make it the last session.
    pub fn save(&self, record: &ResultsRecord) -> Result<SessionHistory, HistoryError> {
        let mut history = self.load_history()?;
        if let Some(evicted) = history.push(record.clone()) {
            tracing::debug!(session_id = %evicted.session_id, "Evicted oldest history entry");
        }

        write(&self.dir.join(HISTORY_FILE), &serde_json::to_string_pretty(&history)?)?;
        write(
            &self.dir.join(LAST_SESSION_FILE),
            &serde_json::to_string_pretty(record)?,
        )?;

        tracing::info!(
            session_id = %record.session_id,
            entries = history.len(),
            "Session saved to history"
        );
        Ok(history)
    }

    /// Write `exercise_results_<id>.json` and its `.txt` summary.
    pub fn export(&self, record: &ResultsRecord) -> Result<ExportPaths, HistoryError> {
        let stem = record.export_file_stem();
        let paths = ExportPaths {
            json: self.dir.join(format!("{stem}.json")),
            summary: self.dir.join(format!("{stem}.txt")),
        };

        write(&paths.json, &serde_json::to_string_pretty(record)?)?;
        write(&paths.summary, &record.summary_text())?;

        tracing::info!(path = %paths.json.display(), "Results exported");
        Ok(paths)
    }

    /// [`save`](Self::save) then [`export`](Self::export).
    pub fn persist(&self, record: &ResultsRecord) -> Result<ExportPaths, HistoryError> {
        self.save(record)?;
        self.export(record)
    }
}

fn read(path: &Path) -> Result<String, HistoryError> {
    std::fs::read_to_string(path).map_err(|source| HistoryError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn write(path: &Path, content: &str) -> Result<(), HistoryError> {
    let io_err = |source| HistoryError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    std::fs::write(path, content).map_err(io_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use repcoach_pose_model::results::{IssueKind, IssueTally, RepBreakdown, HISTORY_CAPACITY};

    fn record(correct: u32) -> ResultsRecord {
        let tally: IssueTally = [(IssueKind::KneesDrifting, 12 - correct)].into_iter().collect();
        ResultsRecord::new(
            "Squat",
            "squat",
            "2026-10-17T09:00:00+00:00",
            RepBreakdown {
                total: 12,
                correct,
                incorrect: 12 - correct,
            },
            tally,
            90,
            Vec::new(),
        )
    }

    fn temp_store(name: &str) -> HistoryStore {
        let dir = std::env::temp_dir().join(name);
        let _ = std::fs::remove_dir_all(&dir);
        HistoryStore::new(dir)
    }

    #[test]
    fn test_empty_store() {
        let store = temp_store("repcoach_test_history_empty");
        assert!(store.load_history().unwrap().is_empty());
        assert!(store.last_session().unwrap().is_none());
    }

    #[test]
    fn test_save_keeps_newest_records() {
        let store = temp_store("repcoach_test_history_cap");
        let mut last_id = String::new();
        for _ in 0..HISTORY_CAPACITY + 5 {
            let r = record(10);
            last_id = r.session_id.clone();
            store.save(&r).unwrap();
        }

        let history = store.load_history().unwrap();
        assert_eq!(history.len(), HISTORY_CAPACITY);
        assert_eq!(history.latest().unwrap().session_id, last_id);
        assert_eq!(store.last_session().unwrap().unwrap().session_id, last_id);

        std::fs::remove_dir_all(store.dir()).ok();
    }

    #[test]
    fn test_export_writes_json_and_summary() {
        let store = temp_store("repcoach_test_history_export");
        let r = record(9);
        let paths = store.export(&r).unwrap();

        assert!(paths
            .json
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("exercise_results_"));
        let exported: ResultsRecord =
            serde_json::from_str(&std::fs::read_to_string(&paths.json).unwrap()).unwrap();
        assert_eq!(exported, r);

        let summary = std::fs::read_to_string(&paths.summary).unwrap();
        assert!(summary.starts_with("Exercise Results:"));
        assert!(summary.contains("Correct Repetitions: 9"));

        std::fs::remove_dir_all(store.dir()).ok();
    }

    #[test]
    fn test_corrupt_history_is_discarded() {
        let store = temp_store("repcoach_test_history_corrupt");
        std::fs::create_dir_all(store.dir()).unwrap();
        std::fs::write(store.dir().join(HISTORY_FILE), "[{ broken").unwrap();

        assert!(store.load_history().unwrap().is_empty());
        let history = store.save(&record(12)).unwrap();
        assert_eq!(history.len(), 1);

        std::fs::remove_dir_all(store.dir()).ok();
    }

    #[test]
    fn test_unwritable_dir_is_persistence_error() {
        let base = std::env::temp_dir().join("repcoach_test_history_blocked");
        let _ = std::fs::remove_dir_all(&base);
        std::fs::create_dir_all(&base).unwrap();
        let blocker = base.join("not_a_dir");
        std::fs::write(&blocker, "file").unwrap();

        let store = HistoryStore::new(blocker.join("sessions"));
        let err = store.persist(&record(12)).unwrap_err();
        assert!(matches!(err, HistoryError::Io { .. }));
        assert!(matches!(
            RepcoachError::from(err),
            RepcoachError::Persistence { .. }
        ));

        std::fs::remove_dir_all(&base).ok();
    }
}
