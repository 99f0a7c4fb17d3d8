use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use super::Outcome;

/// Destination for per-file outcomes.
///
/// Called concurrently from worker threads; implementations serialize their
/// own writes.
pub trait OutcomeSink: Send + Sync {
    fn report(&self, path: &Path, outcome: &Outcome);
}

/// One reported outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub path: PathBuf,
    pub label: &'static str,
    pub detail: Option<String>,
}

/// Sink that keeps every outcome in memory
#[derive(Debug, Default)]
pub struct CollectingSink {
    records: Mutex<Vec<Record>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all records, sorted by path
    pub fn records(&self) -> Vec<Record> {
        let mut records = self
            .records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        records.sort_by(|a, b| a.path.cmp(&b.path));
        records
    }

    pub fn failures(&self) -> Vec<Record> {
        self.records()
            .into_iter()
            .filter(|record| record.detail.is_some())
            .collect()
    }

    /// Number of records carrying `label`
    pub fn count(&self, label: &str) -> usize {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|record| record.label == label)
            .count()
    }

    /// Label reported for `path`, if any
    pub fn label_of(&self, path: impl AsRef<Path>) -> Option<&'static str> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|record| record.path == path.as_ref())
            .map(|record| record.label)
    }
}

impl OutcomeSink for CollectingSink {
    fn report(&self, path: &Path, outcome: &Outcome) {
        let detail = match outcome {
            Outcome::Failed(err) => Some(err.to_string()),
            _ => None,
        };
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Record {
                path: path.to_path_buf(),
                label: outcome.label(),
                detail,
            });
    }
}
