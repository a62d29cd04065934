//! Run records for scheduled commands.
//!
//! Every scheduled invocation opens a record before the command body runs
//! and closes it afterwards, whatever the outcome. Interactive runs are not
//! recorded.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::context::Command;
use crate::scheduler::Deadline;

#[derive(Debug, Error)]
pub enum RunLogError {
    #[error("run log I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("run log is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no run with id {0}")]
    UnknownRun(Uuid),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

/// One scheduled invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRecord {
    pub id: Uuid,
    pub command: String,
    pub args: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub duration_ms: Option<u64>,
    pub status: RunStatus,
    pub output: Option<String>,
    pub failure: Option<String>,
    /// The command was still running when its time limit passed.
    #[serde(default)]
    pub timed_out: bool,
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed { output: String },
    Failed { message: String },
}

/// Everything needed to close a record.
#[derive(Debug, Clone)]
pub struct FinishedRun {
    pub finished_at: DateTime<Utc>,
    pub duration: Duration,
    pub outcome: RunOutcome,
    pub timed_out: bool,
}

/// Storage for run records.
///
/// Failures are reported to the caller; the command runner logs them and
/// carries on so bookkeeping never blocks the command itself.
pub trait RunRecorder: Send + Sync {
    fn start(&self, command: &Command, started_at: DateTime<Utc>) -> Result<Uuid, RunLogError>;

    fn finish(&self, id: Uuid, run: FinishedRun) -> Result<(), RunLogError>;
}

/// Concurrent in-memory run log with optional JSON persistence.
#[derive(Debug, Clone, Default)]
pub struct RunLog {
    inner: Arc<DashMap<Uuid, RunRecord>>,
    persistence_path: Option<PathBuf>,
}

impl RunLog {
    pub fn new(persistence_path: Option<PathBuf>) -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
            persistence_path,
        }
    }

    /// Load from file if it exists; later saves go to the same file.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, RunLogError> {
        let path = path.as_ref();
        let log = Self::new(Some(path.to_path_buf()));
        if path.exists() {
            let reader = BufReader::new(File::open(path)?);
            let records: HashMap<Uuid, RunRecord> = serde_json::from_reader(reader)?;
            for (id, record) in records {
                log.inner.insert(id, record);
            }
            tracing::info!(path = ?path, records = log.inner.len(), "Loaded run log");
        }
        Ok(log)
    }

    /// Write every record to the persistence file. No-op when in-memory.
    pub fn save_to_file(&self) -> Result<(), RunLogError> {
        if let Some(path) = &self.persistence_path {
            let records: HashMap<Uuid, RunRecord> = self
                .inner
                .iter()
                .map(|r| (*r.key(), r.value().clone()))
                .collect();
            let writer = BufWriter::new(File::create(path)?);
            serde_json::to_writer_pretty(writer, &records)?;
            tracing::debug!(path = ?path, records = records.len(), "Saved run log");
        }
        Ok(())
    }

    pub fn get(&self, id: &Uuid) -> Option<RunRecord> {
        self.inner.get(id).map(|r| r.value().clone())
    }

    /// All records, oldest first.
    pub fn records(&self) -> Vec<RunRecord> {
        let mut records: Vec<RunRecord> = self.inner.iter().map(|r| r.value().clone()).collect();
        records.sort_by_key(|r| r.started_at);
        records
    }

    /// Most recent record for a command.
    pub fn latest(&self, command: &str) -> Option<RunRecord> {
        self.inner
            .iter()
            .filter(|r| r.value().command == command)
            .max_by_key(|r| r.value().started_at)
            .map(|r| r.value().clone())
    }

    /// Drop finished records that started before `cutoff`, oldest first,
    /// stopping early once `deadline` passes. Running records are kept.
    /// Returns how many were removed.
    pub fn prune(&self, cutoff: DateTime<Utc>, deadline: &Deadline) -> Result<usize, RunLogError> {
        let mut removed = 0;
        for record in self.records() {
            if record.started_at >= cutoff {
                break;
            }
            if deadline.expired() {
                tracing::warn!(removed, "Run log pruning stopped at time limit");
                break;
            }
            if record.status != RunStatus::Running && self.inner.remove(&record.id).is_some() {
                removed += 1;
            }
        }
        if removed > 0 {
            self.save_to_file()?;
        }
        Ok(removed)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl RunRecorder for RunLog {
    fn start(&self, command: &Command, started_at: DateTime<Utc>) -> Result<Uuid, RunLogError> {
        let id = Uuid::new_v4();
        self.inner.insert(
            id,
            RunRecord {
                id,
                command: command.name.clone(),
                args: command.args.clone(),
                started_at,
                finished_at: None,
                duration_ms: None,
                status: RunStatus::Running,
                output: None,
                failure: None,
                timed_out: false,
            },
        );
        if let Err(e) = self.save_to_file() {
            // An unpersisted record would stay Running forever
            self.inner.remove(&id);
            return Err(e);
        }
        Ok(id)
    }

    fn finish(&self, id: Uuid, run: FinishedRun) -> Result<(), RunLogError> {
        {
            let mut record = self.inner.get_mut(&id).ok_or(RunLogError::UnknownRun(id))?;
            record.finished_at = Some(run.finished_at);
            record.duration_ms = Some(u64::try_from(run.duration.as_millis()).unwrap_or(u64::MAX));
            record.timed_out = run.timed_out;
            match run.outcome {
                RunOutcome::Completed { output } => {
                    record.status = RunStatus::Completed;
                    record.output = Some(output);
                }
                RunOutcome::Failed { message } => {
                    record.status = RunStatus::Failed;
                    record.failure = Some(message);
                }
            }
        }
        self.save_to_file()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    fn finished(outcome: RunOutcome) -> FinishedRun {
        FinishedRun {
            finished_at: Utc::now(),
            duration: Duration::from_millis(1500),
            outcome,
            timed_out: false,
        }
    }

    #[test]
    fn test_start_then_complete() {
        let log = RunLog::default();
        let command = Command::new("reports:build").with_args(["daily"]).scheduled();
        let id = log.start(&command, Utc::now()).unwrap();

        let running = log.get(&id).unwrap();
        assert_eq!(running.status, RunStatus::Running);
        assert_eq!(running.args, vec!["daily"]);

        log.finish(id, finished(RunOutcome::Completed { output: "done\n".into() }))
            .unwrap();
        let record = log.get(&id).unwrap();
        assert_eq!(record.status, RunStatus::Completed);
        assert_eq!(record.output.as_deref(), Some("done\n"));
        assert_eq!(record.duration_ms, Some(1500));
        assert!(record.finished_at.is_some());
    }

    #[test]
    fn test_failure_is_recorded() {
        let log = RunLog::default();
        let id = log.start(&Command::new("sync"), Utc::now()).unwrap();
        log.finish(id, finished(RunOutcome::Failed { message: "upstream down".into() }))
            .unwrap();
        let record = log.get(&id).unwrap();
        assert_eq!(record.status, RunStatus::Failed);
        assert_eq!(record.failure.as_deref(), Some("upstream down"));
        assert!(record.output.is_none());
    }

    #[test]
    fn test_finish_unknown_run() {
        let log = RunLog::default();
        let err = log
            .finish(Uuid::new_v4(), finished(RunOutcome::Completed { output: String::new() }))
            .unwrap_err();
        assert!(matches!(err, RunLogError::UnknownRun(_)));
    }

    #[test]
    fn test_persistence_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("runs.json");

        let log = RunLog::new(Some(path.clone()));
        let id = log.start(&Command::new("sync"), Utc::now()).unwrap();
        log.finish(id, finished(RunOutcome::Completed { output: "ok".into() }))
            .unwrap();

        let reloaded = RunLog::load_from_file(&path).unwrap();
        assert_eq!(reloaded.len(), 1);
        assert_eq!(reloaded.get(&id), log.get(&id));
    }

    #[test]
    fn test_start_is_undone_when_save_fails() {
        // A directory cannot be opened as the persistence file
        let dir = tempfile::tempdir().unwrap();
        let log = RunLog::new(Some(dir.path().to_path_buf()));

        let err = log.start(&Command::new("sync"), Utc::now()).unwrap_err();
        assert!(matches!(err, RunLogError::Io(_)));
        assert!(log.is_empty());
        assert!(log.latest("sync").is_none());
    }

    #[test]
    fn test_prune_keeps_recent_and_running() {
        let log = RunLog::default();
        let now = Utc::now();
        let old = log.start(&Command::new("a"), now - ChronoDuration::days(40)).unwrap();
        log.finish(old, finished(RunOutcome::Completed { output: String::new() }))
            .unwrap();
        let stuck = log.start(&Command::new("b"), now - ChronoDuration::days(40)).unwrap();
        let recent = log.start(&Command::new("a"), now).unwrap();

        let removed = log.prune(now - ChronoDuration::days(30), &Deadline::unlimited()).unwrap();
        assert_eq!(removed, 1);
        assert!(log.get(&old).is_none());
        assert!(log.get(&stuck).is_some());
        assert_eq!(log.latest("a").map(|r| r.id), Some(recent));
    }

    #[test]
    fn test_prune_stops_at_deadline() {
        let log = RunLog::default();
        let now = Utc::now();
        let id = log.start(&Command::new("a"), now - ChronoDuration::days(90)).unwrap();
        log.finish(id, finished(RunOutcome::Completed { output: String::new() }))
            .unwrap();

        let expired = Deadline::new(std::time::Duration::ZERO);
        assert_eq!(log.prune(now, &expired).unwrap(), 0);
        assert_eq!(log.len(), 1);
    }
}
