//! Durable progress records for single-use sequences.
//!
//! A record is keyed by the sequence identity and holds either the number of
//! steps dismissed so far or the terminal "finished" marker. Records only move
//! forward: a lower count never replaces a higher one, and nothing replaces the
//! terminal marker short of an explicit reset.

pub mod file;
pub mod memory;

pub use file::FileProgressStore;
pub use memory::MemoryProgressStore;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;

/// Persisted integer value meaning "never show this sequence again"
pub const FINISHED_MARKER: i64 = -1;

/// Errors raised by a progress store
#[derive(Debug, Error)]
pub enum ProgressError {
    #[error("failed to read progress file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write progress file {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse progress file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize progress: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("invalid progress status {0} (expected a count or {FINISHED_MARKER})")]
    InvalidStatus(i64),
}

/// How far a sequence has progressed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressStatus {
    /// Number of steps dismissed so far (0 = never started)
    InProgress(u32),
    /// Sequence completed; it must not be shown again
    Finished,
}

impl ProgressStatus {
    pub fn is_finished(self) -> bool {
        matches!(self, ProgressStatus::Finished)
    }

    /// Completed step count, or `None` once finished
    pub fn completed(self) -> Option<u32> {
        match self {
            ProgressStatus::InProgress(n) => Some(n),
            ProgressStatus::Finished => None,
        }
    }

    /// Integer form used in persisted records
    pub fn as_raw(self) -> i64 {
        match self {
            ProgressStatus::InProgress(n) => i64::from(n),
            ProgressStatus::Finished => FINISHED_MARKER,
        }
    }

    pub fn from_raw(raw: i64) -> Result<Self, ProgressError> {
        if raw == FINISHED_MARKER {
            return Ok(ProgressStatus::Finished);
        }
        u32::try_from(raw)
            .map(ProgressStatus::InProgress)
            .map_err(|_| ProgressError::InvalidStatus(raw))
    }

    /// Status after applying `next` on top of `self`.
    ///
    /// Keeps records monotonic: counts only grow and `Finished` is sticky.
    pub fn merge(self, next: ProgressStatus) -> ProgressStatus {
        match (self, next) {
            (ProgressStatus::Finished, _) | (_, ProgressStatus::Finished) => {
                ProgressStatus::Finished
            }
            (ProgressStatus::InProgress(a), ProgressStatus::InProgress(b)) => {
                ProgressStatus::InProgress(a.max(b))
            }
        }
    }
}

impl Default for ProgressStatus {
    fn default() -> Self {
        ProgressStatus::InProgress(0)
    }
}

impl std::fmt::Display for ProgressStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProgressStatus::InProgress(0) => write!(f, "not started"),
            ProgressStatus::InProgress(n) => write!(f, "{n} step(s) dismissed"),
            ProgressStatus::Finished => write!(f, "finished"),
        }
    }
}

impl Serialize for ProgressStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.as_raw())
    }
}

impl<'de> Deserialize<'de> for ProgressStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = i64::deserialize(deserializer)?;
        ProgressStatus::from_raw(raw).map_err(serde::de::Error::custom)
    }
}

/// One persisted record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub status: ProgressStatus,
    pub updated_at: DateTime<Utc>,
}

impl ProgressRecord {
    pub fn new(status: ProgressStatus) -> Self {
        Self {
            status,
            updated_at: Utc::now(),
        }
    }
}

/// Durable key-value store of sequence progress.
///
/// Single writer per identity; last write wins subject to [`ProgressStatus::merge`].
pub trait ProgressStore {
    /// Current status; an unknown identity reads as `InProgress(0)`
    fn read(&self, identity: &str) -> Result<ProgressStatus, ProgressError>;

    /// Record that `completed` steps have been dismissed
    fn write(&mut self, identity: &str, completed: u32) -> Result<(), ProgressError>;

    /// Record the terminal marker
    fn write_finished(&mut self, identity: &str) -> Result<(), ProgressError>;

    /// Forget the record for `identity` so the sequence runs again from scratch
    fn reset(&mut self, identity: &str) -> Result<(), ProgressError>;

    /// Forget every record
    fn reset_all(&mut self) -> Result<(), ProgressError>;

    /// All records, ordered by identity
    fn records(&self) -> Result<Vec<(String, ProgressRecord)>, ProgressError>;

    fn is_finished(&self, identity: &str) -> Result<bool, ProgressError> {
        Ok(self.read(identity)?.is_finished())
    }
}

/// Apply `next` to the record for `identity`, honouring [`ProgressStatus::merge`].
///
/// Returns whether the stored status changed.
pub(crate) fn apply_status(
    records: &mut BTreeMap<String, ProgressRecord>,
    identity: &str,
    next: ProgressStatus,
) -> bool {
    let current = records
        .get(identity)
        .map(|r| r.status)
        .unwrap_or_default();
    let merged = current.merge(next);
    if merged != next {
        tracing::debug!(
            identity,
            current = %current,
            requested = %next,
            "ignoring progress write that would move backwards"
        );
    }
    if records.contains_key(identity) && merged == current {
        return false;
    }
    records.insert(identity.to_string(), ProgressRecord::new(merged));
    true
}

impl<T: ProgressStore + ?Sized> ProgressStore for Box<T> {
    fn read(&self, identity: &str) -> Result<ProgressStatus, ProgressError> {
        (**self).read(identity)
    }

    fn write(&mut self, identity: &str, completed: u32) -> Result<(), ProgressError> {
        (**self).write(identity, completed)
    }

    fn write_finished(&mut self, identity: &str) -> Result<(), ProgressError> {
        (**self).write_finished(identity)
    }

    fn reset(&mut self, identity: &str) -> Result<(), ProgressError> {
        (**self).reset(identity)
    }

    fn reset_all(&mut self) -> Result<(), ProgressError> {
        (**self).reset_all()
    }

    fn records(&self) -> Result<Vec<(String, ProgressRecord)>, ProgressError> {
        (**self).records()
    }
}
