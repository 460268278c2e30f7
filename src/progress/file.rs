//! JSON file progress store.
//!
//! All identities share one `progress.json` in the state directory. The file is
//! the only copy of the records: every call reads it afresh, and a mutation is
//! merged into what is on disk and written through before the call returns.
//! Several stores may therefore be open on one state directory at once.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::{apply_status, ProgressError, ProgressRecord, ProgressStatus, ProgressStore};

const PROGRESS_FILE: &str = "progress.json";

type Records = BTreeMap<String, ProgressRecord>;

#[derive(Debug, Default, Serialize, Deserialize)]
struct ProgressFile {
    #[serde(default)]
    sequences: Records,
}

#[derive(Debug, Clone)]
pub struct FileProgressStore {
    path: PathBuf,
}

impl FileProgressStore {
    /// Open (or create) the store inside `state_dir`.
    ///
    /// Fails if an existing progress file cannot be parsed.
    pub fn open(state_dir: impl AsRef<Path>) -> Result<Self, ProgressError> {
        let state_dir = state_dir.as_ref();
        fs::create_dir_all(state_dir).map_err(|source| ProgressError::Write {
            path: state_dir.to_path_buf(),
            source,
        })?;

        let store = Self {
            path: state_dir.join(PROGRESS_FILE),
        };
        let records = store.load()?;
        tracing::debug!(path = ?store.path, sequences = records.len(), "opened progress store");
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Records, ProgressError> {
        if !self.path.exists() {
            return Ok(Records::new());
        }
        let contents = fs::read_to_string(&self.path).map_err(|source| ProgressError::Read {
            path: self.path.clone(),
            source,
        })?;
        let file: ProgressFile =
            serde_json::from_str(&contents).map_err(|source| ProgressError::Parse {
                path: self.path.clone(),
                source,
            })?;
        Ok(file.sequences)
    }

    /// Persist via a sibling temp file and rename so a crash never leaves a
    /// half-written record behind.
    fn save(&self, records: Records) -> Result<(), ProgressError> {
        let file = ProgressFile { sequences: records };
        let contents = serde_json::to_string_pretty(&file).map_err(ProgressError::Serialize)?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, contents).map_err(|source| ProgressError::Write {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &self.path).map_err(|source| ProgressError::Write {
            path: self.path.clone(),
            source,
        })
    }

    /// Load, let `change` edit the records, and save if it reports a change
    fn update(&self, change: impl FnOnce(&mut Records) -> bool) -> Result<(), ProgressError> {
        let mut records = self.load()?;
        if change(&mut records) {
            self.save(records)?;
        }
        Ok(())
    }
}

impl ProgressStore for FileProgressStore {
    fn read(&self, identity: &str) -> Result<ProgressStatus, ProgressError> {
        Ok(self
            .load()?
            .get(identity)
            .map(|r| r.status)
            .unwrap_or_default())
    }

    fn write(&mut self, identity: &str, completed: u32) -> Result<(), ProgressError> {
        self.update(|records| {
            apply_status(records, identity, ProgressStatus::InProgress(completed))
        })
    }

    fn write_finished(&mut self, identity: &str) -> Result<(), ProgressError> {
        self.update(|records| apply_status(records, identity, ProgressStatus::Finished))
    }

    fn reset(&mut self, identity: &str) -> Result<(), ProgressError> {
        self.update(|records| records.remove(identity).is_some())
    }

    fn reset_all(&mut self) -> Result<(), ProgressError> {
        self.save(Records::new())
    }

    fn records(&self) -> Result<Vec<(String, ProgressRecord)>, ProgressError> {
        Ok(self.load()?.into_iter().collect())
    }
}
