//! In-memory progress store.
//!
//! Clones share the same records, so a "restart" can be simulated by building a
//! new sequence over a clone of the store.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use super::{apply_status, ProgressError, ProgressRecord, ProgressStatus, ProgressStore};

#[derive(Debug, Clone, Default)]
pub struct MemoryProgressStore {
    records: Rc<RefCell<BTreeMap<String, ProgressRecord>>>,
}

impl MemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of identities with a record
    pub fn len(&self) -> usize {
        self.records.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.borrow().is_empty()
    }
}

impl ProgressStore for MemoryProgressStore {
    fn read(&self, identity: &str) -> Result<ProgressStatus, ProgressError> {
        Ok(self
            .records
            .borrow()
            .get(identity)
            .map(|r| r.status)
            .unwrap_or_default())
    }

    fn write(&mut self, identity: &str, completed: u32) -> Result<(), ProgressError> {
        apply_status(
            &mut self.records.borrow_mut(),
            identity,
            ProgressStatus::InProgress(completed),
        );
        Ok(())
    }

    fn write_finished(&mut self, identity: &str) -> Result<(), ProgressError> {
        apply_status(
            &mut self.records.borrow_mut(),
            identity,
            ProgressStatus::Finished,
        );
        Ok(())
    }

    fn reset(&mut self, identity: &str) -> Result<(), ProgressError> {
        self.records.borrow_mut().remove(identity);
        Ok(())
    }

    fn reset_all(&mut self) -> Result<(), ProgressError> {
        self.records.borrow_mut().clear();
        Ok(())
    }

    fn records(&self) -> Result<Vec<(String, ProgressRecord)>, ProgressError> {
        Ok(self
            .records
            .borrow()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}
