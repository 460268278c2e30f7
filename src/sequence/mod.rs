//! Guided tour sequencing: show steps one at a time, remember how far the user
//! got, and never replay a finished single-use tour.

pub mod controller;
pub mod step;

pub use controller::{Phase, Sequence};
pub use step::{always_show, Host, Predicate, Step};

use thiserror::Error;

use crate::progress::ProgressError;


#[derive(Debug, Error)]
pub enum SequenceError {
    #[error("sequence has no durable identity; call single_use() first")]
    NotSingleUse,

    #[error("progress store failure for sequence '{identity}': {source}")]
    Progress {
        identity: String,
        #[source]
        source: ProgressError,
    },
}
