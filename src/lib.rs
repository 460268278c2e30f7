//! Tourguide - guided tours that remember where the user left off
//!
//! A [`Sequence`] presents steps one at a time over a [`Host`], skipping steps
//! whose predicate fails or that cannot render. Single-use sequences checkpoint
//! every dismissal in a [`ProgressStore`] so a later run resumes at the next
//! unseen step, and a finished tour never plays again.

pub mod config;
pub mod progress;
pub mod sequence;
pub mod terminal;
pub mod tour;

pub use progress::{FileProgressStore, MemoryProgressStore, ProgressStatus, ProgressStore};
pub use sequence::{Host, Phase, Sequence, SequenceError, Step};
