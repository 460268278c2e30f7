//! The sequence controller.
//!
//! Owns a forward-only queue of (step, predicate) entries and presents them one
//! at a time. After `start` the controller is purely reactive: it parks the
//! visible step in a single pending slot and waits for the host to report how
//! that step was detached.

use std::collections::VecDeque;

use super::step::{always_show, Host, Predicate, Step};
use super::SequenceError;
use crate::progress::{ProgressStatus, ProgressStore};

type ItemListener<S> = Box<dyn FnMut(&S, u32)>;

/// Lifecycle of a sequence instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Built, not started
    Idle,
    /// A step is showing, or the queue is being walked
    Presenting,
    /// Queue exhausted or host gone; finished listener has run
    Finished,
    /// The showing step was detached without a dismissal. Nothing more happens
    /// in this instance; a new sequence resumes from the saved position.
    Abandoned,
}

struct QueueEntry<S> {
    step: S,
    predicate: Predicate<S>,
}

/// Identity plus the store its progress lives in
struct DurableBinding {
    identity: String,
    store: Box<dyn ProgressStore>,
}

impl DurableBinding {
    fn read(&self) -> Result<ProgressStatus, SequenceError> {
        self.store
            .read(&self.identity)
            .map_err(|source| self.error(source))
    }

    fn write(&mut self, completed: u32) -> Result<(), SequenceError> {
        let result = self.store.write(&self.identity, completed);
        result.map_err(|source| self.error(source))
    }

    fn write_finished(&mut self) -> Result<(), SequenceError> {
        let result = self.store.write_finished(&self.identity);
        result.map_err(|source| self.error(source))
    }

    fn error(&self, source: crate::progress::ProgressError) -> SequenceError {
        SequenceError::Progress {
            identity: self.identity.clone(),
            source,
        }
    }
}

/// A guided tour over host `H` made of steps `S`
pub struct Sequence<H, S> {
    host: H,
    queue: VecDeque<QueueEntry<S>>,
    durable: Option<DurableBinding>,
    /// Steps dismissed so far over the lifetime of the durable identity
    position: u32,
    skip_rest: bool,
    phase: Phase,
    pending: Option<S>,
    on_item_shown: Option<ItemListener<S>>,
    on_item_dismissed: Option<ItemListener<S>>,
    on_finished: Option<Box<dyn FnMut()>>,
}

impl<H: Host, S: Step<H> + 'static> Sequence<H, S> {
    /// Create a sequence whose progress is not remembered
    pub fn new(host: H) -> Self {
        Self {
            host,
            queue: VecDeque::new(),
            durable: None,
            position: 0,
            skip_rest: false,
            phase: Phase::Idle,
            pending: None,
            on_item_shown: None,
            on_item_dismissed: None,
            on_finished: None,
        }
    }

    /// Create a single-use sequence bound to `identity` in `store`
    pub fn with_identity(
        host: H,
        identity: impl Into<String>,
        store: impl ProgressStore + 'static,
    ) -> Self {
        let mut sequence = Self::new(host);
        sequence.single_use(identity, store);
        sequence
    }

    /// Append a step that is always shown
    pub fn add_step(&mut self, step: S) -> &mut Self {
        self.push(step, Box::new(always_show::<S>))
    }

    /// Append a step shown only when `predicate` holds at presentation time
    pub fn add_step_when(
        &mut self,
        step: S,
        predicate: impl Fn(&S) -> bool + 'static,
    ) -> &mut Self {
        self.push(step, Box::new(predicate))
    }

    fn push(&mut self, step: S, predicate: Predicate<S>) -> &mut Self {
        if self.phase == Phase::Idle {
            self.queue.push_back(QueueEntry { step, predicate });
        } else {
            tracing::warn!(
                identity = self.identity(),
                "step added after start; ignoring"
            );
        }
        self
    }

    /// Track progress durably under `identity` so the sequence resumes where
    /// the user left off and never runs again once finished.
    pub fn single_use(
        &mut self,
        identity: impl Into<String>,
        store: impl ProgressStore + 'static,
    ) -> &mut Self {
        let identity = identity.into();
        if self.phase != Phase::Idle {
            tracing::warn!(identity = %identity, "single_use called after start; ignoring");
            return self;
        }
        self.durable = Some(DurableBinding {
            identity,
            store: Box::new(store),
        });
        self
    }

    pub fn set_on_item_shown(&mut self, listener: impl FnMut(&S, u32) + 'static) {
        self.on_item_shown = Some(Box::new(listener));
    }

    pub fn set_on_item_dismissed(&mut self, listener: impl FnMut(&S, u32) + 'static) {
        self.on_item_dismissed = Some(Box::new(listener));
    }

    pub fn set_on_sequence_finished(&mut self, listener: impl FnMut() + 'static) {
        self.on_finished = Some(Box::new(listener));
    }

    /// Whether the durable record says this sequence already finished
    pub fn has_fired(&self) -> Result<bool, SequenceError> {
        let binding = self.durable.as_ref().ok_or(SequenceError::NotSingleUse)?;
        Ok(binding.read()?.is_finished())
    }

    /// Begin presenting, resuming from the saved position for single-use
    /// sequences. A finished single-use sequence does nothing at all.
    pub fn start(&mut self) -> Result<(), SequenceError> {
        if self.phase != Phase::Idle {
            tracing::warn!(
                identity = self.identity(),
                phase = ?self.phase,
                "sequence already started"
            );
            return Ok(());
        }

        if let Some(binding) = &self.durable {
            match binding.read()? {
                ProgressStatus::Finished => {
                    tracing::debug!(identity = %binding.identity, "sequence already fired");
                    self.phase = Phase::Finished;
                    return Ok(());
                }
                ProgressStatus::InProgress(completed) => {
                    let discard = (completed as usize).min(self.queue.len());
                    self.queue.drain(..discard);
                    self.position = completed;
                    if completed > 0 {
                        tracing::info!(
                            identity = %binding.identity,
                            position = completed,
                            "resuming sequence"
                        );
                    }
                }
            }
        }

        tracing::info!(
            identity = self.identity(),
            steps = self.queue.len(),
            "starting sequence"
        );
        self.phase = Phase::Presenting;
        self.advance()
    }

    /// Show the next presentable entry, or finish.
    fn advance(&mut self) -> Result<(), SequenceError> {
        loop {
            if self.host.is_finishing() {
                tracing::debug!(identity = self.identity(), "host finishing");
                return self.finish();
            }
            let Some(QueueEntry { mut step, predicate }) = self.queue.pop_front() else {
                return self.finish();
            };

            if self.skip_rest {
                step.set_fired();
                continue;
            }

            step.set_detach_observed(true);
            if predicate(&step) && step.show(&mut self.host) {
                if let Some(listener) = self.on_item_shown.as_mut() {
                    listener(&step, self.position);
                }
                self.pending = Some(step);
                return Ok(());
            }

            step.set_detach_observed(false);
            tracing::debug!(
                identity = self.identity(),
                remaining = self.queue.len(),
                "step bypassed"
            );
        }
    }

    fn finish(&mut self) -> Result<(), SequenceError> {
        if self.phase == Phase::Finished {
            return Ok(());
        }
        self.phase = Phase::Finished;

        if let Some(binding) = self.durable.as_mut() {
            binding.write_finished()?;
        }
        tracing::info!(identity = self.identity(), "sequence finished");

        if let Some(listener) = self.on_finished.as_mut() {
            listener();
        }
        Ok(())
    }

    /// Report that the showing step is no longer displayed.
    ///
    /// `dismissed` is true only when the user closed the step; any other
    /// detach halts the sequence at its current position.
    pub fn on_detach(&mut self, dismissed: bool) -> Result<(), SequenceError> {
        let Some(mut step) = self.pending.take() else {
            tracing::debug!(identity = self.identity(), "detach with no step showing");
            return Ok(());
        };
        step.set_detach_observed(false);

        if !dismissed {
            self.phase = Phase::Abandoned;
            tracing::info!(
                identity = self.identity(),
                position = self.position,
                "step detached without dismissal; sequence halted"
            );
            return Ok(());
        }

        if let Some(listener) = self.on_item_dismissed.as_mut() {
            listener(&step, self.position);
        }

        if let Some(binding) = self.durable.as_mut() {
            let next = self.position + 1;
            if let Err(err) = binding.write(next) {
                self.phase = Phase::Abandoned;
                return Err(err);
            }
            self.position = next;
        }

        self.skip_rest = step.is_skipped();
        if self.skip_rest {
            tracing::info!(
                identity = self.identity(),
                remaining = self.queue.len(),
                "skipping remaining steps"
            );
        }
        self.advance()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_presenting(&self) -> bool {
        self.pending.is_some()
    }

    pub fn position(&self) -> u32 {
        self.position
    }

    /// Entries still queued behind the showing step
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }

    pub fn identity(&self) -> Option<&str> {
        self.durable.as_ref().map(|b| b.identity.as_str())
    }

    pub fn pending_step(&self) -> Option<&S> {
        self.pending.as_ref()
    }

    /// The showing step, for routing user input to it before `on_detach`
    pub fn pending_step_mut(&mut self) -> Option<&mut S> {
        self.pending.as_mut()
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }
}
