//! Progress reporting and cooperative cancellation shared by both passes.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::SimError;

/// Receives `(current, total, label)` progress updates.
///
/// Called synchronously on the simulation thread. Implemented for every
/// `FnMut(usize, usize, &str)` closure.
pub trait ProgressSink {
    fn report(&mut self, current: usize, total: usize, label: &str);
}

impl<F> ProgressSink for F
where
    F: FnMut(usize, usize, &str),
{
    fn report(&mut self, current: usize, total: usize, label: &str) {
        self(current, total, label);
    }
}

/// Sink that drops every update.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&mut self, _current: usize, _total: usize, _label: &str) {}
}

/// Cancellation flag the caller may set from any thread.
///
/// The engine only looks at it between days (and between reporting periods),
/// never in the middle of one.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Progress position and cancellation check for one run.
///
/// The simulation manager and post-processor each [`extend`](Self::extend)
/// the total by their own number of steps, so the post-processor continues
/// the range where the simulation left off. Both `current` and `total` only
/// ever grow.
pub struct RunControl<'a> {
    sink: &'a mut dyn ProgressSink,
    cancel: Option<&'a CancelToken>,
    current: usize,
    total: usize,
}

impl<'a> RunControl<'a> {
    pub fn new(sink: &'a mut dyn ProgressSink) -> Self {
        Self {
            sink,
            cancel: None,
            current: 0,
            total: 0,
        }
    }

    /// Attaches a cancellation token checked at every step boundary.
    pub fn with_cancel(mut self, token: &'a CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Adds `steps` to the total and reports the new range.
    pub fn extend(&mut self, steps: usize, label: &str) {
        self.total += steps;
        self.sink.report(self.current, self.total, label);
    }

    /// Marks one step done, reports it, then checks for cancellation.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Cancelled`] when the token has been set.
    pub fn step(&mut self, label: &str) -> Result<(), SimError> {
        self.current = (self.current + 1).min(self.total);
        self.sink.report(self.current, self.total, label);
        self.check_cancelled()
    }

    /// Fails when cancellation was requested, without advancing.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Cancelled`] when the token has been set.
    pub fn check_cancelled(&self) -> Result<(), SimError> {
        if self.cancel.is_some_and(CancelToken::is_cancelled) {
            return Err(SimError::Cancelled {
                completed: self.current,
                total: self.total,
            });
        }
        Ok(())
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn total(&self) -> usize {
        self.total
    }
}
