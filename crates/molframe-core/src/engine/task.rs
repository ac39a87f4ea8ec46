//! Cooperative execution of long computations.
//!
//! Work is split into bounded chunks. Between chunks the caller-supplied [`RuntimeContext`]
//! receives progress and may ask the computation to stop; a chunk, once started, always runs to
//! completion so no derived data is left half-built.

use super::progress::{Progress, ProgressReporter};
use std::ops::Range;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Marker returned by a context that has been asked to stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cancelled;

/// Result of a cancellable computation. Cancellation is an outcome, not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Completed(T),
    Cancelled,
}

impl<T> Outcome<T> {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Outcome::Cancelled)
    }

    pub fn completed(self) -> Option<T> {
        match self {
            Outcome::Completed(value) => Some(value),
            Outcome::Cancelled => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Completed(value) => Outcome::Completed(f(value)),
            Outcome::Cancelled => Outcome::Cancelled,
        }
    }
}

/// Shared stop flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

pub trait RuntimeContext {
    /// Whether enough time has passed for an informational update to be worth sending.
    fn should_update(&self) -> bool;

    /// Forwards `progress` and reports whether the computation may continue.
    fn update(&self, progress: Progress) -> Result<(), Cancelled>;
}

/// A context that never cancels and discards progress.
#[derive(Debug, Clone, Copy, Default)]
pub struct SynchronousContext;

impl RuntimeContext for SynchronousContext {
    fn should_update(&self) -> bool {
        false
    }

    fn update(&self, _progress: Progress) -> Result<(), Cancelled> {
        Ok(())
    }
}

/// Progress reporter plus cancellation token.
#[derive(Debug)]
pub struct TaskContext<'a> {
    reporter: &'a ProgressReporter<'a>,
    token: CancellationToken,
    update_interval: Duration,
    last_update: Mutex<Instant>,
}

impl<'a> TaskContext<'a> {
    pub fn new(reporter: &'a ProgressReporter<'a>, token: CancellationToken) -> Self {
        Self {
            reporter,
            token,
            update_interval: Duration::from_millis(250),
            last_update: Mutex::new(Instant::now()),
        }
    }

    pub fn with_update_interval(mut self, interval: Duration) -> Self {
        self.update_interval = interval;
        self
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn reporter(&self) -> &ProgressReporter<'a> {
        self.reporter
    }
}

impl RuntimeContext for TaskContext<'_> {
    fn should_update(&self) -> bool {
        match self.last_update.lock() {
            Ok(last) => last.elapsed() >= self.update_interval,
            Err(_) => true,
        }
    }

    fn update(&self, progress: Progress) -> Result<(), Cancelled> {
        self.reporter.report(progress);
        if let Ok(mut last) = self.last_update.lock() {
            *last = Instant::now();
        }
        if self.token.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Runs `step` over `0..total` in chunks of at most `chunk_size`, checking for cancellation
/// before every chunk.
pub fn run_chunked<C, E, F>(
    ctx: &C,
    total: usize,
    chunk_size: usize,
    mut step: F,
) -> Result<Outcome<()>, E>
where
    C: RuntimeContext + ?Sized,
    F: FnMut(Range<usize>) -> Result<(), E>,
{
    let chunk_size = chunk_size.max(1);
    if ctx
        .update(Progress::TaskStart {
            total_steps: total as u64,
        })
        .is_err()
    {
        return Ok(Outcome::Cancelled);
    }

    let mut start = 0;
    while start < total {
        let end = (start + chunk_size).min(total);
        step(start..end)?;
        if ctx
            .update(Progress::TaskIncrement {
                steps: (end - start) as u64,
            })
            .is_err()
            && end < total
        {
            return Ok(Outcome::Cancelled);
        }
        start = end;
    }

    let _ = ctx.update(Progress::TaskFinish);
    Ok(Outcome::Completed(()))
}
