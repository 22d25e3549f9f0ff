//! One pipeline run per user action.
//!
//! The gate refuses a second submission while one is in flight and drops
//! results that finish after the view that requested them was torn down.

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use tracing::debug;

use crate::domain::error::{AppError, Result};

#[derive(Default)]
pub struct SubmissionGate {
    in_flight: AtomicBool,
    epoch: AtomicU64,
}

/// Clears the in-flight flag however the run ends, including cancellation
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl SubmissionGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Run `task` if nothing else is in flight. `Ok(None)` means the view
    /// was torn down while the task ran and the result was discarded.
    pub async fn run<F, T>(&self, task: F) -> Result<Option<T>>
    where
        F: Future<Output = Result<T>>,
    {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(AppError::Busy);
        }
        let _guard = InFlight(&self.in_flight);

        let started_in = self.epoch.load(Ordering::Acquire);
        let result = task.await;

        if self.epoch.load(Ordering::Acquire) != started_in {
            debug!("View torn down during submission, discarding result");
            return Ok(None);
        }
        result.map(Some)
    }

    /// Invalidate whatever is currently in flight
    pub fn teardown(&self) {
        self.epoch.fetch_add(1, Ordering::AcqRel);
    }
}
