//! Calculation dispatcher double that records jobs.
//!
//! Every dispatch yields to the executor once before answering, standing in
//! for the network round trip so concurrent handlers interleave around it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use crate::domain::ports::{CalculationDispatchError, CalculationDispatcher, CalculationJob};

/// Records dispatched jobs; can be switched to fail every call.
#[derive(Default)]
pub struct RecordingDispatcher {
    jobs: Mutex<Vec<CalculationJob>>,
    failing: AtomicBool,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent dispatches fail with a transport error.
    pub fn fail_with_transport_error(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn jobs(&self) -> Vec<CalculationJob> {
        self.jobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl CalculationDispatcher for RecordingDispatcher {
    async fn dispatch(&self, job: &CalculationJob) -> Result<(), CalculationDispatchError> {
        tokio::task::yield_now().await;
        if self.failing.load(Ordering::SeqCst) {
            return Err(CalculationDispatchError::transport("connection refused"));
        }
        self.jobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(job.clone());
        Ok(())
    }
}
