//! Port for handing completed requests to the external power calculator.
//!
//! Dispatch returns once the calculator accepted the job. The result arrives
//! later through the total-power callback, keyed by the request id.

use async_trait::async_trait;

use crate::domain::{PowerInput, RequestId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by calculation dispatch adapters.
    pub enum CalculationDispatchError {
        /// The calculator could not be reached.
        Transport { message: String } =>
            InternalError, "calculation service unreachable: {message}",
        /// The calculator did not answer in time.
        Timeout { message: String } => InternalError, "calculation service timed out: {message}",
        /// The calculator answered with anything but `200 OK`.
        Rejected { status: u16 } =>
            InternalError, "calculation service rejected the job with status {status}",
    }
}

/// Job payload describing a request's items and insolation.
#[derive(Debug, Clone, PartialEq)]
pub struct CalculationJob {
    pub request_id: RequestId,
    pub insolation: f64,
    pub panels: Vec<PowerInput>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CalculationDispatcher: Send + Sync {
    async fn dispatch(&self, job: &CalculationJob) -> Result<(), CalculationDispatchError>;
}
