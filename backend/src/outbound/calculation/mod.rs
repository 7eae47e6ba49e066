//! Hand-off to the external power calculation service.

mod http_dispatcher;

pub use http_dispatcher::{HttpCalculationDispatcher, HttpDispatcherError};
