//! Solar panel request backend.
//!
//! Hexagonal layout: [`domain`] holds the request lifecycle and its ports,
//! [`outbound`] the PostgreSQL, Redis, JWT and calculation adapters,
//! [`inbound`] the actix-web surface.

pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use domain::TraceId;
pub use middleware::Trace;
