//! Test utilities for the backend crate.
//!
//! Shared by unit tests (in `src/`) and integration tests (in `tests/`).
//! Compiled for tests and when the `test-support` feature is enabled.

pub mod clock;
pub mod dispatcher;
pub mod harness;
pub mod store;

pub use clock::MutableClock;
pub use dispatcher::RecordingDispatcher;
pub use harness::{Harness, SERVICE_TOKEN};
pub use store::{InMemoryStore, panel};
