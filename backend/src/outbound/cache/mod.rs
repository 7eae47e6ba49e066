//! Revocation list adapters.
//!
//! - [`RedisRevocationList`] stores entries in Redis with a native TTL and is
//!   what the server uses in production.
//! - [`InMemoryRevocationList`] keeps entries in process, expiring them
//!   against an injected clock. It backs single-node deployments without
//!   Redis and the test harness.

mod in_memory_revocation_list;
mod redis_revocation_list;

pub use in_memory_revocation_list::InMemoryRevocationList;
pub use redis_revocation_list::{RedisRevocationList, RedisRevocationListError};
