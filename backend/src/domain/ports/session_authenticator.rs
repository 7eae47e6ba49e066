//! Driving port resolving bearer tokens into principals.

use async_trait::async_trait;

use crate::domain::{Error, Principal};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionAuthenticator: Send + Sync {
    /// Resolve `token`, failing with `Unauthorized` when it is invalid,
    /// expired or revoked.
    async fn authenticate(&self, token: &str) -> Result<Principal, Error>;
}
