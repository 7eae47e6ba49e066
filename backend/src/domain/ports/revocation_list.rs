//! Port for the revoked-credential blacklist.
//!
//! Entries live for the remaining lifetime of the credential they block; once
//! the credential would have expired anyway the entry may disappear.

use std::time::Duration;

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use super::define_port_error;

define_port_error! {
    /// Errors raised by revocation list adapters.
    pub enum RevocationListError {
        /// Backend could not be reached.
        Backend { message: String } =>
            InternalError, "revocation list backend unavailable: {message}",
    }
}

/// Storage key for a raw credential.
///
/// The credential itself never leaves the process; adapters key entries by
/// its SHA-256 digest.
///
/// # Examples
/// ```
/// use solar_backend::domain::ports::revocation_key;
///
/// let key = revocation_key("token");
/// assert!(key.starts_with("revoked:"));
/// assert_eq!(key, revocation_key("token"));
/// ```
pub fn revocation_key(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    format!("revoked:{}", hex::encode(digest))
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RevocationList: Send + Sync {
    /// Whether `token` was revoked and the entry has not lapsed.
    async fn is_revoked(&self, token: &str) -> Result<bool, RevocationListError>;

    /// Block `token` for `ttl`.
    async fn revoke(&self, token: &str, ttl: Duration) -> Result<(), RevocationListError>;
}
