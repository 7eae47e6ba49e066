//! Redis-backed `RevocationList`.

use std::time::Duration;

use async_trait::async_trait;
use bb8_redis::RedisConnectionManager;
use bb8_redis::bb8::Pool;
use bb8_redis::redis::AsyncCommands;
use tracing::debug;

use crate::domain::ports::{RevocationList, RevocationListError, revocation_key};

/// Failures while building the Redis pool.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("failed to connect to redis: {message}")]
pub struct RedisRevocationListError {
    message: String,
}

/// Revoked credentials stored as `revoked:<sha256>` keys with `SET … EX`.
#[derive(Clone)]
pub struct RedisRevocationList {
    pool: Pool<RedisConnectionManager>,
}

impl RedisRevocationList {
    /// Connect a pool of `max_size` connections to `url`.
    ///
    /// # Errors
    ///
    /// Returns [`RedisRevocationListError`] when the URL is malformed or the
    /// server cannot be reached.
    pub async fn connect(url: &str, max_size: u32) -> Result<Self, RedisRevocationListError> {
        let manager = RedisConnectionManager::new(url).map_err(|err| RedisRevocationListError {
            message: err.to_string(),
        })?;
        let pool = Pool::builder()
            .max_size(max_size.max(1))
            .build(manager)
            .await
            .map_err(|err| RedisRevocationListError {
                message: err.to_string(),
            })?;
        Ok(Self { pool })
    }
}

fn backend_error(error: impl std::fmt::Display) -> RevocationListError {
    RevocationListError::backend(error.to_string())
}

/// Redis rejects `EX 0`; shorter lifetimes round up to one second.
fn ttl_seconds(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}

#[async_trait]
impl RevocationList for RedisRevocationList {
    async fn is_revoked(&self, token: &str) -> Result<bool, RevocationListError> {
        let mut conn = self.pool.get().await.map_err(backend_error)?;
        let found: bool = conn
            .exists(revocation_key(token))
            .await
            .map_err(backend_error)?;
        Ok(found)
    }

    async fn revoke(&self, token: &str, ttl: Duration) -> Result<(), RevocationListError> {
        let key = revocation_key(token);
        let seconds = ttl_seconds(ttl);
        let mut conn = self.pool.get().await.map_err(backend_error)?;
        let () = conn
            .set_ex(&key, 1_u8, seconds)
            .await
            .map_err(backend_error)?;
        debug!(ttl_seconds = seconds, "credential revoked");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Duration::from_millis(10), 1)]
    #[case(Duration::from_secs(1), 1)]
    #[case(Duration::from_secs(3000), 3000)]
    fn ttl_never_drops_below_one_second(#[case] ttl: Duration, #[case] expected: u64) {
        assert_eq!(ttl_seconds(ttl), expected);
    }

    #[tokio::test]
    async fn malformed_url_is_rejected() {
        let result = RedisRevocationList::connect("not a url", 1).await;
        assert!(result.is_err());
    }
}
