//! Process-local `RevocationList`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockable::Clock;

use crate::domain::ports::{RevocationList, RevocationListError, revocation_key};

/// Revoked credentials held in a map keyed like the Redis adapter.
///
/// Lapsed entries are pruned on every write.
pub struct InMemoryRevocationList {
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl InMemoryRevocationList {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, DateTime<Utc>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl RevocationList for InMemoryRevocationList {
    async fn is_revoked(&self, token: &str) -> Result<bool, RevocationListError> {
        let now = self.clock.utc();
        Ok(self
            .entries()
            .get(&revocation_key(token))
            .is_some_and(|expires_at| *expires_at > now))
    }

    async fn revoke(&self, token: &str, ttl: Duration) -> Result<(), RevocationListError> {
        let now = self.clock.utc();
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|err| RevocationListError::backend(err.to_string()))?;
        let mut entries = self.entries();
        entries.retain(|_, expires_at| *expires_at > now);
        entries.insert(revocation_key(token), now + ttl);
        Ok(())
    }
}
