//! Session gate: resolves bearer tokens into principals.
//!
//! A token is accepted when its signature verifies, it has not expired
//! according to the injected clock, and it is absent from the revocation
//! list. Logout inserts the token into that list for the rest of its
//! lifetime.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mockable::Clock;
use tracing::{debug, error};
use zeroize::Zeroizing;

use crate::domain::ports::{RevocationList, SessionAuthenticator, SessionTokenError, SessionTokens};
use crate::domain::{Error, IssuedToken, Principal, Role, TokenClaims};

/// Shortest lifetime given to a revocation entry.
pub const MIN_REVOCATION_TTL: Duration = Duration::from_secs(1);

/// Reject `principal` unless its role is one of `allowed`.
pub fn require_role(principal: &Principal, allowed: &[Role]) -> Result<(), Error> {
    if allowed.contains(&principal.role()) {
        Ok(())
    } else {
        Err(Error::forbidden(format!(
            "role {} may not perform this action",
            principal.role()
        )))
    }
}

fn map_token_error(error: SessionTokenError) -> Error {
    match error {
        SessionTokenError::Invalid { message } => {
            debug!(%message, "session token rejected");
            Error::unauthorized("invalid session token")
        }
        SessionTokenError::Signing { message } => {
            error!(%message, "session token signing failed");
            Error::internal(format!("could not issue session token: {message}"))
        }
    }
}

/// Issues, verifies and revokes session tokens.
#[derive(Clone)]
pub struct SessionGate {
    tokens: Arc<dyn SessionTokens>,
    revocations: Arc<dyn RevocationList>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl SessionGate {
    pub fn new(
        tokens: Arc<dyn SessionTokens>,
        revocations: Arc<dyn RevocationList>,
        clock: Arc<dyn Clock>,
        ttl: Duration,
    ) -> Self {
        Self {
            tokens,
            revocations,
            clock,
            ttl,
        }
    }

    /// Mint a token for `principal`, valid for the configured lifetime.
    pub fn issue(&self, principal: Principal) -> Result<IssuedToken, Error> {
        let ttl = chrono::Duration::from_std(self.ttl)
            .map_err(|err| Error::internal(format!("session ttl out of range: {err}")))?;
        let issued_at = self.clock.utc();
        let claims = TokenClaims {
            subject: principal.user_id(),
            role: principal.role(),
            issued_at,
            expires_at: issued_at + ttl,
        };
        let token = self.tokens.encode(&claims).map_err(map_token_error)?;
        Ok(IssuedToken {
            token: Zeroizing::new(token),
            claims,
        })
    }

    /// Verify `token` and return its claims.
    pub async fn verify(&self, token: &str) -> Result<TokenClaims, Error> {
        let claims = self.tokens.decode(token).map_err(map_token_error)?;
        if claims.is_expired(self.clock.utc()) {
            return Err(Error::unauthorized("session expired"));
        }
        if self
            .revocations
            .is_revoked(token)
            .await
            .map_err(Error::from)?
        {
            return Err(Error::unauthorized("session revoked"));
        }
        Ok(claims)
    }

    /// Revoke `token` until it would have expired.
    pub async fn revoke(&self, token: &str) -> Result<(), Error> {
        let claims = self.verify(token).await?;
        let ttl = claims
            .remaining(self.clock.utc())
            .unwrap_or(MIN_REVOCATION_TTL)
            .max(MIN_REVOCATION_TTL);
        self.revocations
            .revoke(token, ttl)
            .await
            .map_err(Error::from)
    }
}

#[async_trait]
impl SessionAuthenticator for SessionGate {
    async fn authenticate(&self, token: &str) -> Result<Principal, Error> {
        self.verify(token).await.map(|claims| claims.principal())
    }
}

#[cfg(test)]
#[path = "session_gate_tests.rs"]
mod tests;
