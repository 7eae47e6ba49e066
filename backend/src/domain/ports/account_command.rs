//! Driving port for registration and session lifecycle.
//!
//! Inbound adapters call it to create accounts, exchange credentials for a
//! bearer token and revoke that token again, without knowing the backing
//! store or token format.

use async_trait::async_trait;

use crate::domain::{Error, IssuedToken, LoginCredentials, Registration, User};

/// Successful login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: User,
    pub token: IssuedToken,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountCommand: Send + Sync {
    /// Create an account with the `User` role.
    async fn register(&self, registration: &Registration) -> Result<User, Error>;

    /// Exchange credentials for a session token.
    async fn login(&self, credentials: &LoginCredentials) -> Result<LoginOutcome, Error>;

    /// Revoke `token` for the rest of its lifetime.
    async fn logout(&self, token: &str) -> Result<(), Error>;
}
