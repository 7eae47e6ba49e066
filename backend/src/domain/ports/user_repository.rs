//! Port abstraction for user persistence adapters and their errors.
use async_trait::async_trait;

use crate::domain::{Login, PasswordHash, User, UserId};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by user repository adapters.
    pub enum UserPersistenceError {
        /// Another account already uses the login.
        DuplicateLogin { login: String } => Conflict, "login {login} is already registered",
        /// Repository connection could not be established.
        Connection { message: String } =>
            InternalError, "user repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => InternalError, "user repository query failed: {message}",
    }
}

/// User record paired with its stored password digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCredentials {
    pub user: User,
    pub password_hash: PasswordHash,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new account.
    async fn insert(
        &self,
        user: &User,
        password_hash: &PasswordHash,
    ) -> Result<(), UserPersistenceError>;

    /// Fetch credentials by login.
    async fn find_by_login(
        &self,
        login: &Login,
    ) -> Result<Option<StoredCredentials>, UserPersistenceError>;

    /// Fetch a user by identifier.
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, UserPersistenceError>;
}
