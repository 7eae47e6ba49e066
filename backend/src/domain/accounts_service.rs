//! Account registration and login service.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::domain::ports::{AccountCommand, LoginOutcome, UserRepository};
use crate::domain::{
    Error, Login, LoginCredentials, PasswordHash, Principal, Registration, Role, SessionGate, User,
    UserId,
};

const BAD_CREDENTIALS: &str = "invalid login or password";

/// Account service implementing [`AccountCommand`].
#[derive(Clone)]
pub struct AccountsService<U> {
    users: Arc<U>,
    gate: Arc<SessionGate>,
}

impl<U> AccountsService<U> {
    pub fn new(users: Arc<U>, gate: Arc<SessionGate>) -> Self {
        Self { users, gate }
    }
}

#[async_trait]
impl<U> AccountCommand for AccountsService<U>
where
    U: UserRepository,
{
    async fn register(&self, registration: &Registration) -> Result<User, Error> {
        let user = User::new(UserId::random(), registration.login().clone(), Role::User);
        let hash = PasswordHash::derive(registration.password());
        self.users
            .insert(&user, &hash)
            .await
            .map_err(Error::from)?;
        info!(user_id = %user.id(), "account registered");
        Ok(user)
    }

    async fn login(&self, credentials: &LoginCredentials) -> Result<LoginOutcome, Error> {
        let Ok(login) = Login::new(credentials.login()) else {
            return Err(Error::unauthorized(BAD_CREDENTIALS));
        };
        let stored = self
            .users
            .find_by_login(&login)
            .await
            .map_err(Error::from)?
            .ok_or_else(|| Error::unauthorized(BAD_CREDENTIALS))?;
        if !stored.password_hash.verify(credentials.password()) {
            return Err(Error::unauthorized(BAD_CREDENTIALS));
        }

        let user = stored.user;
        let token = self.gate.issue(Principal::new(user.id(), user.role()))?;
        Ok(LoginOutcome { user, token })
    }

    async fn logout(&self, token: &str) -> Result<(), Error> {
        self.gate.revoke(token).await
    }
}

#[cfg(test)]
#[path = "accounts_service_tests.rs"]
mod tests;
