//! PostgreSQL-backed `UserRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{StoredCredentials, UserPersistenceError, UserRepository};
use crate::domain::{Login, PasswordHash, User, UserId};

use super::diesel_error_mapping::{StoreFailure, classify};
use super::models::{NewUserRow, UserRow};
use super::pool::{DbPool, PoolError};
use super::schema::users;

/// Diesel-backed implementation of the user repository port.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> UserPersistenceError {
    UserPersistenceError::connection(error.into_message())
}

fn map_diesel_error(error: diesel::result::Error, login: Option<&str>) -> UserPersistenceError {
    match (classify(&error), login) {
        (StoreFailure::UniqueViolation, Some(login)) => {
            UserPersistenceError::duplicate_login(login)
        }
        (StoreFailure::UniqueViolation, None) => {
            UserPersistenceError::query("unique constraint violated")
        }
        (StoreFailure::Connection(message), _) => UserPersistenceError::connection(message),
        (StoreFailure::Query(message), _) => UserPersistenceError::query(message),
    }
}

fn decode(row: UserRow) -> Result<(User, PasswordHash), UserPersistenceError> {
    row.into_user()
        .map_err(|err| UserPersistenceError::query(format!("stored user is invalid: {err}")))
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn insert(
        &self,
        user: &User,
        password_hash: &PasswordHash,
    ) -> Result<(), UserPersistenceError> {
        let login = user.login().as_ref();
        let row = NewUserRow {
            id: *user.id().as_uuid(),
            login,
            password_hash: password_hash.as_str(),
            role: user.role().as_str(),
        };
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(users::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map_err(|err| map_diesel_error(err, Some(login)))?;
        Ok(())
    }

    async fn find_by_login(
        &self,
        login: &Login,
    ) -> Result<Option<StoredCredentials>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = users::table
            .filter(users::login.eq(login.as_ref()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|err| map_diesel_error(err, None))?;
        row.map(decode)
            .transpose()
            .map(|found| {
                found.map(|(user, password_hash)| StoredCredentials {
                    user,
                    password_hash,
                })
            })
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = users::table
            .filter(users::id.eq(id.as_uuid()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|err| map_diesel_error(err, None))?;
        row.map(decode)
            .transpose()
            .map(|found| found.map(|(user, _)| user))
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn not_found_maps_to_query_error() {
        let err = map_diesel_error(diesel::result::Error::NotFound, Some("ada"));
        assert!(matches!(err, UserPersistenceError::Query { .. }));
    }

    #[rstest]
    fn stored_row_with_unknown_role_is_rejected() {
        let row = UserRow {
            id: uuid::Uuid::new_v4(),
            login: "ada".to_owned(),
            password_hash: "00$00".to_owned(),
            role: "admin".to_owned(),
        };
        assert!(matches!(decode(row), Err(UserPersistenceError::Query { .. })));
    }

    #[rstest]
    fn stored_row_decodes_into_user() {
        let row = UserRow {
            id: uuid::Uuid::new_v4(),
            login: "mod".to_owned(),
            password_hash: "00$00".to_owned(),
            role: "moderator".to_owned(),
        };
        let (user, hash) = decode(row).expect("valid row");
        assert!(user.role().is_moderator());
        assert_eq!(hash.as_str(), "00$00");
    }
}
