//! Authentication primitives: credentials, password digests, session claims.
//!
//! Inbound payloads are validated here before a handler talks to a port, so
//! services only ever see well-formed credentials.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use super::{Login, Role, UserId, UserValidationError};

/// Minimum password length accepted at registration.
pub const MIN_PASSWORD_LENGTH: usize = 8;

const SALT_LEN: usize = 16;

/// Domain error returned when login payload values are invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginValidationError {
    /// Login was missing or blank once trimmed.
    EmptyLogin,
    /// Password was blank.
    EmptyPassword,
}

impl fmt::Display for LoginValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyLogin => write!(f, "login must not be empty"),
            Self::EmptyPassword => write!(f, "password must not be empty"),
        }
    }
}

impl std::error::Error for LoginValidationError {}

/// Validated login credentials used by the account service.
///
/// ## Invariants
/// - `login` is trimmed and non-empty.
/// - `password` is non-empty; whitespace is preserved.
///
/// # Examples
/// ```
/// use solar_backend::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts("ada", "password").unwrap();
/// assert_eq!(creds.login(), "ada");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    login: String,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Construct credentials from raw login/password inputs.
    pub fn try_from_parts(login: &str, password: &str) -> Result<Self, LoginValidationError> {
        let normalized = login.trim();
        if normalized.is_empty() {
            return Err(LoginValidationError::EmptyLogin);
        }
        if password.is_empty() {
            return Err(LoginValidationError::EmptyPassword);
        }
        Ok(Self {
            login: normalized.to_owned(),
            password: Zeroizing::new(password.to_owned()),
        })
    }

    pub fn login(&self) -> &str {
        self.login.as_str()
    }

    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

/// Validation failures for new account requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationValidationError {
    Login(UserValidationError),
    PasswordTooShort { min: usize },
}

impl fmt::Display for RegistrationValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Login(err) => err.fmt(f),
            Self::PasswordTooShort { min } => {
                write!(f, "password must be at least {min} characters")
            }
        }
    }
}

impl std::error::Error for RegistrationValidationError {}

/// Validated registration request.
#[derive(Debug, Clone)]
pub struct Registration {
    login: Login,
    password: Zeroizing<String>,
}

impl Registration {
    pub fn try_from_parts(login: &str, password: &str) -> Result<Self, RegistrationValidationError> {
        let login = Login::new(login).map_err(RegistrationValidationError::Login)?;
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(RegistrationValidationError::PasswordTooShort {
                min: MIN_PASSWORD_LENGTH,
            });
        }
        Ok(Self {
            login,
            password: Zeroizing::new(password.to_owned()),
        })
    }

    pub fn login(&self) -> &Login {
        &self.login
    }

    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

/// Salted SHA-256 password digest stored as `salt_hex$digest_hex`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Digest `password` with a fresh random salt.
    pub fn derive(password: &str) -> Self {
        let salt: [u8; SALT_LEN] = rand::random();
        Self::with_salt(&salt, password)
    }

    /// Digest `password` with the supplied salt.
    pub fn with_salt(salt: &[u8], password: &str) -> Self {
        let digest = salted_digest(salt, password);
        Self(format!("{}${}", hex::encode(salt), hex::encode(digest)))
    }

    /// Wrap a digest loaded from storage.
    pub fn from_stored(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Check `password` against this digest without early exit on mismatch.
    pub fn verify(&self, password: &str) -> bool {
        let Some((salt_hex, digest_hex)) = self.0.split_once('$') else {
            return false;
        };
        let (Ok(salt), Ok(expected)) = (hex::decode(salt_hex), hex::decode(digest_hex)) else {
            return false;
        };
        let actual = salted_digest(&salt, password);
        if actual.len() != expected.len() {
            return false;
        }
        actual
            .iter()
            .zip(expected.iter())
            .fold(0_u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }
}

fn salted_digest(salt: &[u8], password: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hasher.finalize().to_vec()
}

/// Authenticated caller resolved by the session gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    user_id: UserId,
    role: Role,
}

impl Principal {
    pub const fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }

    pub const fn user_id(&self) -> UserId {
        self.user_id
    }

    pub const fn role(&self) -> Role {
        self.role
    }

    pub const fn is_moderator(&self) -> bool {
        self.role.is_moderator()
    }
}

/// Claims carried by a session token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenClaims {
    pub subject: UserId,
    pub role: Role,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl TokenClaims {
    pub const fn principal(&self) -> Principal {
        Principal::new(self.subject, self.role)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Lifetime left at `now`; `None` once expired.
    pub fn remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        (self.expires_at - now)
            .to_std()
            .ok()
            .filter(|left| !left.is_zero())
    }
}

/// Token minted at login together with its claims.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: Zeroizing<String>,
    pub claims: TokenClaims,
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    #[rstest]
    #[case("", "pw", LoginValidationError::EmptyLogin)]
    #[case("   ", "pw", LoginValidationError::EmptyLogin)]
    #[case("ada", "", LoginValidationError::EmptyPassword)]
    fn invalid_credentials(
        #[case] login: &str,
        #[case] password: &str,
        #[case] expected: LoginValidationError,
    ) {
        let err = LoginCredentials::try_from_parts(login, password)
            .expect_err("invalid inputs must fail");
        assert_eq!(err, expected);
    }

    #[rstest]
    #[case("1234567", false)]
    #[case("12345678", true)]
    fn registration_enforces_password_length(#[case] password: &str, #[case] accepted: bool) {
        let result = Registration::try_from_parts("ada", password);
        assert_eq!(result.is_ok(), accepted);
        if let Err(err) = result {
            assert_eq!(
                err,
                RegistrationValidationError::PasswordTooShort {
                    min: MIN_PASSWORD_LENGTH
                }
            );
        }
    }

    #[rstest]
    fn password_hash_verifies_only_the_original_password() {
        let hash = PasswordHash::derive("correct horse");
        assert!(hash.verify("correct horse"));
        assert!(!hash.verify("correct horse "));
    }

    #[rstest]
    fn password_hash_is_salted() {
        let first = PasswordHash::derive("same password");
        let second = PasswordHash::derive("same password");
        assert_ne!(first, second);
    }

    #[rstest]
    #[case("")]
    #[case("nodollar")]
    #[case("zz$zz")]
    fn malformed_stored_hash_never_verifies(#[case] stored: &str) {
        assert!(!PasswordHash::from_stored(stored).verify("anything"));
    }

    #[rstest]
    fn remaining_lifetime_is_none_after_expiry() {
        let issued_at = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).single().expect("date");
        let claims = TokenClaims {
            subject: UserId::random(),
            role: Role::User,
            issued_at,
            expires_at: issued_at + chrono::Duration::hours(1),
        };

        let halfway = issued_at + chrono::Duration::minutes(30);
        assert_eq!(claims.remaining(halfway), Some(Duration::from_secs(1800)));
        assert!(!claims.is_expired(halfway));

        let after = issued_at + chrono::Duration::hours(2);
        assert_eq!(claims.remaining(after), None);
        assert!(claims.is_expired(after));
    }
}
