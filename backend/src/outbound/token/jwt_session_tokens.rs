//! HS256 JSON Web Token codec for session tokens.
//!
//! Only the signature is checked here; expiry is judged by the session gate
//! so that tests can drive it with an injected clock.

use std::fmt;

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::domain::ports::{SessionTokenError, SessionTokens};
use crate::domain::{Role, TokenClaims, UserId};

/// Shortest accepted signing secret, in bytes.
pub const MIN_SECRET_LENGTH: usize = 32;

#[derive(Debug, Serialize, Deserialize)]
struct WireClaims {
    sub: String,
    role: String,
    iat: i64,
    exp: i64,
}

impl From<&TokenClaims> for WireClaims {
    fn from(claims: &TokenClaims) -> Self {
        Self {
            sub: claims.subject.to_string(),
            role: claims.role.as_str().to_owned(),
            iat: claims.issued_at.timestamp(),
            exp: claims.expires_at.timestamp(),
        }
    }
}

impl TryFrom<WireClaims> for TokenClaims {
    type Error = SessionTokenError;

    fn try_from(wire: WireClaims) -> Result<Self, Self::Error> {
        let subject = UserId::new(&wire.sub)
            .map_err(|_| SessionTokenError::invalid("subject is not a user id"))?;
        let role = wire
            .role
            .parse::<Role>()
            .map_err(|_| SessionTokenError::invalid("unknown role"))?;
        Ok(Self {
            subject,
            role,
            issued_at: timestamp(wire.iat)?,
            expires_at: timestamp(wire.exp)?,
        })
    }
}

fn timestamp(seconds: i64) -> Result<DateTime<Utc>, SessionTokenError> {
    DateTime::from_timestamp(seconds, 0)
        .ok_or_else(|| SessionTokenError::invalid("timestamp out of range"))
}

/// Signs and verifies session tokens with a shared HMAC secret.
pub struct JwtSessionTokens {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl fmt::Debug for JwtSessionTokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtSessionTokens").finish_non_exhaustive()
    }
}

impl JwtSessionTokens {
    /// Build a codec from `secret`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionTokenError::Signing`] when the secret is shorter than
    /// [`MIN_SECRET_LENGTH`] bytes.
    ///
    /// # Examples
    /// ```
    /// use solar_backend::outbound::token::JwtSessionTokens;
    ///
    /// assert!(JwtSessionTokens::new(b"short").is_err());
    /// assert!(JwtSessionTokens::new(&[7_u8; 32]).is_ok());
    /// ```
    pub fn new(secret: &[u8]) -> Result<Self, SessionTokenError> {
        if secret.len() < MIN_SECRET_LENGTH {
            return Err(SessionTokenError::signing(format!(
                "secret must be at least {MIN_SECRET_LENGTH} bytes"
            )));
        }
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp", "sub"]);
        Ok(Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
        })
    }
}

impl SessionTokens for JwtSessionTokens {
    fn encode(&self, claims: &TokenClaims) -> Result<String, SessionTokenError> {
        jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &WireClaims::from(claims),
            &self.encoding,
        )
        .map_err(|err| SessionTokenError::signing(err.to_string()))
    }

    fn decode(&self, token: &str) -> Result<TokenClaims, SessionTokenError> {
        let data = jsonwebtoken::decode::<WireClaims>(token, &self.decoding, &self.validation)
            .map_err(|err| SessionTokenError::invalid(err.to_string()))?;
        TokenClaims::try_from(data.claims)
    }
}
