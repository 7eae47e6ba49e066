//! Port for encoding and decoding signed session tokens.
//!
//! The codec checks signatures only. Expiry is judged by the session gate
//! against its injected clock.

use crate::domain::TokenClaims;

use super::define_port_error;

define_port_error! {
    /// Errors raised by token codecs.
    pub enum SessionTokenError {
        /// Token is malformed, tampered with or signed by another key.
        Invalid { message: String } => Unauthorized, "session token rejected: {message}",
        /// Token could not be signed.
        Signing { message: String } => InternalError, "session token signing failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
pub trait SessionTokens: Send + Sync {
    /// Sign `claims` into a bearer token.
    fn encode(&self, claims: &TokenClaims) -> Result<String, SessionTokenError>;

    /// Verify the signature of `token` and return its claims.
    fn decode(&self, token: &str) -> Result<TokenClaims, SessionTokenError>;
}
