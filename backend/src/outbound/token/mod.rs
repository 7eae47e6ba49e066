//! Session token codecs.

mod jwt_session_tokens;

pub use jwt_session_tokens::{JwtSessionTokens, MIN_SECRET_LENGTH};
