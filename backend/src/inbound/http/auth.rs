//! Bearer-token extractors.
//!
//! [`Authenticated`] rejects the request with 401 before the handler runs
//! when the token is absent, malformed, expired or revoked.
//! [`MaybeAuthenticated`] never rejects; any failure degrades to anonymous.

use actix_web::dev::Payload;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{FromRequest, HttpRequest, web};
use futures_util::future::LocalBoxFuture;
use tracing::debug;

use crate::domain::{Error, Principal};

use super::state::HttpState;

const BEARER_PREFIX: &str = "Bearer ";

/// Extract the token from an `Authorization: Bearer …` header.
pub(crate) fn bearer_token(req: &HttpRequest) -> Option<String> {
    let value = req.headers().get(AUTHORIZATION)?.to_str().ok()?;
    let token = value
        .get(..BEARER_PREFIX.len())
        .filter(|prefix| prefix.eq_ignore_ascii_case(BEARER_PREFIX))
        .and_then(|_| value.get(BEARER_PREFIX.len()..))?
        .trim();
    (!token.is_empty()).then(|| token.to_owned())
}

fn http_state(req: &HttpRequest) -> Result<web::Data<HttpState>, Error> {
    req.app_data::<web::Data<HttpState>>()
        .cloned()
        .ok_or_else(|| Error::internal("HTTP state is not configured"))
}

/// Caller resolved from a valid bearer token.
#[derive(Debug, Clone)]
pub struct Authenticated {
    pub principal: Principal,
    pub token: String,
}

impl FromRequest for Authenticated {
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let token = bearer_token(req);
        let state = http_state(req);
        Box::pin(async move {
            let token = token.ok_or_else(|| Error::unauthorized("missing bearer token"))?;
            let principal = state?.sessions.authenticate(&token).await?;
            Ok(Self { principal, token })
        })
    }
}

/// Caller resolved when possible, anonymous otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaybeAuthenticated(pub Option<Principal>);

impl FromRequest for MaybeAuthenticated {
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let token = bearer_token(req);
        let state = http_state(req);
        Box::pin(async move {
            let Some(token) = token else {
                return Ok(Self(None));
            };
            match state?.sessions.authenticate(&token).await {
                Ok(principal) => Ok(Self(Some(principal))),
                Err(err) => {
                    debug!(code = ?err.code(), "optional session ignored");
                    Ok(Self(None))
                }
            }
        })
    }
}
