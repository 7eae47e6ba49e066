//! Test helpers for inbound HTTP components.

use std::collections::HashMap;
use std::sync::Arc;

use actix_web::http::header::AUTHORIZATION;

use crate::domain::ports::{
    MockAccountCommand, MockSessionAuthenticator, MockSolarRequestCommand, MockSolarRequestQuery,
};
use crate::domain::{Error, Principal};

use super::state::HttpState;

/// `Authorization` header for `token`.
pub fn bearer(token: &str) -> (actix_web::http::header::HeaderName, String) {
    (AUTHORIZATION, format!("Bearer {token}"))
}

/// Builds an [`HttpState`] over mocked driving ports.
///
/// Tokens registered with [`StateBuilder::with_session`] authenticate as the
/// given principal; every other token is rejected with 401.
#[derive(Default)]
pub struct StateBuilder {
    sessions: HashMap<String, Principal>,
    accounts: MockAccountCommand,
    requests: MockSolarRequestCommand,
    query: MockSolarRequestQuery,
}

impl StateBuilder {
    pub fn with_session(mut self, token: &str, principal: Principal) -> Self {
        self.sessions.insert(token.to_owned(), principal);
        self
    }

    pub fn with_accounts(mut self, accounts: MockAccountCommand) -> Self {
        self.accounts = accounts;
        self
    }

    pub fn with_requests(mut self, requests: MockSolarRequestCommand) -> Self {
        self.requests = requests;
        self
    }

    pub fn with_query(mut self, query: MockSolarRequestQuery) -> Self {
        self.query = query;
        self
    }

    pub fn build(self) -> HttpState {
        let sessions = self.sessions;
        let mut authenticator = MockSessionAuthenticator::new();
        authenticator.expect_authenticate().returning(move |token| {
            sessions
                .get(token)
                .copied()
                .ok_or_else(|| Error::unauthorized("invalid session token"))
        });
        HttpState::new(
            Arc::new(authenticator),
            Arc::new(self.accounts),
            Arc::new(self.requests),
            Arc::new(self.query),
        )
    }
}
