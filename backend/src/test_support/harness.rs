//! Fully wired application over in-memory adapters.
//!
//! Uses the real session gate, JWT codec and in-memory revocation list, so
//! tests exercise the same authentication path as production.

use std::sync::Arc;
use std::time::Duration;

use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, web};
use mockable::Clock;

use crate::Trace;
use crate::domain::{
    AccountsService, Principal, Role, SessionGate, SolarRequestService, User,
};
use crate::inbound::http::configure_api;
use crate::inbound::http::state::HttpState;
use crate::outbound::cache::InMemoryRevocationList;
use crate::outbound::token::JwtSessionTokens;

use super::{InMemoryStore, MutableClock, RecordingDispatcher};

/// Shared secret the calculation callback must present.
pub const SERVICE_TOKEN: &str = "calc-service-token";

const JWT_SECRET: &[u8] = b"integration-secret-of-32-bytes!!";
const SESSION_TTL: Duration = Duration::from_secs(3600);

pub struct Harness {
    pub store: Arc<InMemoryStore>,
    pub clock: Arc<MutableClock>,
    pub dispatcher: Arc<RecordingDispatcher>,
    pub gate: Arc<SessionGate>,
    pub state: HttpState,
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

impl Harness {
    pub fn new() -> Self {
        let store = Arc::new(InMemoryStore::new());
        let clock = Arc::new(MutableClock::fixed());
        let dispatcher = Arc::new(RecordingDispatcher::new());
        let shared_clock: Arc<dyn Clock> = clock.clone();

        let tokens = JwtSessionTokens::new(JWT_SECRET)
            .unwrap_or_else(|err| panic!("harness secret rejected: {err}"));
        let gate = Arc::new(SessionGate::new(
            Arc::new(tokens),
            Arc::new(InMemoryRevocationList::new(shared_clock.clone())),
            shared_clock.clone(),
            SESSION_TTL,
        ));
        let accounts = Arc::new(AccountsService::new(store.clone(), gate.clone()));
        let requests = Arc::new(SolarRequestService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            dispatcher.clone(),
            shared_clock,
            SERVICE_TOKEN,
        ));
        let state = HttpState::new(gate.clone(), accounts, requests.clone(), requests);

        Self {
            store,
            clock,
            dispatcher,
            gate,
            state,
        }
    }

    /// Application with the production route table and middleware.
    pub fn app(
        &self,
    ) -> App<
        impl ServiceFactory<
            ServiceRequest,
            Config = (),
            Response = ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        > + use<>,
    > {
        App::new()
            .app_data(web::Data::new(self.state.clone()))
            .wrap(Trace)
            .configure(configure_api)
    }

    /// Seed an account and mint a session token for it.
    pub fn sign_in(&self, login: &str, role: Role) -> (User, String) {
        let user = self.store.seed_user(login, "correct horse", role);
        let issued = self
            .gate
            .issue(Principal::new(user.id(), user.role()))
            .unwrap_or_else(|err| panic!("token issue failed: {err}"));
        (user, issued.token.as_str().to_owned())
    }
}
