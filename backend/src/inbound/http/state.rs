//! Shared HTTP adapter state.
//!
//! Handlers receive this through `web::Data` and depend only on driving
//! ports, so they stay testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{
    AccountCommand, SessionAuthenticator, SolarRequestCommand, SolarRequestQuery,
};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub sessions: Arc<dyn SessionAuthenticator>,
    pub accounts: Arc<dyn AccountCommand>,
    pub requests: Arc<dyn SolarRequestCommand>,
    pub requests_query: Arc<dyn SolarRequestQuery>,
}

impl HttpState {
    pub fn new(
        sessions: Arc<dyn SessionAuthenticator>,
        accounts: Arc<dyn AccountCommand>,
        requests: Arc<dyn SolarRequestCommand>,
        requests_query: Arc<dyn SolarRequestQuery>,
    ) -> Self {
        Self {
            sessions,
            accounts,
            requests,
            requests_query,
        }
    }
}
