//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driving ports (`*Command`, `*Query`, [`SessionAuthenticator`]) are what
//! inbound adapters call. Driven ports (`*Repository`, [`RevocationList`],
//! [`SessionTokens`], [`CalculationDispatcher`]) are implemented by outbound
//! adapters. Each driven port exposes its own error enum so adapters map
//! failures into predictable variants.

mod macros;
pub(crate) use macros::define_port_error;

mod account_command;
mod calculation_dispatcher;
mod panel_repository;
mod request_item_repository;
mod revocation_list;
mod session_authenticator;
mod session_tokens;
mod solar_request_command;
mod solar_request_query;
mod solar_request_repository;
mod user_repository;

#[cfg(test)]
pub use account_command::MockAccountCommand;
pub use account_command::{AccountCommand, LoginOutcome};
#[cfg(test)]
pub use calculation_dispatcher::MockCalculationDispatcher;
pub use calculation_dispatcher::{CalculationDispatchError, CalculationDispatcher, CalculationJob};
#[cfg(test)]
pub use panel_repository::MockPanelRepository;
pub use panel_repository::{PanelRepository, PanelRepositoryError};
#[cfg(test)]
pub use request_item_repository::MockRequestItemRepository;
pub use request_item_repository::{RequestItemRepository, RequestItemRepositoryError};
#[cfg(test)]
pub use revocation_list::MockRevocationList;
pub use revocation_list::{RevocationList, RevocationListError, revocation_key};
#[cfg(test)]
pub use session_authenticator::MockSessionAuthenticator;
pub use session_authenticator::SessionAuthenticator;
#[cfg(test)]
pub use session_tokens::MockSessionTokens;
pub use session_tokens::{SessionTokenError, SessionTokens};
#[cfg(test)]
pub use solar_request_command::MockSolarRequestCommand;
pub use solar_request_command::SolarRequestCommand;
#[cfg(test)]
pub use solar_request_query::MockSolarRequestQuery;
pub use solar_request_query::SolarRequestQuery;
#[cfg(test)]
pub use solar_request_repository::MockSolarRequestRepository;
pub use solar_request_repository::{
    ConditionalUpdate, SolarRequestRepository, SolarRequestRepositoryError, StatusTransition,
};
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{StoredCredentials, UserPersistenceError, UserRepository};
