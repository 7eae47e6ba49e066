//! Domain primitives, aggregates and services.
//!
//! Purpose: define the solar panel request lifecycle independently of HTTP
//! and storage. Inbound adapters call the driving ports in [`ports`];
//! outbound adapters implement the driven ports.
//!
//! Public surface:
//! - Error / ErrorCode: transport-agnostic failure payload.
//! - SolarPanelRequest and its value types: the request aggregate.
//! - SolarRequestService, SessionGate, AccountsService: use-case services.

pub mod auth;
pub mod error;
pub mod panel;
pub mod ports;
pub mod solar_request;
pub mod trace_id;
pub mod user;

mod accounts_service;
mod session_gate;
mod solar_request_service;

pub use self::accounts_service::AccountsService;
pub use self::auth::{
    IssuedToken, LoginCredentials, LoginValidationError, MIN_PASSWORD_LENGTH, PasswordHash,
    Principal, Registration, RegistrationValidationError, TokenClaims,
};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::panel::{Panel, PanelId};
pub use self::session_gate::SessionGate;
pub use self::solar_request::{
    AccessDenied, Area, DraftSummary, Insolation, ListScope, MAX_INSOLATION, ModeratorDecision,
    NumericField, PowerCalculationError, PowerInput, RequestFilter, RequestId, RequestItem,
    RequestStatus, RequestSummary, RequestValidationError, SolarPanelRequest, TotalPower,
    calculate_total_power, round_to_hundredths,
};
pub use self::solar_request_service::SolarRequestService;
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::user::{LOGIN_MAX, Login, Role, User, UserId, UserValidationError};
