//! Solar panel request aggregate.
//!
//! A request moves through a small state machine:
//!
//! ```text
//! draft ──form──▶ formed ──moderate──▶ completed | rejected
//!   │
//!   └──delete──▶ deleted
//! ```
//!
//! `completed`, `rejected` and `deleted` are terminal. Only a draft accepts
//! item and insolation edits. The draft doubles as the creator's cart; at most
//! one exists per creator.

mod power;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use power::{PowerCalculationError, PowerInput, calculate_total_power, round_to_hundredths};

use super::{Panel, PanelId, Principal, UserId};

/// Upper bound for site insolation.
pub const MAX_INSOLATION: f64 = 10.0;

/// Stable request identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Validation failures raised by request value types.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestValidationError {
    UnknownStatus(String),
    UnknownDecision(String),
    InsolationOutOfRange(f64),
    AreaNotPositive(f64),
    TotalPowerInvalid(f64),
}

impl fmt::Display for RequestValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownStatus(raw) => write!(
                f,
                "unknown status {raw:?}; expected draft, formed, completed, rejected or deleted"
            ),
            Self::UnknownDecision(raw) => {
                write!(f, "unknown action {raw:?}; expected completed or rejected")
            }
            Self::InsolationOutOfRange(value) => write!(
                f,
                "insolation must be greater than 0 and at most {MAX_INSOLATION}, got {value}"
            ),
            Self::AreaNotPositive(value) => {
                write!(f, "area must be a positive finite number, got {value}")
            }
            Self::TotalPowerInvalid(value) => {
                write!(f, "total power must be a non-negative finite number, got {value}")
            }
        }
    }
}

impl std::error::Error for RequestValidationError {}

/// Lifecycle state of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Draft,
    Formed,
    Completed,
    Rejected,
    Deleted,
}

impl RequestStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Formed => "formed",
            Self::Completed => "completed",
            Self::Rejected => "rejected",
            Self::Deleted => "deleted",
        }
    }

    /// Whether requests in this state appear in list views.
    pub const fn is_listed(self) -> bool {
        matches!(self, Self::Formed | Self::Completed | Self::Rejected)
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = RequestValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "formed" => Ok(Self::Formed),
            "completed" => Ok(Self::Completed),
            "rejected" => Ok(Self::Rejected),
            "deleted" => Ok(Self::Deleted),
            other => Err(RequestValidationError::UnknownStatus(other.to_owned())),
        }
    }
}

/// Outcome a moderator applies to a formed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeratorDecision {
    Completed,
    Rejected,
}

impl ModeratorDecision {
    pub const fn target_status(self) -> RequestStatus {
        match self {
            Self::Completed => RequestStatus::Completed,
            Self::Rejected => RequestStatus::Rejected,
        }
    }
}

impl FromStr for ModeratorDecision {
    type Err = RequestValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "completed" => Ok(Self::Completed),
            "rejected" => Ok(Self::Rejected),
            other => Err(RequestValidationError::UnknownDecision(other.to_owned())),
        }
    }
}

/// Site insolation factor in `(0, 10]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Insolation(f64);

impl Insolation {
    /// # Examples
    /// ```
    /// use solar_backend::domain::Insolation;
    ///
    /// assert!(Insolation::try_new(10.0).is_ok());
    /// assert!(Insolation::try_new(0.0).is_err());
    /// assert!(Insolation::try_new(f64::NAN).is_err());
    /// ```
    pub fn try_new(value: f64) -> Result<Self, RequestValidationError> {
        if value.is_finite() && value > 0.0 && value <= MAX_INSOLATION {
            Ok(Self(value))
        } else {
            Err(RequestValidationError::InsolationOutOfRange(value))
        }
    }

    pub const fn value(self) -> f64 {
        self.0
    }
}

/// Installed area for one line item, positive and finite.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Area(f64);

impl Area {
    pub fn try_new(value: f64) -> Result<Self, RequestValidationError> {
        if value.is_finite() && value > 0.0 {
            Ok(Self(value))
        } else {
            Err(RequestValidationError::AreaNotPositive(value))
        }
    }

    pub const fn value(self) -> f64 {
        self.0
    }
}

/// Total power reported by the calculation callback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TotalPower(f64);

impl TotalPower {
    pub fn try_new(value: f64) -> Result<Self, RequestValidationError> {
        if value.is_finite() && value >= 0.0 {
            Ok(Self(value))
        } else {
            Err(RequestValidationError::TotalPowerInvalid(value))
        }
    }

    pub const fn value(self) -> f64 {
        self.0
    }
}

/// A numeric body field as it arrived on the wire.
///
/// Content problems are judged only after the target request has been found
/// and the caller authorised, so a malformed value travels this far intact.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumericField {
    Missing,
    Value(f64),
    /// Present but not a number, or the body around it did not parse.
    Malformed,
}

impl From<Option<f64>> for NumericField {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Self::Missing, Self::Value)
    }
}

/// Line item joining a request and a panel.
///
/// `area` holds whatever is stored; a fresh item starts at `0.0` and must be
/// resized before the request can be formed.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestItem {
    pub panel: Panel,
    pub area: f64,
}

impl RequestItem {
    pub fn power_input(&self) -> PowerInput {
        PowerInput {
            power: self.panel.power,
            area: self.area,
            width: self.panel.width,
            height: self.panel.height,
        }
    }
}

/// Why a principal may not touch a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDenied {
    NotOwner,
    NotModerator,
}

impl fmt::Display for AccessDenied {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotOwner => write!(f, "request belongs to another user"),
            Self::NotModerator => write!(f, "moderator role required"),
        }
    }
}

/// Request aggregate with its line items.
#[derive(Debug, Clone, PartialEq)]
pub struct SolarPanelRequest {
    pub id: RequestId,
    pub creator: UserId,
    pub moderator: Option<UserId>,
    pub status: RequestStatus,
    pub insolation: f64,
    /// `None` until the calculation callback reports a value.
    pub total_power: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub formed_at: Option<DateTime<Utc>>,
    pub moderated_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub items: Vec<RequestItem>,
}

impl SolarPanelRequest {
    pub fn is_owned_by(&self, user: UserId) -> bool {
        self.creator == user
    }

    /// Only the creator may edit, form or delete.
    pub fn ensure_owner(&self, principal: &Principal) -> Result<(), AccessDenied> {
        if self.is_owned_by(principal.user_id()) {
            Ok(())
        } else {
            Err(AccessDenied::NotOwner)
        }
    }

    /// The creator or any moderator may view the request or drop an item.
    pub fn ensure_owner_or_moderator(&self, principal: &Principal) -> Result<(), AccessDenied> {
        if principal.is_moderator() || self.is_owned_by(principal.user_id()) {
            Ok(())
        } else {
            Err(AccessDenied::NotOwner)
        }
    }

    pub fn item(&self, panel: PanelId) -> Option<&RequestItem> {
        self.items.iter().find(|item| item.panel.id == panel)
    }

    /// Check the content rules for the draft → formed transition.
    pub fn validate_for_forming(&self) -> Result<Insolation, RequestValidationError> {
        for item in &self.items {
            Area::try_new(item.area)?;
        }
        Insolation::try_new(self.insolation)
    }

    pub fn power_inputs(&self) -> Vec<PowerInput> {
        self.items.iter().map(RequestItem::power_input).collect()
    }

    /// Local evaluation of the total power formula for this request.
    pub fn expected_total_power(&self) -> Result<f64, PowerCalculationError> {
        calculate_total_power(&self.power_inputs(), self.insolation)
    }
}

/// Filter applied to list views.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestFilter {
    pub status: Option<RequestStatus>,
    pub formed_from: Option<DateTime<Utc>>,
    pub formed_to: Option<DateTime<Utc>>,
}

/// Which creators a list view covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListScope {
    All,
    CreatedBy(UserId),
}

impl ListScope {
    pub fn for_principal(principal: &Principal) -> Self {
        if principal.is_moderator() {
            Self::All
        } else {
            Self::CreatedBy(principal.user_id())
        }
    }
}

/// Row shown in list views.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSummary {
    pub id: RequestId,
    pub status: RequestStatus,
    pub creator_login: String,
    pub moderator_login: Option<String>,
    pub created_at: DateTime<Utc>,
    pub formed_at: Option<DateTime<Utc>>,
    pub moderated_at: Option<DateTime<Utc>>,
    pub insolation: f64,
    pub total_power: Option<f64>,
}

/// Cart summary for the current draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DraftSummary {
    pub request_id: RequestId,
    pub item_count: u64,
}
