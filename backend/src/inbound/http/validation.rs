//! Shared validation helpers for inbound HTTP adapters.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::json;
use uuid::Uuid;

use crate::domain::{Error, PanelId, RequestId, RequestStatus};

/// Date format used by list filters and list rows.
pub(crate) const LISTING_DATE_FORMAT: &str = "%d-%m-%Y %H:%M:%S";

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ValidationCode {
    MissingField,
    InvalidDate,
    InvalidStatus,
}

impl ValidationCode {
    fn as_str(self) -> &'static str {
        match self {
            Self::MissingField => "missing_field",
            Self::InvalidDate => "invalid_date",
            Self::InvalidStatus => "invalid_status",
        }
    }
}

/// Newtype wrapper for HTTP field names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub(crate) fn as_str(self) -> &'static str {
        self.0
    }
}

fn invalid_field(field: FieldName, message: String, code: ValidationCode, value: &str) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": field.as_str(),
        "value": value,
        "code": code.as_str(),
    }))
}

pub(crate) fn missing_field_error(field: FieldName) -> Error {
    let name = field.as_str();
    Error::invalid_request(format!("missing required field: {name}")).with_details(json!({
        "field": name,
        "code": ValidationCode::MissingField.as_str(),
    }))
}

/// Unwrap a required JSON field.
pub(crate) fn require<T>(value: Option<T>, field: FieldName) -> Result<T, Error> {
    value.ok_or_else(|| missing_field_error(field))
}

/// Parse a path identifier. An id that is not a UUID names nothing that
/// could exist, so it is reported as not found.
fn parse_path_uuid(raw: &str, entity: &str) -> Result<Uuid, Error> {
    Uuid::parse_str(raw).map_err(|_| Error::not_found(format!("{entity} not found")))
}

pub(crate) fn parse_request_id(raw: &str) -> Result<RequestId, Error> {
    parse_path_uuid(raw, "request").map(RequestId::from_uuid)
}

pub(crate) fn parse_panel_id(raw: &str) -> Result<PanelId, Error> {
    parse_path_uuid(raw, "panel").map(PanelId::from_uuid)
}

/// Parse a `dd-mm-yyyy hh:mm:ss` filter value, read as UTC.
pub(crate) fn parse_listing_date(
    value: Option<&str>,
    field: FieldName,
) -> Result<Option<DateTime<Utc>>, Error> {
    let Some(raw) = value.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return Ok(None);
    };
    NaiveDateTime::parse_from_str(raw, LISTING_DATE_FORMAT)
        .map(|naive| Some(naive.and_utc()))
        .map_err(|_| {
            invalid_field(
                field,
                format!("{} must be formatted dd-mm-yyyy hh:mm:ss", field.as_str()),
                ValidationCode::InvalidDate,
                raw,
            )
        })
}

pub(crate) fn format_listing_date(value: DateTime<Utc>) -> String {
    value.format(LISTING_DATE_FORMAT).to_string()
}

pub(crate) fn parse_status_filter(value: Option<&str>) -> Result<Option<RequestStatus>, Error> {
    let Some(raw) = value.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return Ok(None);
    };
    raw.parse::<RequestStatus>().map(Some).map_err(|_| {
        invalid_field(
            FieldName::new("status"),
            format!("unknown status: {raw}"),
            ValidationCode::InvalidStatus,
            raw,
        )
    })
}
