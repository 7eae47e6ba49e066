//! Internal Diesel row structs for database operations.
//!
//! These types never leave the persistence layer. Conversions into domain
//! types live here so every repository decodes rows the same way.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::{
    Login, Panel, PanelId, PasswordHash, RequestId, RequestItem, RequestStatus, Role,
    SolarPanelRequest, User, UserId, UserValidationError,
};

use super::schema::{panels, request_items, solar_requests, users};

/// Row struct for reading from the users table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub login: String,
    pub password_hash: String,
    pub role: String,
}

impl UserRow {
    pub(crate) fn into_user(self) -> Result<(User, PasswordHash), UserValidationError> {
        let login = Login::new(&self.login)?;
        let role = self.role.parse::<Role>()?;
        Ok((
            User::new(UserId::from_uuid(self.id), login, role),
            PasswordHash::from_stored(self.password_hash),
        ))
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub id: Uuid,
    pub login: &'a str,
    pub password_hash: &'a str,
    pub role: &'a str,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = panels)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct PanelRow {
    pub id: Uuid,
    pub title: String,
    pub panel_type: String,
    pub power: f64,
    pub width: i32,
    pub height: i32,
    pub image: Option<String>,
    pub is_deleted: bool,
}

impl From<PanelRow> for Panel {
    fn from(row: PanelRow) -> Self {
        Self {
            id: PanelId::from_uuid(row.id),
            title: row.title,
            panel_type: row.panel_type,
            power: row.power,
            width: row.width,
            height: row.height,
            image: row.image,
            is_deleted: row.is_deleted,
        }
    }
}

/// Row struct for reading from the solar_requests table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = solar_requests)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct SolarRequestRow {
    pub id: Uuid,
    pub creator_id: Uuid,
    pub moderator_id: Option<Uuid>,
    pub status: String,
    pub insolation: f64,
    pub total_power: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub formed_at: Option<DateTime<Utc>>,
    pub moderated_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl SolarRequestRow {
    /// Decode the stored status. The column carries a CHECK constraint, so a
    /// failure here means the schema and this build disagree.
    pub(crate) fn status(&self) -> Result<RequestStatus, String> {
        self.status
            .parse::<RequestStatus>()
            .map_err(|err| err.to_string())
    }

    pub(crate) fn into_request(
        self,
        items: Vec<RequestItem>,
    ) -> Result<SolarPanelRequest, String> {
        let status = self.status()?;
        Ok(SolarPanelRequest {
            id: RequestId::from_uuid(self.id),
            creator: UserId::from_uuid(self.creator_id),
            moderator: self.moderator_id.map(UserId::from_uuid),
            status,
            insolation: self.insolation,
            total_power: self.total_power,
            created_at: self.created_at,
            formed_at: self.formed_at,
            moderated_at: self.moderated_at,
            deleted_at: self.deleted_at,
            items,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = solar_requests)]
pub(crate) struct NewSolarRequestRow<'a> {
    pub id: Uuid,
    pub creator_id: Uuid,
    pub status: &'a str,
    pub insolation: f64,
    pub created_at: DateTime<Utc>,
}

/// Changeset for a status transition.
///
/// `None` fields are left untouched, so each transition only stamps the
/// columns that belong to its target status.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = solar_requests)]
pub(crate) struct StatusChange<'a> {
    pub status: &'a str,
    pub moderator_id: Option<Uuid>,
    pub formed_at: Option<DateTime<Utc>>,
    pub moderated_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = request_items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct RequestItemRow {
    pub area: f64,
}
