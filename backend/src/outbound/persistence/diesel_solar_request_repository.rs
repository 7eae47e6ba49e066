//! PostgreSQL-backed `SolarRequestRepository` implementation using Diesel ORM.
//!
//! Status-changing writes are single `UPDATE … WHERE id = ? AND status = ?`
//! statements; the affected row count becomes the [`ConditionalUpdate`].

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::ports::{
    ConditionalUpdate, SolarRequestRepository, SolarRequestRepositoryError, StatusTransition,
};
use crate::domain::{
    DraftSummary, ListScope, RequestFilter, RequestId, RequestItem, RequestStatus,
    RequestSummary, SolarPanelRequest, UserId,
};

use super::diesel_error_mapping::{StoreFailure, classify};
use super::models::{
    NewSolarRequestRow, PanelRow, RequestItemRow, SolarRequestRow, StatusChange,
};
use super::pool::{DbPool, PoolError};
use super::schema::{panels, request_items, solar_requests, users};

const LISTED_STATUSES: [&str; 3] = [
    RequestStatus::Formed.as_str(),
    RequestStatus::Completed.as_str(),
    RequestStatus::Rejected.as_str(),
];

/// Diesel-backed implementation of the request repository port.
#[derive(Clone)]
pub struct DieselSolarRequestRepository {
    pool: DbPool,
}

impl DieselSolarRequestRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn draft_id(
        &self,
        creator: UserId,
    ) -> Result<Option<Uuid>, SolarRequestRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        solar_requests::table
            .filter(solar_requests::creator_id.eq(creator.as_uuid()))
            .filter(solar_requests::status.eq(RequestStatus::Draft.as_str()))
            .select(solar_requests::id)
            .first::<Uuid>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)
    }

    async fn logins(
        &self,
        ids: Vec<Uuid>,
    ) -> Result<HashMap<Uuid, String>, SolarRequestRepositoryError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<(Uuid, String)> = users::table
            .filter(users::id.eq_any(ids))
            .select((users::id, users::login))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(rows.into_iter().collect())
    }
}

fn map_pool_error(error: PoolError) -> SolarRequestRepositoryError {
    SolarRequestRepositoryError::connection(error.into_message())
}

fn map_diesel_error(error: diesel::result::Error) -> SolarRequestRepositoryError {
    match classify(&error) {
        StoreFailure::Connection(message) => SolarRequestRepositoryError::connection(message),
        StoreFailure::UniqueViolation => {
            SolarRequestRepositoryError::query("unique constraint violated")
        }
        StoreFailure::Query(message) => SolarRequestRepositoryError::query(message),
    }
}

/// The creator foreign key makes a missing login an integrity fault; the
/// row is still listed, with an empty login.
fn creator_login(logins: &HashMap<Uuid, String>, request: Uuid, creator: Uuid) -> String {
    logins.get(&creator).cloned().unwrap_or_else(|| {
        warn!(%request, %creator, "request creator has no user row");
        String::new()
    })
}

fn status_change(transition: &StatusTransition) -> StatusChange<'static> {
    let at = Some(transition.at);
    let mut change = StatusChange {
        status: transition.to.as_str(),
        moderator_id: None,
        formed_at: None,
        moderated_at: None,
        deleted_at: None,
    };
    match transition.to {
        RequestStatus::Formed => change.formed_at = at,
        RequestStatus::Completed | RequestStatus::Rejected => {
            change.moderated_at = at;
            change.moderator_id = transition.moderator.map(|id| *id.as_uuid());
        }
        RequestStatus::Deleted => change.deleted_at = at,
        RequestStatus::Draft => {}
    }
    change
}

#[async_trait]
impl SolarRequestRepository for DieselSolarRequestRepository {
    async fn find_or_create_draft(
        &self,
        creator: UserId,
        now: DateTime<Utc>,
    ) -> Result<RequestId, SolarRequestRepositoryError> {
        if let Some(id) = self.draft_id(creator).await? {
            return Ok(RequestId::from_uuid(id));
        }

        // The partial unique index turns a racing insert into a no-op.
        let row = NewSolarRequestRow {
            id: Uuid::new_v4(),
            creator_id: *creator.as_uuid(),
            status: RequestStatus::Draft.as_str(),
            insolation: 0.0,
            created_at: now,
        };
        {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            let inserted = diesel::insert_into(solar_requests::table)
                .values(&row)
                .on_conflict_do_nothing()
                .execute(&mut conn)
                .await
                .map_err(map_diesel_error)?;
            debug!(%creator, inserted, "draft lookup fell through to insert");
        }

        self.draft_id(creator)
            .await?
            .map(RequestId::from_uuid)
            .ok_or_else(|| SolarRequestRepositoryError::query("draft vanished after insert"))
    }

    async fn draft_summary(
        &self,
        creator: UserId,
    ) -> Result<Option<DraftSummary>, SolarRequestRepositoryError> {
        let Some(id) = self.draft_id(creator).await? else {
            return Ok(None);
        };
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let count: i64 = request_items::table
            .filter(request_items::request_id.eq(id))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(Some(DraftSummary {
            request_id: RequestId::from_uuid(id),
            item_count: u64::try_from(count).unwrap_or_default(),
        }))
    }

    async fn find_by_id(
        &self,
        id: RequestId,
    ) -> Result<Option<SolarPanelRequest>, SolarRequestRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let Some(row) = solar_requests::table
            .filter(solar_requests::id.eq(id.as_uuid()))
            .select(SolarRequestRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?
        else {
            return Ok(None);
        };

        let items: Vec<(RequestItemRow, PanelRow)> = request_items::table
            .inner_join(panels::table)
            .filter(request_items::request_id.eq(id.as_uuid()))
            .order((panels::title.asc(), panels::id.asc()))
            .select((RequestItemRow::as_select(), PanelRow::as_select()))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let items = items
            .into_iter()
            .map(|(item, panel)| RequestItem {
                panel: panel.into(),
                area: item.area,
            })
            .collect();

        row.into_request(items)
            .map(Some)
            .map_err(SolarRequestRepositoryError::query)
    }

    async fn status_of(
        &self,
        id: RequestId,
    ) -> Result<Option<RequestStatus>, SolarRequestRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let status: Option<String> = solar_requests::table
            .filter(solar_requests::id.eq(id.as_uuid()))
            .select(solar_requests::status)
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        status
            .map(|value| value.parse::<RequestStatus>())
            .transpose()
            .map_err(|err| SolarRequestRepositoryError::query(err.to_string()))
    }

    async fn list(
        &self,
        scope: ListScope,
        filter: RequestFilter,
    ) -> Result<Vec<RequestSummary>, SolarRequestRepositoryError> {
        let mut query = solar_requests::table
            .select(SolarRequestRow::as_select())
            .filter(solar_requests::status.eq_any(LISTED_STATUSES))
            .into_boxed();
        if let ListScope::CreatedBy(creator) = scope {
            query = query.filter(solar_requests::creator_id.eq(*creator.as_uuid()));
        }
        if let Some(status) = filter.status {
            query = query.filter(solar_requests::status.eq(status.as_str()));
        }
        if let Some(from) = filter.formed_from {
            query = query.filter(solar_requests::formed_at.ge(from));
        }
        if let Some(to) = filter.formed_to {
            query = query.filter(solar_requests::formed_at.le(to));
        }

        let rows: Vec<SolarRequestRow> = {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            query
                .order((solar_requests::formed_at.desc(), solar_requests::id.asc()))
                .load(&mut conn)
                .await
                .map_err(map_diesel_error)?
        };

        let mut user_ids: Vec<Uuid> = rows
            .iter()
            .flat_map(|row| std::iter::once(row.creator_id).chain(row.moderator_id))
            .collect();
        user_ids.sort_unstable();
        user_ids.dedup();
        let logins = self.logins(user_ids).await?;

        rows.into_iter()
            .map(|row| {
                let status = row.status().map_err(SolarRequestRepositoryError::query)?;
                Ok(RequestSummary {
                    id: RequestId::from_uuid(row.id),
                    status,
                    creator_login: creator_login(&logins, row.id, row.creator_id),
                    moderator_login: row
                        .moderator_id
                        .and_then(|moderator| logins.get(&moderator).cloned()),
                    created_at: row.created_at,
                    formed_at: row.formed_at,
                    moderated_at: row.moderated_at,
                    insolation: row.insolation,
                    total_power: row.total_power,
                })
            })
            .collect()
    }

    async fn update_insolation(
        &self,
        id: RequestId,
        insolation: f64,
    ) -> Result<ConditionalUpdate, SolarRequestRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows = diesel::update(
            solar_requests::table
                .filter(solar_requests::id.eq(id.as_uuid()))
                .filter(solar_requests::status.eq(RequestStatus::Draft.as_str())),
        )
        .set(solar_requests::insolation.eq(insolation))
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        Ok(ConditionalUpdate::from_rows(rows))
    }

    async fn transition(
        &self,
        transition: StatusTransition,
    ) -> Result<ConditionalUpdate, SolarRequestRepositoryError> {
        let change = status_change(&transition);
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows = diesel::update(
            solar_requests::table
                .filter(solar_requests::id.eq(transition.id.as_uuid()))
                .filter(solar_requests::status.eq(transition.from.as_str())),
        )
        .set(&change)
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        Ok(ConditionalUpdate::from_rows(rows))
    }

    async fn update_total_power(
        &self,
        id: RequestId,
        total_power: f64,
    ) -> Result<ConditionalUpdate, SolarRequestRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows = diesel::update(
            solar_requests::table
                .filter(solar_requests::id.eq(id.as_uuid()))
                .filter(solar_requests::status.eq(RequestStatus::Completed.as_str())),
        )
        .set(solar_requests::total_power.eq(Some(total_power)))
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        Ok(ConditionalUpdate::from_rows(rows))
    }
}
