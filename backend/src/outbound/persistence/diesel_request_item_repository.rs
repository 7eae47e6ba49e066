//! PostgreSQL-backed `RequestItemRepository` implementation.
//!
//! Every statement carries the parent-is-draft predicate, so an item write
//! racing a status change on its request affects zero rows instead of
//! mutating a formed request.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::sql_types;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{ConditionalUpdate, RequestItemRepository, RequestItemRepositoryError};
use crate::domain::{PanelId, RequestId, RequestStatus};

use super::diesel_error_mapping::{StoreFailure, classify};
use super::pool::{DbPool, PoolError};
use super::schema::{request_items, solar_requests};

/// Diesel-backed implementation of the line item port.
#[derive(Clone)]
pub struct DieselRequestItemRepository {
    pool: DbPool,
}

impl DieselRequestItemRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> RequestItemRepositoryError {
    RequestItemRepositoryError::connection(error.into_message())
}

fn map_diesel_error(error: diesel::result::Error) -> RequestItemRepositoryError {
    match classify(&error) {
        StoreFailure::UniqueViolation => {
            RequestItemRepositoryError::duplicate("panel is already in the request")
        }
        StoreFailure::Connection(message) => RequestItemRepositoryError::connection(message),
        StoreFailure::Query(message) => RequestItemRepositoryError::query(message),
    }
}

#[async_trait]
impl RequestItemRepository for DieselRequestItemRepository {
    async fn insert(
        &self,
        request: RequestId,
        panel: PanelId,
    ) -> Result<ConditionalUpdate, RequestItemRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        // INSERT … SELECT only yields a row while the parent is a draft.
        let source = solar_requests::table
            .filter(solar_requests::id.eq(*request.as_uuid()))
            .filter(solar_requests::status.eq(RequestStatus::Draft.as_str()))
            .select((
                solar_requests::id,
                (*panel.as_uuid()).into_sql::<sql_types::Uuid>(),
                0.0_f64.into_sql::<sql_types::Double>(),
            ));
        let rows = diesel::insert_into(request_items::table)
            .values(source)
            .into_columns((
                request_items::request_id,
                request_items::panel_id,
                request_items::area,
            ))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(ConditionalUpdate::from_rows(rows))
    }

    async fn remove(
        &self,
        request: RequestId,
        panel: PanelId,
    ) -> Result<ConditionalUpdate, RequestItemRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let drafts = solar_requests::table
            .filter(solar_requests::status.eq(RequestStatus::Draft.as_str()))
            .select(solar_requests::id);
        let rows = diesel::delete(
            request_items::table
                .filter(request_items::request_id.eq(*request.as_uuid()))
                .filter(request_items::panel_id.eq(*panel.as_uuid()))
                .filter(request_items::request_id.eq_any(drafts)),
        )
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        Ok(ConditionalUpdate::from_rows(rows))
    }

    async fn resize(
        &self,
        request: RequestId,
        panel: PanelId,
        area: f64,
    ) -> Result<ConditionalUpdate, RequestItemRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let drafts = solar_requests::table
            .filter(solar_requests::status.eq(RequestStatus::Draft.as_str()))
            .select(solar_requests::id);
        let rows = diesel::update(
            request_items::table
                .filter(request_items::request_id.eq(*request.as_uuid()))
                .filter(request_items::panel_id.eq(*panel.as_uuid()))
                .filter(request_items::request_id.eq_any(drafts)),
        )
        .set(request_items::area.eq(area))
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        Ok(ConditionalUpdate::from_rows(rows))
    }
}
