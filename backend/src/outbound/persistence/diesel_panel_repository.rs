//! PostgreSQL-backed `PanelRepository` implementation.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{PanelRepository, PanelRepositoryError};
use crate::domain::{Panel, PanelId};

use super::diesel_error_mapping::{StoreFailure, classify};
use super::models::PanelRow;
use super::pool::{DbPool, PoolError};
use super::schema::panels;

/// Read-only view of the panel catalogue. Soft-deleted panels are returned
/// with `is_deleted` set; callers decide what that means.
#[derive(Clone)]
pub struct DieselPanelRepository {
    pool: DbPool,
}

impl DieselPanelRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> PanelRepositoryError {
    PanelRepositoryError::connection(error.into_message())
}

fn map_diesel_error(error: diesel::result::Error) -> PanelRepositoryError {
    match classify(&error) {
        StoreFailure::Connection(message) => PanelRepositoryError::connection(message),
        StoreFailure::UniqueViolation => PanelRepositoryError::query("unique constraint violated"),
        StoreFailure::Query(message) => PanelRepositoryError::query(message),
    }
}

#[async_trait]
impl PanelRepository for DieselPanelRepository {
    async fn find_by_id(&self, id: PanelId) -> Result<Option<Panel>, PanelRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = panels::table
            .filter(panels::id.eq(id.as_uuid()))
            .select(PanelRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(row.map(Panel::from))
    }
}
