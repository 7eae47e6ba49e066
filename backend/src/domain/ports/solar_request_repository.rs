//! Port for request aggregate persistence.
//!
//! Every status-changing write is conditional on the current status. Callers
//! receive [`ConditionalUpdate::NoMatch`] when the predicate matched no row
//! and decide themselves whether that is a conflict or a missing entity.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    DraftSummary, ListScope, RequestFilter, RequestId, RequestStatus, RequestSummary,
    SolarPanelRequest, UserId,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by request repository adapters.
    pub enum SolarRequestRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            InternalError, "solar request repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            InternalError, "solar request repository query failed: {message}",
    }
}

/// Outcome of a write guarded by a status predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionalUpdate {
    Applied,
    NoMatch,
}

impl ConditionalUpdate {
    pub const fn from_rows(rows: usize) -> Self {
        if rows == 0 { Self::NoMatch } else { Self::Applied }
    }

    pub const fn is_applied(self) -> bool {
        matches!(self, Self::Applied)
    }
}

/// Status change applied as `UPDATE … WHERE id = ? AND status = from`.
///
/// The adapter stamps the timestamp column that belongs to `to`:
/// `formed_at`, `moderated_at` or `deleted_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusTransition {
    pub id: RequestId,
    pub from: RequestStatus,
    pub to: RequestStatus,
    pub at: DateTime<Utc>,
    pub moderator: Option<UserId>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SolarRequestRepository: Send + Sync {
    /// Return the creator's draft, creating it when none exists.
    ///
    /// Concurrent callers for the same creator converge on one draft.
    async fn find_or_create_draft(
        &self,
        creator: UserId,
        now: DateTime<Utc>,
    ) -> Result<RequestId, SolarRequestRepositoryError>;

    /// Summarise the creator's draft, if any.
    async fn draft_summary(
        &self,
        creator: UserId,
    ) -> Result<Option<DraftSummary>, SolarRequestRepositoryError>;

    /// Load a request together with its items and their panels.
    async fn find_by_id(
        &self,
        id: RequestId,
    ) -> Result<Option<SolarPanelRequest>, SolarRequestRepositoryError>;

    /// Current status of a request without loading its items.
    async fn status_of(
        &self,
        id: RequestId,
    ) -> Result<Option<RequestStatus>, SolarRequestRepositoryError>;

    /// List formed and moderated requests ordered by `formed_at` descending.
    async fn list(
        &self,
        scope: ListScope,
        filter: RequestFilter,
    ) -> Result<Vec<RequestSummary>, SolarRequestRepositoryError>;

    /// Set insolation on a request that is still a draft.
    async fn update_insolation(
        &self,
        id: RequestId,
        insolation: f64,
    ) -> Result<ConditionalUpdate, SolarRequestRepositoryError>;

    /// Apply a status transition guarded by the expected current status.
    async fn transition(
        &self,
        transition: StatusTransition,
    ) -> Result<ConditionalUpdate, SolarRequestRepositoryError>;

    /// Store the externally computed total power on a completed request.
    async fn update_total_power(
        &self,
        id: RequestId,
        total_power: f64,
    ) -> Result<ConditionalUpdate, SolarRequestRepositoryError>;
}
