//! Port for line-item mutations on draft requests.
//!
//! All writes are scoped to a parent request whose status is still `draft`;
//! a write against any other parent matches nothing.

use async_trait::async_trait;

use crate::domain::{PanelId, RequestId};

use super::{ConditionalUpdate, define_port_error};

define_port_error! {
    /// Errors raised by line-item repository adapters.
    pub enum RequestItemRepositoryError {
        /// The panel is already part of the request.
        Duplicate { message: String } =>
            Conflict, "{message}",
        /// Repository connection could not be established.
        Connection { message: String } =>
            InternalError, "request item repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            InternalError, "request item repository query failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RequestItemRepository: Send + Sync {
    /// Attach `panel` to the draft `request` with an unset area.
    async fn insert(
        &self,
        request: RequestId,
        panel: PanelId,
    ) -> Result<ConditionalUpdate, RequestItemRepositoryError>;

    /// Detach `panel` from the draft `request`.
    async fn remove(
        &self,
        request: RequestId,
        panel: PanelId,
    ) -> Result<ConditionalUpdate, RequestItemRepositoryError>;

    /// Change the installed area of an item on the draft `request`.
    async fn resize(
        &self,
        request: RequestId,
        panel: PanelId,
        area: f64,
    ) -> Result<ConditionalUpdate, RequestItemRepositoryError>;
}
