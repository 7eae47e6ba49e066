//! Read-only port over the panel catalog.

use async_trait::async_trait;

use crate::domain::{Panel, PanelId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by panel catalog adapters.
    pub enum PanelRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            InternalError, "panel repository connection failed: {message}",
        /// Query failed during execution.
        Query { message: String } => InternalError, "panel repository query failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PanelRepository: Send + Sync {
    /// Fetch a panel, including soft-deleted ones.
    async fn find_by_id(&self, id: PanelId) -> Result<Option<Panel>, PanelRepositoryError>;
}
