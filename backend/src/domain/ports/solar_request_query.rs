//! Driving port for request reads.

use async_trait::async_trait;

use crate::domain::{
    DraftSummary, Error, Principal, RequestFilter, RequestId, RequestSummary, SolarPanelRequest,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SolarRequestQuery: Send + Sync {
    /// Cart summary; anonymous callers and callers without a draft get `None`.
    async fn draft_summary(
        &self,
        principal: Option<Principal>,
    ) -> Result<Option<DraftSummary>, Error>;

    /// Load one request visible to the caller.
    async fn get(
        &self,
        principal: Principal,
        request: RequestId,
    ) -> Result<SolarPanelRequest, Error>;

    /// List formed and moderated requests visible to the caller.
    async fn list(
        &self,
        principal: Principal,
        filter: RequestFilter,
    ) -> Result<Vec<RequestSummary>, Error>;
}
