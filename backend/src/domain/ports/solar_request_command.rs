//! Driving port for request lifecycle mutations.
//!
//! Content values arrive unvalidated so the service can check them after
//! lookup and authorisation. Failures follow a fixed precedence: missing
//! request, then ownership or role, then wrong status, then content.

use async_trait::async_trait;

use crate::domain::{
    DraftSummary, Error, NumericField, PanelId, Principal, RequestId, SolarPanelRequest,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SolarRequestCommand: Send + Sync {
    /// Add `panel` to the caller's draft, creating the draft if needed.
    async fn add_panel(&self, principal: Principal, panel: PanelId)
    -> Result<DraftSummary, Error>;

    /// Drop an item from a draft. Owners and moderators may do this.
    async fn remove_item(
        &self,
        principal: Principal,
        request: RequestId,
        panel: PanelId,
    ) -> Result<SolarPanelRequest, Error>;

    /// Change the installed area of a draft item.
    async fn resize_item(
        &self,
        principal: Principal,
        request: RequestId,
        panel: PanelId,
        area: NumericField,
    ) -> Result<SolarPanelRequest, Error>;

    /// Set the site insolation on a draft.
    async fn set_insolation(
        &self,
        principal: Principal,
        request: RequestId,
        insolation: NumericField,
    ) -> Result<SolarPanelRequest, Error>;

    /// Submit a draft for moderation.
    async fn form(
        &self,
        principal: Principal,
        request: RequestId,
    ) -> Result<SolarPanelRequest, Error>;

    /// Complete or reject a formed request.
    async fn moderate(
        &self,
        principal: Principal,
        request: RequestId,
        action: &str,
    ) -> Result<SolarPanelRequest, Error>;

    /// Soft-delete a draft.
    async fn delete(&self, principal: Principal, request: RequestId) -> Result<(), Error>;

    /// Check the shared secret the calculation service presents. Runs before
    /// anything about the target request is looked at.
    fn authorize_callback(&self, service_token: &str) -> Result<(), Error>;

    /// Accept the calculator's result for a completed request.
    async fn record_total_power(
        &self,
        request: RequestId,
        service_token: &str,
        total_power: NumericField,
    ) -> Result<SolarPanelRequest, Error>;
}
