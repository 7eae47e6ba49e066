//! Request lifecycle service implementing the command and query ports.
//!
//! Every mutation follows the same sequence: load the request, check the
//! caller's ownership or role, check the current status, validate content,
//! then write with a status-guarded update. A guarded write that matches no
//! row is re-examined to tell a concurrent transition (`Conflict`) from a
//! request that no longer exists (`NotFound`).

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::{info, warn};
use zeroize::Zeroizing;

use crate::domain::ports::{
    CalculationDispatcher, CalculationJob, ConditionalUpdate, PanelRepository,
    RequestItemRepository, SolarRequestCommand, SolarRequestQuery, SolarRequestRepository,
    StatusTransition,
};
use crate::domain::session_gate::require_role;
use crate::domain::{
    AccessDenied, Area, DraftSummary, Error, Insolation, ListScope, ModeratorDecision,
    NumericField, PanelId, PowerCalculationError, Principal, RequestFilter, RequestId,
    RequestStatus, RequestSummary, Role, SolarPanelRequest, TotalPower, round_to_hundredths,
};

/// Largest gap between a reported and a locally computed total that still
/// counts as agreement; both are rounded to hundredths.
const POWER_TOLERANCE: f64 = 0.005;

/// Lifecycle engine for solar panel requests.
#[derive(Clone)]
pub struct SolarRequestService<R, I, P> {
    requests: Arc<R>,
    items: Arc<I>,
    panels: Arc<P>,
    dispatcher: Arc<dyn CalculationDispatcher>,
    clock: Arc<dyn Clock>,
    service_token: Arc<Zeroizing<String>>,
}

impl<R, I, P> SolarRequestService<R, I, P> {
    /// Create a service over the given repositories.
    ///
    /// `service_token` is the shared secret the calculation callback must
    /// present.
    pub fn new(
        requests: Arc<R>,
        items: Arc<I>,
        panels: Arc<P>,
        dispatcher: Arc<dyn CalculationDispatcher>,
        clock: Arc<dyn Clock>,
        service_token: impl Into<String>,
    ) -> Self {
        Self {
            requests,
            items,
            panels,
            dispatcher,
            clock,
            service_token: Arc::new(Zeroizing::new(service_token.into())),
        }
    }
}

fn denied(reason: AccessDenied) -> Error {
    Error::forbidden(reason.to_string())
}

fn request_not_found(id: RequestId) -> Error {
    Error::not_found(format!("request {id} not found"))
}

/// A live request in the wrong state has moved on; that is a conflict, not
/// a missing row.
fn require_status(request: &SolarPanelRequest, expected: RequestStatus) -> Result<(), Error> {
    if request.status == expected {
        Ok(())
    } else {
        Err(Error::conflict(format!(
            "request {} is {}; expected {expected}",
            request.id, request.status
        )))
    }
}

/// The local formula's total when it disagrees with the reported one.
fn diverging_local_power(
    request: &SolarPanelRequest,
) -> Result<Option<f64>, PowerCalculationError> {
    let Some(reported) = request.total_power else {
        return Ok(None);
    };
    let expected = request.expected_total_power()?;
    Ok(((expected - reported).abs() >= POWER_TOLERANCE).then_some(expected))
}

/// Log a reported total the local formula does not reproduce. The reported
/// value stays authoritative.
fn check_reported_power(request: &SolarPanelRequest) {
    match diverging_local_power(request) {
        Ok(None) => {}
        Ok(Some(expected)) => warn!(
            request_id = %request.id,
            reported = ?request.total_power,
            expected,
            "reported total power differs from the local calculation"
        ),
        Err(err) => warn!(
            request_id = %request.id,
            error = %err,
            "local total power could not be evaluated"
        ),
    }
}

fn item_not_found(request: RequestId, panel: PanelId) -> Error {
    Error::not_found(format!("panel {panel} is not part of request {request}"))
}

/// Content fields are optional on the wire; absence is a content error and
/// therefore reported only after lookup and authorisation succeeded.
fn required(value: NumericField, field: &str) -> Result<f64, Error> {
    let (message, code) = match value {
        NumericField::Value(number) => return Ok(number),
        NumericField::Missing => (format!("missing required field: {field}"), "missing_field"),
        NumericField::Malformed => (format!("{field} must be a number"), "not_a_number"),
    };
    Err(Error::invalid_request(message)
        .with_details(serde_json::json!({ "field": field, "code": code })))
}

fn tokens_match(expected: &str, presented: &str) -> bool {
    expected.len() == presented.len()
        && expected
            .bytes()
            .zip(presented.bytes())
            .fold(0_u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

impl<R, I, P> SolarRequestService<R, I, P>
where
    R: SolarRequestRepository,
    I: RequestItemRepository,
    P: PanelRepository,
{
    /// Load a live request. Soft-deleted requests count as missing.
    async fn load(&self, id: RequestId) -> Result<SolarPanelRequest, Error> {
        match self
            .requests
            .find_by_id(id)
            .await
            .map_err(Error::from)?
        {
            Some(request) if request.status != RequestStatus::Deleted => Ok(request),
            _ => Err(request_not_found(id)),
        }
    }

    /// Load a draft the caller owns.
    async fn load_owned_draft(
        &self,
        principal: &Principal,
        id: RequestId,
    ) -> Result<SolarPanelRequest, Error> {
        let request = self.load(id).await?;
        request.ensure_owner(principal).map_err(denied)?;
        require_status(&request, RequestStatus::Draft)?;
        Ok(request)
    }

    /// Classify a guarded write that matched no row.
    async fn stale_state(&self, id: RequestId, expected: RequestStatus) -> Error {
        match self.requests.status_of(id).await {
            Ok(Some(status)) if status != RequestStatus::Deleted => Error::conflict(format!(
                "request {id} is {status}; expected {expected}"
            )),
            Ok(_) => request_not_found(id),
            Err(err) => Error::from(err),
        }
    }

    /// Classify an item write on a draft that matched no row.
    async fn stale_item(&self, request: RequestId, panel: PanelId) -> Error {
        match self.requests.status_of(request).await {
            Ok(Some(RequestStatus::Draft)) => item_not_found(request, panel),
            Ok(_) => self.stale_state(request, RequestStatus::Draft).await,
            Err(err) => Error::from(err),
        }
    }

    async fn apply_transition(&self, transition: StatusTransition) -> Result<(), Error> {
        let outcome = self
            .requests
            .transition(transition)
            .await
            .map_err(Error::from)?;
        if !outcome.is_applied() {
            return Err(self.stale_state(transition.id, transition.from).await);
        }
        info!(
            request_id = %transition.id,
            from = %transition.from,
            to = %transition.to,
            "request transitioned"
        );
        Ok(())
    }
}

#[async_trait]
impl<R, I, P> SolarRequestCommand for SolarRequestService<R, I, P>
where
    R: SolarRequestRepository,
    I: RequestItemRepository,
    P: PanelRepository,
{
    async fn add_panel(
        &self,
        principal: Principal,
        panel_id: PanelId,
    ) -> Result<DraftSummary, Error> {
        let panel = self
            .panels
            .find_by_id(panel_id)
            .await
            .map_err(Error::from)?
            .ok_or_else(|| Error::not_found(format!("panel {panel_id} not found")))?;
        if panel.is_deleted {
            return Err(Error::invalid_request(format!(
                "panel {panel_id} has been withdrawn from the catalog"
            )));
        }

        let creator = principal.user_id();
        let request_id = self
            .requests
            .find_or_create_draft(creator, self.clock.utc())
            .await
            .map_err(Error::from)?;

        match self
            .items
            .insert(request_id, panel_id)
            .await
            .map_err(Error::from)?
        {
            ConditionalUpdate::Applied => {}
            ConditionalUpdate::NoMatch => {
                return Err(self.stale_state(request_id, RequestStatus::Draft).await);
            }
        }
        info!(request_id = %request_id, panel_id = %panel_id, "panel added to draft");

        self.requests
            .draft_summary(creator)
            .await
            .map_err(Error::from)?
            .ok_or_else(|| Error::conflict(format!("draft {request_id} changed concurrently")))
    }

    async fn remove_item(
        &self,
        principal: Principal,
        request_id: RequestId,
        panel_id: PanelId,
    ) -> Result<SolarPanelRequest, Error> {
        let request = self.load(request_id).await?;
        request
            .ensure_owner_or_moderator(&principal)
            .map_err(denied)?;
        require_status(&request, RequestStatus::Draft)?;
        if request.item(panel_id).is_none() {
            return Err(item_not_found(request_id, panel_id));
        }

        let outcome = self
            .items
            .remove(request_id, panel_id)
            .await
            .map_err(Error::from)?;
        if !outcome.is_applied() {
            return Err(self.stale_item(request_id, panel_id).await);
        }
        self.load(request_id).await
    }

    async fn resize_item(
        &self,
        principal: Principal,
        request_id: RequestId,
        panel_id: PanelId,
        area: NumericField,
    ) -> Result<SolarPanelRequest, Error> {
        let request = self.load_owned_draft(&principal, request_id).await?;
        if request.item(panel_id).is_none() {
            return Err(item_not_found(request_id, panel_id));
        }
        let area = Area::try_new(required(area, "area")?)
            .map_err(|err| Error::invalid_request(err.to_string()))?;

        let outcome = self
            .items
            .resize(request_id, panel_id, area.value())
            .await
            .map_err(Error::from)?;
        if !outcome.is_applied() {
            return Err(self.stale_item(request_id, panel_id).await);
        }
        self.load(request_id).await
    }

    async fn set_insolation(
        &self,
        principal: Principal,
        request_id: RequestId,
        insolation: NumericField,
    ) -> Result<SolarPanelRequest, Error> {
        self.load_owned_draft(&principal, request_id).await?;
        let insolation = Insolation::try_new(required(insolation, "insolation")?)
            .map_err(|err| Error::invalid_request(err.to_string()))?;

        let outcome = self
            .requests
            .update_insolation(request_id, insolation.value())
            .await
            .map_err(Error::from)?;
        if !outcome.is_applied() {
            return Err(self.stale_state(request_id, RequestStatus::Draft).await);
        }
        self.load(request_id).await
    }

    async fn form(
        &self,
        principal: Principal,
        request_id: RequestId,
    ) -> Result<SolarPanelRequest, Error> {
        let request = self.load_owned_draft(&principal, request_id).await?;
        request
            .validate_for_forming()
            .map_err(|err| Error::invalid_request(err.to_string()))?;

        self.apply_transition(StatusTransition {
            id: request_id,
            from: RequestStatus::Draft,
            to: RequestStatus::Formed,
            at: self.clock.utc(),
            moderator: None,
        })
        .await?;
        self.load(request_id).await
    }

    async fn moderate(
        &self,
        principal: Principal,
        request_id: RequestId,
        action: &str,
    ) -> Result<SolarPanelRequest, Error> {
        let request = self.load(request_id).await?;
        require_role(&principal, &[Role::Moderator])?;
        // Drafts are private to their owner until formed.
        if request.status == RequestStatus::Draft {
            return Err(request_not_found(request_id));
        }
        require_status(&request, RequestStatus::Formed)?;
        let decision = action
            .parse::<ModeratorDecision>()
            .map_err(|err| Error::invalid_request(err.to_string()))?;

        if decision == ModeratorDecision::Completed {
            let job = CalculationJob {
                request_id,
                insolation: request.insolation,
                panels: request.power_inputs(),
            };
            self.dispatcher
                .dispatch(&job)
                .await
                .map_err(Error::from)?;
        }

        self.apply_transition(StatusTransition {
            id: request_id,
            from: RequestStatus::Formed,
            to: decision.target_status(),
            at: self.clock.utc(),
            moderator: Some(principal.user_id()),
        })
        .await?;
        self.load(request_id).await
    }

    async fn delete(&self, principal: Principal, request_id: RequestId) -> Result<(), Error> {
        self.load_owned_draft(&principal, request_id).await?;
        self.apply_transition(StatusTransition {
            id: request_id,
            from: RequestStatus::Draft,
            to: RequestStatus::Deleted,
            at: self.clock.utc(),
            moderator: None,
        })
        .await
    }

    fn authorize_callback(&self, service_token: &str) -> Result<(), Error> {
        if tokens_match(self.service_token.as_str(), service_token) {
            Ok(())
        } else {
            warn!("calculation callback presented a bad token");
            Err(Error::unauthorized("invalid service token"))
        }
    }

    async fn record_total_power(
        &self,
        request_id: RequestId,
        service_token: &str,
        total_power: NumericField,
    ) -> Result<SolarPanelRequest, Error> {
        self.authorize_callback(service_token)?;

        match self
            .requests
            .status_of(request_id)
            .await
            .map_err(Error::from)?
        {
            None | Some(RequestStatus::Deleted) => return Err(request_not_found(request_id)),
            Some(RequestStatus::Completed) => {}
            Some(status) => {
                return Err(Error::conflict(format!(
                    "request {request_id} is {status}; expected completed"
                )));
            }
        }
        let total_power = TotalPower::try_new(required(total_power, "total_power")?)
            .map_err(|err| Error::invalid_request(err.to_string()))?;

        let outcome = self
            .requests
            .update_total_power(request_id, round_to_hundredths(total_power.value()))
            .await
            .map_err(Error::from)?;
        if !outcome.is_applied() {
            return Err(self
                .stale_state(request_id, RequestStatus::Completed)
                .await);
        }
        info!(request_id = %request_id, "total power recorded");
        let request = self.load(request_id).await?;
        check_reported_power(&request);
        Ok(request)
    }
}

#[async_trait]
impl<R, I, P> SolarRequestQuery for SolarRequestService<R, I, P>
where
    R: SolarRequestRepository,
    I: RequestItemRepository,
    P: PanelRepository,
{
    async fn draft_summary(
        &self,
        principal: Option<Principal>,
    ) -> Result<Option<DraftSummary>, Error> {
        let Some(principal) = principal else {
            return Ok(None);
        };
        self.requests
            .draft_summary(principal.user_id())
            .await
            .map_err(Error::from)
    }

    async fn get(
        &self,
        principal: Principal,
        request_id: RequestId,
    ) -> Result<SolarPanelRequest, Error> {
        let request = self.load(request_id).await?;
        request
            .ensure_owner_or_moderator(&principal)
            .map_err(denied)?;
        Ok(request)
    }

    async fn list(
        &self,
        principal: Principal,
        filter: RequestFilter,
    ) -> Result<Vec<RequestSummary>, Error> {
        if filter.status.is_some_and(|status| !status.is_listed()) {
            return Ok(Vec::new());
        }
        self.requests
            .list(ListScope::for_principal(&principal), filter)
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
#[path = "solar_request_service_tests.rs"]
mod tests;
