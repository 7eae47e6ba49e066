//! `CalculationDispatcher` that POSTs jobs to the calculation service.
//!
//! The body is `{request_id, panels: [{area, power, height, width}],
//! insolation}`. Only `200 OK` counts as accepted; the computed total
//! arrives later through the update-total-power callback.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::ports::{CalculationDispatchError, CalculationDispatcher, CalculationJob};

/// Failure to build the HTTP client.
#[derive(Debug, thiserror::Error)]
#[error("failed to build calculation client: {0}")]
pub struct HttpDispatcherError(#[from] reqwest::Error);

#[derive(Debug, Serialize)]
struct PanelPayload {
    area: f64,
    power: f64,
    height: i32,
    width: i32,
}

#[derive(Debug, Serialize)]
struct JobPayload {
    request_id: Uuid,
    panels: Vec<PanelPayload>,
    insolation: f64,
}

impl From<&CalculationJob> for JobPayload {
    fn from(job: &CalculationJob) -> Self {
        Self {
            request_id: *job.request_id.as_uuid(),
            panels: job
                .panels
                .iter()
                .map(|panel| PanelPayload {
                    area: panel.area,
                    power: panel.power,
                    height: panel.height,
                    width: panel.width,
                })
                .collect(),
            insolation: job.insolation,
        }
    }
}

/// Production dispatcher backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpCalculationDispatcher {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpCalculationDispatcher {
    /// Build a dispatcher posting to `endpoint`, giving up after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`HttpDispatcherError`] when the TLS backend cannot be
    /// initialised.
    pub fn new(
        endpoint: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, HttpDispatcherError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

fn map_transport_error(error: reqwest::Error) -> CalculationDispatchError {
    if error.is_timeout() {
        CalculationDispatchError::timeout(error.to_string())
    } else {
        CalculationDispatchError::transport(error.to_string())
    }
}

#[async_trait]
impl CalculationDispatcher for HttpCalculationDispatcher {
    #[tracing::instrument(skip(self, job), fields(request_id = %job.request_id))]
    async fn dispatch(&self, job: &CalculationJob) -> Result<(), CalculationDispatchError> {
        debug!(endpoint = %self.endpoint, items = job.panels.len(), "dispatching calculation job");
        let response = self
            .client
            .post(&self.endpoint)
            .json(&JobPayload::from(job))
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            warn!(status = status.as_u16(), "calculation service rejected job");
            return Err(CalculationDispatchError::rejected(status.as_u16()));
        }
        Ok(())
    }
}
