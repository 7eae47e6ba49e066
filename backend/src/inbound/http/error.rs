//! Domain errors on the wire.
//!
//! Every failure leaves as `{code, message, traceId?, details?}` with the
//! matching status and a `trace-id` header. Internal failures are logged in
//! full and answered with a fixed message. Body and query parse failures are
//! routed through the same payload so clients never see framework text.

use actix_web::error::{JsonPayloadError, QueryPayloadError};
use actix_web::{HttpRequest, HttpResponse, ResponseError, http::StatusCode, web};
use serde_json::json;
use tracing::{debug, error};

use crate::domain::{Error, ErrorCode, TRACE_ID_HEADER};

/// Handler result; the error renders through [`ResponseError`].
pub type ApiResult<T> = Result<T, Error>;

const INTERNAL_MESSAGE: &str = "Internal server error";

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        match self.code() {
            ErrorCode::InvalidRequest => StatusCode::BAD_REQUEST,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut response = HttpResponse::build(self.status_code());
        if let Some(id) = self.trace_id() {
            response.insert_header((TRACE_ID_HEADER, id.to_owned()));
        }
        if self.code() != ErrorCode::InternalError {
            return response.json(self);
        }

        error!(message = self.message(), trace_id = ?self.trace_id(), "internal error redacted");
        let public = match self.trace_id() {
            Some(id) => Error::internal(INTERNAL_MESSAGE).with_trace_id(id.to_owned()),
            None => Error::internal(INTERNAL_MESSAGE),
        };
        response.json(public)
    }
}

fn malformed(part: &str, reason: &str) -> Error {
    Error::invalid_request(format!("request {part} could not be read"))
        .with_details(json!({ "code": "malformed_input", "part": part, "reason": reason }))
}

fn json_reason(err: &JsonPayloadError) -> &'static str {
    match err {
        JsonPayloadError::ContentType => "unsupported_content_type",
        JsonPayloadError::Overflow { .. } | JsonPayloadError::OverflowKnownLength { .. } => {
            "too_large"
        }
        JsonPayloadError::Deserialize(_) | JsonPayloadError::Serialize(_) => "invalid_json",
        _ => "unreadable",
    }
}

/// `JsonConfig` error handler for typed bodies.
pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    debug!(error = %err, "rejected request body");
    malformed("body", json_reason(&err)).into()
}

/// `QueryConfig` error handler for typed query strings.
pub fn query_error_handler(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    debug!(error = %err, "rejected query string");
    malformed("query", "invalid_query").into()
}

/// Install the payload error handlers on a service config.
pub fn configure_payload_errors(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(web::QueryConfig::default().error_handler(query_error_handler));
}

#[cfg(test)]
mod tests;
