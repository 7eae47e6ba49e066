//! Tests for HTTP error mapping.

use super::*;
use actix_web::ResponseError;
use actix_web::body::to_bytes;
use actix_web::http::StatusCode;
use rstest::{fixture, rstest};
use serde_json::json;

const TRACE_ID: &str = "00000000-0000-0000-0000-000000000000";

#[fixture]
fn expected_trace_id() -> String {
    TRACE_ID.to_owned()
}

#[rstest]
#[case(Error::invalid_request("bad"), StatusCode::BAD_REQUEST)]
#[case(Error::unauthorized("no auth"), StatusCode::UNAUTHORIZED)]
#[case(Error::forbidden("denied"), StatusCode::FORBIDDEN)]
#[case(Error::not_found("missing"), StatusCode::NOT_FOUND)]
#[case(Error::conflict("stale"), StatusCode::CONFLICT)]
#[case(Error::internal("boom"), StatusCode::INTERNAL_SERVER_ERROR)]
fn status_code_matches_error_code(#[case] err: Error, #[case] status: StatusCode) {
    assert_eq!(ResponseError::status_code(&err), status);
}

async fn render(error: Error) -> (StatusCode, Option<String>, Error) {
    let response = ResponseError::error_response(&error);
    let status = response.status();
    let header = response
        .headers()
        .get(TRACE_ID_HEADER)
        .map(|value| value.to_str().expect("ascii header").to_owned());
    let bytes = to_bytes(response.into_body())
        .await
        .expect("reading response body succeeds");
    let payload = serde_json::from_slice(&bytes).expect("Error JSON deserialisation succeeds");
    (status, header, payload)
}

#[rstest]
#[actix_web::test]
async fn internal_errors_are_redacted(expected_trace_id: String) {
    let error = Error::internal("connection refused on 10.0.0.3")
        .with_trace_id(expected_trace_id.clone())
        .with_details(json!({"secret": "x"}));

    let (status, header, payload) = render(error).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(header.as_deref(), Some(expected_trace_id.as_str()));
    assert_eq!(payload.code(), ErrorCode::InternalError);
    assert_eq!(payload.message(), "Internal server error");
    assert!(payload.details().is_none());
}

#[rstest]
#[actix_web::test]
async fn client_errors_keep_message_and_details(expected_trace_id: String) {
    let error = Error::invalid_request("area must be positive")
        .with_trace_id(expected_trace_id.clone())
        .with_details(json!({"field": "area"}));

    let (status, header, payload) = render(error).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(header.as_deref(), Some(expected_trace_id.as_str()));
    assert_eq!(payload.message(), "area must be positive");
    assert_eq!(payload.details(), Some(&json!({"field": "area"})));
}

#[rstest]
#[actix_web::test]
async fn error_without_trace_id_omits_trace_header() {
    let (status, header, payload) = render(Error::conflict("stale")).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(header.is_none());
    assert_eq!(payload.trace_id(), None);
}

#[rstest]
#[case(JsonPayloadError::ContentType, "unsupported_content_type")]
#[case(JsonPayloadError::Overflow { limit: 8 }, "too_large")]
#[case(
    JsonPayloadError::Deserialize(
        serde_json::from_str::<serde_json::Value>("{").expect_err("truncated")
    ),
    "invalid_json"
)]
fn body_errors_are_classified(#[case] err: JsonPayloadError, #[case] reason: &str) {
    assert_eq!(json_reason(&err), reason);
}

#[rstest]
#[actix_web::test]
async fn bad_bodies_render_as_domain_errors() {
    use actix_web::{App, post, test as actix_test};

    #[derive(serde::Deserialize)]
    struct Body {
        count: u32,
    }

    #[post("/")]
    async fn accept(body: web::Json<Body>) -> HttpResponse {
        HttpResponse::Ok().body(body.count.to_string())
    }

    let app =
        actix_test::init_service(App::new().configure(configure_payload_errors).service(accept))
            .await;
    let req = actix_test::TestRequest::post()
        .uri("/")
        .insert_header(("content-type", "application/json"))
        .set_payload(r#"{"count": "many"}"#)
        .to_request();
    let res = actix_test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let payload: Error = actix_test::read_body_json(res).await;
    assert_eq!(payload.code(), ErrorCode::InvalidRequest);
    assert_eq!(payload.message(), "request body could not be read");
    let details = payload.details().expect("details");
    assert_eq!(details["reason"], "invalid_json");
    assert!(!payload.message().contains("many"));
}
