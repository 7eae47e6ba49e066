//! End-to-end request lifecycle over the in-memory harness.

use actix_web::http::StatusCode;
use actix_web::http::header::AUTHORIZATION;
use actix_web::test as actix_test;
use rstest::{fixture, rstest};
use serde_json::{Value, json};

use solar_backend::domain::{Role, TRACE_ID_HEADER};
use solar_backend::test_support::{Harness, SERVICE_TOKEN, panel};

#[fixture]
fn harness() -> Harness {
    Harness::new()
}

fn auth(token: &str) -> (actix_web::http::header::HeaderName, String) {
    (AUTHORIZATION, format!("Bearer {token}"))
}

/// Seed two panels and return their ids.
fn seed_panels(harness: &Harness) -> (String, String) {
    let mono = panel("Mono 400", 400.0, 1000, 1700);
    let poly = panel("Poly 300", 300.0, 990, 1650);
    let ids = (mono.id.to_string(), poly.id.to_string());
    harness.store.seed_panel(mono);
    harness.store.seed_panel(poly);
    ids
}

macro_rules! send {
    ($app:expr, $req:expr) => {{
        let res = actix_test::call_service(&$app, $req.to_request()).await;
        let status = res.status();
        let body = actix_test::read_body(res).await;
        let json: Value = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).expect("json body")
        };
        (status, json)
    }};
}

#[rstest]
#[actix_web::test]
async fn draft_to_completed_with_calculated_power(harness: Harness) {
    let (mono, poly) = seed_panels(&harness);
    let (_, owner) = harness.sign_in("ada", Role::User);
    let (_, moderator) = harness.sign_in("grace", Role::Moderator);
    let app = actix_test::init_service(harness.app()).await;

    let (status, body) = send!(
        app,
        actix_test::TestRequest::get()
            .uri("/api/solarpanel-requests/info")
            .insert_header(auth(&owner))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"request_id": null, "panels_in_request": 0}));

    let (status, body) = send!(
        app,
        actix_test::TestRequest::post()
            .uri(&format!("/api/panels/{mono}"))
            .insert_header(auth(&owner))
    );
    assert_eq!(status, StatusCode::CREATED);
    let draft = body["request_id"].as_str().expect("draft id").to_owned();

    let (status, body) = send!(
        app,
        actix_test::TestRequest::post()
            .uri(&format!("/api/panels/{poly}"))
            .insert_header(auth(&owner))
    );
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["request_id"], draft.as_str());
    assert_eq!(body["panels_in_request"], 2);

    for (panel_id, area) in [(&mono, 12.5), (&poly, 8.0)] {
        let (status, _) = send!(
            app,
            actix_test::TestRequest::put()
                .uri(&format!("/api/solarpanel-requests/{draft}/{panel_id}"))
                .insert_header(auth(&owner))
                .set_json(json!({"area": area}))
        );
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = send!(
        app,
        actix_test::TestRequest::put()
            .uri(&format!("/api/solarpanel-requests/{draft}"))
            .insert_header(auth(&owner))
            .set_json(json!({"insolation": 4.2}))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["insolation"], 4.2);

    let (status, body) = send!(
        app,
        actix_test::TestRequest::put()
            .uri(&format!("/api/solarpanel-requests/{draft}/formate"))
            .insert_header(auth(&owner))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "formed");
    assert!(body["formed_at"].is_string());

    let (status, body) = send!(
        app,
        actix_test::TestRequest::get()
            .uri("/api/solarpanel-requests?status=formed")
            .insert_header(auth(&moderator))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().map(Vec::len), Some(1));
    assert_eq!(body[0]["creator"], "ada");

    let (status, body) = send!(
        app,
        actix_test::TestRequest::put()
            .uri(&format!("/api/solarpanel-requests/{draft}/moderate"))
            .insert_header(auth(&moderator))
            .set_json(json!({"action": "completed"}))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "completed");
    assert!(body["total_power"].is_null());

    let jobs = harness.dispatcher.jobs();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].request_id.to_string(), draft);
    assert_eq!(jobs[0].panels.len(), 2);

    let (status, body) = send!(
        app,
        actix_test::TestRequest::put()
            .uri(&format!("/api/solarpanel-requests/{draft}/update-total-power"))
            .set_json(json!({"token": SERVICE_TOKEN, "total_power": 3.14159}))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_power"], 3.14);

    let (status, body) = send!(
        app,
        actix_test::TestRequest::get()
            .uri("/api/solarpanel-requests")
            .insert_header(auth(&owner))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["status"], "completed");
    assert_eq!(body[0]["moderator"], "grace");

    let (_, body) = send!(
        app,
        actix_test::TestRequest::get()
            .uri("/api/solarpanel-requests/info")
            .insert_header(auth(&owner))
    );
    assert_eq!(body["panels_in_request"], 0);
}

#[rstest]
#[actix_web::test]
async fn same_panel_twice_is_a_conflict(harness: Harness) {
    let (mono, _) = seed_panels(&harness);
    let (_, owner) = harness.sign_in("ada", Role::User);
    let app = actix_test::init_service(harness.app()).await;

    let add = || {
        actix_test::TestRequest::post()
            .uri(&format!("/api/panels/{mono}"))
            .insert_header(auth(&owner))
    };
    let (first, _) = send!(app, add());
    let (second, body) = send!(app, add());
    assert_eq!(first, StatusCode::CREATED);
    assert_eq!(second, StatusCode::CONFLICT);
    assert_eq!(body["code"], "conflict");
}

#[rstest]
#[actix_web::test]
async fn concurrent_moderation_has_one_winner(harness: Harness) {
    let (mono, _) = seed_panels(&harness);
    let (owner_user, owner) = harness.sign_in("ada", Role::User);
    let (_, moderator) = harness.sign_in("grace", Role::Moderator);
    let app = actix_test::init_service(harness.app()).await;

    let (_, body) = send!(
        app,
        actix_test::TestRequest::post()
            .uri(&format!("/api/panels/{mono}"))
            .insert_header(auth(&owner))
    );
    let draft = body["request_id"].as_str().expect("draft id").to_owned();
    send!(
        app,
        actix_test::TestRequest::put()
            .uri(&format!("/api/solarpanel-requests/{draft}/{mono}"))
            .insert_header(auth(&owner))
            .set_json(json!({"area": 10.0}))
    );
    send!(
        app,
        actix_test::TestRequest::put()
            .uri(&format!("/api/solarpanel-requests/{draft}"))
            .insert_header(auth(&owner))
            .set_json(json!({"insolation": 5.0}))
    );
    let (status, _) = send!(
        app,
        actix_test::TestRequest::put()
            .uri(&format!("/api/solarpanel-requests/{draft}/formate"))
            .insert_header(auth(&owner))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(harness.store.draft_count(owner_user.id()), 0);

    let moderate = |action: &str| {
        actix_test::TestRequest::put()
            .uri(&format!("/api/solarpanel-requests/{draft}/moderate"))
            .insert_header(auth(&moderator))
            .set_json(json!({"action": action}))
            .to_request()
    };
    let (complete, reject) = futures::join!(
        actix_test::call_service(&app, moderate("completed")),
        actix_test::call_service(&app, moderate("rejected")),
    );
    // Completion parks on the dispatch while rejection commits first.
    assert_eq!(reject.status(), StatusCode::OK);
    assert_eq!(complete.status(), StatusCode::CONFLICT);
    assert_eq!(harness.dispatcher.jobs().len(), 1);

    let (status, body) = send!(
        app,
        actix_test::TestRequest::get()
            .uri(&format!("/api/solarpanel-requests/{draft}"))
            .insert_header(auth(&moderator))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "rejected");
    assert!(body["total_power"].is_null());
}

#[rstest]
#[actix_web::test]
async fn logout_revokes_the_token(harness: Harness) {
    harness.store.seed_user("ada", "correct horse", Role::User);
    let app = actix_test::init_service(harness.app()).await;

    let (status, body) = send!(
        app,
        actix_test::TestRequest::post()
            .uri("/api/login")
            .set_json(json!({"login": "ada", "password": "correct horse"}))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["is_moderator"], false);
    let token = body["access_token"].as_str().expect("token").to_owned();

    let (status, _) = send!(
        app,
        actix_test::TestRequest::post()
            .uri("/api/logout")
            .insert_header(auth(&token))
    );
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send!(
        app,
        actix_test::TestRequest::get()
            .uri("/api/solarpanel-requests")
            .insert_header(auth(&token))
    );
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "unauthorized");

    let (status, body) = send!(
        app,
        actix_test::TestRequest::get()
            .uri("/api/solarpanel-requests/info")
            .insert_header(auth(&token))
    );
    assert_eq!(status, StatusCode::OK);
    assert!(body["request_id"].is_null());
}

#[rstest]
#[actix_web::test]
async fn expired_tokens_are_rejected(harness: Harness) {
    let (_, owner) = harness.sign_in("ada", Role::User);
    let app = actix_test::init_service(harness.app()).await;
    harness.clock.advance_seconds(3601);

    let (status, _) = send!(
        app,
        actix_test::TestRequest::get()
            .uri("/api/solarpanel-requests")
            .insert_header(auth(&owner))
    );
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[rstest]
#[actix_web::test]
async fn strangers_cannot_read_or_delete_a_draft(harness: Harness) {
    let (mono, _) = seed_panels(&harness);
    let (_, owner) = harness.sign_in("ada", Role::User);
    let (_, stranger) = harness.sign_in("eve", Role::User);
    let app = actix_test::init_service(harness.app()).await;

    let (_, body) = send!(
        app,
        actix_test::TestRequest::post()
            .uri(&format!("/api/panels/{mono}"))
            .insert_header(auth(&owner))
    );
    let draft = body["request_id"].as_str().expect("draft id").to_owned();

    let (status, _) = send!(
        app,
        actix_test::TestRequest::get()
            .uri(&format!("/api/solarpanel-requests/{draft}"))
            .insert_header(auth(&stranger))
    );
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send!(
        app,
        actix_test::TestRequest::delete()
            .uri(&format!("/api/solarpanel-requests/{draft}"))
            .insert_header(auth(&stranger))
    );
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send!(
        app,
        actix_test::TestRequest::delete()
            .uri(&format!("/api/solarpanel-requests/{draft}"))
            .insert_header(auth(&owner))
    );
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send!(
        app,
        actix_test::TestRequest::get()
            .uri(&format!("/api/solarpanel-requests/{draft}"))
            .insert_header(auth(&owner))
    );
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[rstest]
#[actix_web::test]
async fn callback_with_wrong_token_is_unauthorized(harness: Harness) {
    let app = actix_test::init_service(harness.app()).await;
    let req = actix_test::TestRequest::put()
        .uri(&format!(
            "/api/solarpanel-requests/{}/update-total-power",
            uuid::Uuid::new_v4()
        ))
        .set_json(json!({"token": "guess", "total_power": 1.0}))
        .to_request();
    let res = actix_test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert!(res.headers().contains_key(TRACE_ID_HEADER));
}

#[rstest]
#[actix_web::test]
async fn withdrawn_panels_cannot_be_added(harness: Harness) {
    let withdrawn = panel("Legacy 150", 150.0, 800, 1200);
    let id = withdrawn.id;
    harness.store.seed_panel(withdrawn);
    harness.store.soft_delete_panel(id);
    let (owner_user, owner) = harness.sign_in("ada", Role::User);
    let app = actix_test::init_service(harness.app()).await;

    let (status, body) = send!(
        app,
        actix_test::TestRequest::post()
            .uri(&format!("/api/panels/{id}"))
            .insert_header(auth(&owner))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_request");
    assert_eq!(harness.store.draft_count(owner_user.id()), 0);
}

#[rstest]
#[actix_web::test]
async fn failed_dispatch_leaves_the_request_formed(harness: Harness) {
    let (mono, _) = seed_panels(&harness);
    let (_, owner) = harness.sign_in("ada", Role::User);
    let (_, moderator) = harness.sign_in("grace", Role::Moderator);
    let app = actix_test::init_service(harness.app()).await;

    let (_, body) = send!(
        app,
        actix_test::TestRequest::post()
            .uri(&format!("/api/panels/{mono}"))
            .insert_header(auth(&owner))
    );
    let draft = body["request_id"].as_str().expect("draft id").to_owned();
    send!(
        app,
        actix_test::TestRequest::put()
            .uri(&format!("/api/solarpanel-requests/{draft}/{mono}"))
            .insert_header(auth(&owner))
            .set_json(json!({"area": 6.0}))
    );
    send!(
        app,
        actix_test::TestRequest::put()
            .uri(&format!("/api/solarpanel-requests/{draft}"))
            .insert_header(auth(&owner))
            .set_json(json!({"insolation": 3.5}))
    );
    send!(
        app,
        actix_test::TestRequest::put()
            .uri(&format!("/api/solarpanel-requests/{draft}/formate"))
            .insert_header(auth(&owner))
    );

    harness.dispatcher.fail_with_transport_error(true);
    let (status, _) = send!(
        app,
        actix_test::TestRequest::put()
            .uri(&format!("/api/solarpanel-requests/{draft}/moderate"))
            .insert_header(auth(&moderator))
            .set_json(json!({"action": "completed"}))
    );
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(harness.dispatcher.jobs().is_empty());

    let (status, body) = send!(
        app,
        actix_test::TestRequest::get()
            .uri(&format!("/api/solarpanel-requests/{draft}"))
            .insert_header(auth(&moderator))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "formed");

    harness.dispatcher.fail_with_transport_error(false);
    let (status, body) = send!(
        app,
        actix_test::TestRequest::put()
            .uri(&format!("/api/solarpanel-requests/{draft}/moderate"))
            .insert_header(auth(&moderator))
            .set_json(json!({"action": "completed"}))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "completed");
    assert_eq!(harness.dispatcher.jobs().len(), 1);
}

#[rstest]
#[actix_web::test]
async fn malformed_bodies_respect_error_precedence(harness: Harness) {
    let (mono, _) = seed_panels(&harness);
    let (_, owner) = harness.sign_in("ada", Role::User);
    let (_, stranger) = harness.sign_in("eve", Role::User);
    let app = actix_test::init_service(harness.app()).await;

    let (_, body) = send!(
        app,
        actix_test::TestRequest::post()
            .uri(&format!("/api/panels/{mono}"))
            .insert_header(auth(&owner))
    );
    let draft = body["request_id"].as_str().expect("draft id").to_owned();
    let resize = |token: &str| {
        actix_test::TestRequest::put()
            .uri(&format!("/api/solarpanel-requests/{draft}/{mono}"))
            .insert_header(auth(token))
            .set_json(json!({"area": "big"}))
    };

    let (status, body) = send!(app, resize(&stranger));
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "forbidden");

    let (status, body) = send!(app, resize(&owner));
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_request");
    assert_eq!(body["details"]["field"], "area");

    let (status, body) = send!(
        app,
        actix_test::TestRequest::put()
            .uri(&format!("/api/solarpanel-requests/{}", uuid::Uuid::new_v4()))
            .insert_header(auth(&owner))
            .insert_header(("content-type", "application/json"))
            .set_payload("not json")
    );
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");

    let (status, body) = send!(
        app,
        actix_test::TestRequest::post()
            .uri("/api/login")
            .insert_header(("content-type", "application/json"))
            .set_payload(r#"{"login": 42}"#)
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_request");
    assert_eq!(body["details"]["part"], "body");
}
