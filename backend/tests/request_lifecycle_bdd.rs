//! Behavioural tests for the request lifecycle.

use std::cell::RefCell;

use actix_web::http::header::AUTHORIZATION;
use actix_web::test as actix_test;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use serde_json::{Value, json};

use solar_backend::domain::Role;
use solar_backend::test_support::{Harness, SERVICE_TOKEN, panel};

struct LifecycleWorld {
    runner: actix_rt::SystemRunner,
    harness: Harness,
    customer: RefCell<Option<String>>,
    moderator: RefCell<Option<String>>,
    panel_id: RefCell<Option<String>>,
    request_id: RefCell<Option<String>>,
    last_status: RefCell<Option<u16>>,
}

impl LifecycleWorld {
    fn new() -> Self {
        Self {
            runner: actix_rt::System::new(),
            harness: Harness::new(),
            customer: RefCell::new(None),
            moderator: RefCell::new(None),
            panel_id: RefCell::new(None),
            request_id: RefCell::new(None),
            last_status: RefCell::new(None),
        }
    }

    fn customer(&self) -> String {
        self.customer.borrow().clone().expect("customer signed in")
    }

    fn moderator(&self) -> String {
        self.moderator.borrow().clone().expect("moderator signed in")
    }

    fn panel_id(&self) -> String {
        self.panel_id.borrow().clone().expect("panel seeded")
    }

    fn request_id(&self) -> String {
        self.request_id.borrow().clone().expect("request created")
    }

    fn send(&self, req: actix_test::TestRequest, token: Option<&str>) -> (u16, Value) {
        let req = match token {
            Some(token) => req.insert_header((AUTHORIZATION, format!("Bearer {token}"))),
            None => req,
        };
        let (status, body) = self.runner.block_on(async {
            let app = actix_test::init_service(self.harness.app()).await;
            let res = actix_test::call_service(&app, req.to_request()).await;
            let status = res.status().as_u16();
            (status, actix_test::read_body(res).await)
        });
        let body = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).expect("json body")
        };
        self.last_status.replace(Some(status));
        (status, body)
    }

    fn moderate(&self, token: &str, action: &str) {
        self.send(
            actix_test::TestRequest::put()
                .uri(&format!(
                    "/api/solarpanel-requests/{}/moderate",
                    self.request_id()
                ))
                .set_json(json!({"action": action})),
            Some(token),
        );
    }

    fn detail(&self) -> Value {
        let token = self.customer();
        let (status, body) = self.send(
            actix_test::TestRequest::get()
                .uri(&format!("/api/solarpanel-requests/{}", self.request_id())),
            Some(&token),
        );
        assert_eq!(status, 200, "detail should load: {body}");
        body
    }
}

#[fixture]
fn world() -> LifecycleWorld {
    LifecycleWorld::new()
}

#[given("a catalog panel rated {power} watts")]
fn a_catalog_panel(world: &LifecycleWorld, power: f64) {
    let seeded = panel("Mono", power, 1000, 1700);
    world.panel_id.replace(Some(seeded.id.to_string()));
    world.harness.store.seed_panel(seeded);
}

#[given("a signed-in customer")]
fn a_signed_in_customer(world: &LifecycleWorld) {
    let (_, token) = world.harness.sign_in("ada", Role::User);
    world.customer.replace(Some(token));
}

#[given("a signed-in moderator")]
fn a_signed_in_moderator(world: &LifecycleWorld) {
    let (_, token) = world.harness.sign_in("grace", Role::Moderator);
    world.moderator.replace(Some(token));
}

#[given("the customer has formed a request")]
fn the_customer_has_formed_a_request(world: &LifecycleWorld) {
    let token = world.customer();
    let panel_id = world.panel_id();
    let (status, body) = world.send(
        actix_test::TestRequest::post().uri(&format!("/api/panels/{panel_id}")),
        Some(&token),
    );
    assert_eq!(status, 201);
    let request_id = body["request_id"].as_str().expect("draft id").to_owned();
    world.request_id.replace(Some(request_id.clone()));

    let (status, _) = world.send(
        actix_test::TestRequest::put()
            .uri(&format!("/api/solarpanel-requests/{request_id}/{panel_id}"))
            .set_json(json!({"area": 12.5})),
        Some(&token),
    );
    assert_eq!(status, 200);
    let (status, _) = world.send(
        actix_test::TestRequest::put()
            .uri(&format!("/api/solarpanel-requests/{request_id}"))
            .set_json(json!({"insolation": 4.2})),
        Some(&token),
    );
    assert_eq!(status, 200);
    let (status, _) = world.send(
        actix_test::TestRequest::put()
            .uri(&format!("/api/solarpanel-requests/{request_id}/formate")),
        Some(&token),
    );
    assert_eq!(status, 200);
}

#[when("the moderator applies {action}")]
fn the_moderator_applies(world: &LifecycleWorld, action: String) {
    world.moderate(&world.moderator(), &action);
}

#[when("the customer applies {action}")]
fn the_customer_applies(world: &LifecycleWorld, action: String) {
    world.moderate(&world.customer(), &action);
}

#[when("the calculation service reports {power}")]
fn the_calculation_service_reports(world: &LifecycleWorld, power: f64) {
    world.send(
        actix_test::TestRequest::put()
            .uri(&format!(
                "/api/solarpanel-requests/{}/update-total-power",
                world.request_id()
            ))
            .set_json(json!({"token": SERVICE_TOKEN, "total_power": power})),
        None,
    );
}

#[when("the customer removes the panel")]
fn the_customer_removes_the_panel(world: &LifecycleWorld) {
    let token = world.customer();
    world.send(
        actix_test::TestRequest::delete().uri(&format!(
            "/api/solarpanel-requests/{}/{}",
            world.request_id(),
            world.panel_id()
        )),
        Some(&token),
    );
}

#[then("the last response status is {status}")]
fn the_last_response_status_is(world: &LifecycleWorld, status: u16) {
    assert_eq!(*world.last_status.borrow(), Some(status));
}

#[then("the request status is {status}")]
fn the_request_status_is(world: &LifecycleWorld, status: String) {
    assert_eq!(world.detail()["status"], status.as_str());
}

#[then("the request total power is {power}")]
fn the_request_total_power_is(world: &LifecycleWorld, power: f64) {
    assert_eq!(world.detail()["total_power"].as_f64(), Some(power));
}

#[scenario(
    path = "tests/features/request_lifecycle.feature",
    name = "A moderator completes a request and the calculator reports back"
)]
fn completed_request_receives_total_power(world: LifecycleWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/request_lifecycle.feature",
    name = "A moderator rejects a request"
)]
fn moderator_rejects_request(world: LifecycleWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/request_lifecycle.feature",
    name = "A formed request can no longer be edited"
)]
fn formed_request_is_read_only(world: LifecycleWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/request_lifecycle.feature",
    name = "Customers cannot moderate"
)]
fn customers_cannot_moderate(world: LifecycleWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/request_lifecycle.feature",
    name = "A request is moderated only once"
)]
fn request_is_moderated_once(world: LifecycleWorld) {
    drop(world);
}
