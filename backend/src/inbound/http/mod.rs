//! HTTP inbound adapter exposing REST endpoints.

pub mod auth;
pub mod body;
pub mod error;
pub mod health;
pub mod request_items;
pub mod solar_requests;
pub mod solar_requests_dto;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod users;
pub mod validation;

pub use error::ApiResult;

use actix_web::web;

/// Register every `/api` route and the JSON payload error handlers.
///
/// Literal segments (`/info`, `/formate`, `/moderate`,
/// `/update-total-power`) are registered ahead of the `{id}` and
/// `{id}/{panel_id}` patterns they would otherwise collide with.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    error::configure_payload_errors(cfg);
    cfg.service(
        web::scope("/api")
            .service(users::register)
            .service(users::login)
            .service(users::logout)
            .service(web::scope("/panels").service(request_items::add_panel))
            .service(
                web::scope("/solarpanel-requests")
                    .service(solar_requests::draft_info)
                    .service(solar_requests::list_requests)
                    .service(solar_requests::form_request)
                    .service(solar_requests::moderate_request)
                    .service(solar_requests::update_total_power)
                    .service(solar_requests::get_request)
                    .service(solar_requests::set_insolation)
                    .service(solar_requests::delete_request)
                    .service(request_items::resize_item)
                    .service(request_items::remove_item),
            ),
    );
}
