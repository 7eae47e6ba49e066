//! Request lifecycle handlers.
//!
//! ```text
//! GET    /api/solarpanel-requests/info
//! GET    /api/solarpanel-requests?status=formed&start_date=01-01-2026 00:00:00
//! GET    /api/solarpanel-requests/{id}
//! PUT    /api/solarpanel-requests/{id}                      {"insolation": 5.0}
//! PUT    /api/solarpanel-requests/{id}/formate
//! PUT    /api/solarpanel-requests/{id}/moderate             {"action": "completed"}
//! PUT    /api/solarpanel-requests/{id}/update-total-power   {"token": "…", "total_power": 1.5}
//! DELETE /api/solarpanel-requests/{id}
//! ```

use actix_web::{HttpResponse, delete, get, put, web};

use crate::domain::RequestFilter;
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::{Authenticated, MaybeAuthenticated};
use crate::inbound::http::body::DeferredBody;
use crate::inbound::http::solar_requests_dto::{
    DraftInfoResponse, ListQuery, RequestDetailResponse, RequestRow,
};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, parse_listing_date, parse_request_id, parse_status_filter,
};

fn parse_filter(query: &ListQuery) -> ApiResult<RequestFilter> {
    Ok(RequestFilter {
        status: parse_status_filter(query.status.as_deref())?,
        formed_from: parse_listing_date(query.start_date.as_deref(), FieldName::new("start_date"))?,
        formed_to: parse_listing_date(query.end_date.as_deref(), FieldName::new("end_date"))?,
    })
}

/// Cart summary; anonymous callers see an empty cart.
#[get("/info")]
pub async fn draft_info(
    state: web::Data<HttpState>,
    auth: MaybeAuthenticated,
) -> ApiResult<web::Json<DraftInfoResponse>> {
    let summary = state.requests_query.draft_summary(auth.0).await?;
    Ok(web::Json(DraftInfoResponse::from(summary)))
}

/// Formed and moderated requests visible to the caller.
#[get("")]
pub async fn list_requests(
    state: web::Data<HttpState>,
    auth: Authenticated,
    query: web::Query<ListQuery>,
) -> ApiResult<web::Json<Vec<RequestRow>>> {
    let filter = parse_filter(&query)?;
    let rows = state.requests_query.list(auth.principal, filter).await?;
    Ok(web::Json(rows.into_iter().map(RequestRow::from).collect()))
}

#[get("/{id}")]
pub async fn get_request(
    state: web::Data<HttpState>,
    auth: Authenticated,
    path: web::Path<String>,
) -> ApiResult<web::Json<RequestDetailResponse>> {
    let id = parse_request_id(&path)?;
    let request = state.requests_query.get(auth.principal, id).await?;
    Ok(web::Json(request.into()))
}

#[put("/{id}")]
pub async fn set_insolation(
    state: web::Data<HttpState>,
    auth: Authenticated,
    path: web::Path<String>,
    body: DeferredBody,
) -> ApiResult<web::Json<RequestDetailResponse>> {
    let id = parse_request_id(&path)?;
    let insolation = body.number(FieldName::new("insolation"));
    let request = state
        .requests
        .set_insolation(auth.principal, id, insolation)
        .await?;
    Ok(web::Json(request.into()))
}

/// Submit a draft for moderation.
#[put("/{id}/formate")]
pub async fn form_request(
    state: web::Data<HttpState>,
    auth: Authenticated,
    path: web::Path<String>,
) -> ApiResult<web::Json<RequestDetailResponse>> {
    let id = parse_request_id(&path)?;
    let request = state.requests.form(auth.principal, id).await?;
    Ok(web::Json(request.into()))
}

#[put("/{id}/moderate")]
pub async fn moderate_request(
    state: web::Data<HttpState>,
    auth: Authenticated,
    path: web::Path<String>,
    body: DeferredBody,
) -> ApiResult<web::Json<RequestDetailResponse>> {
    let id = parse_request_id(&path)?;
    let action = body.text(FieldName::new("action")).unwrap_or_default();
    let request = state.requests.moderate(auth.principal, id, &action).await?;
    Ok(web::Json(request.into()))
}

/// Callback from the calculation service; authenticated by the shared
/// service token in the body, not by a user session.
#[put("/{id}/update-total-power")]
pub async fn update_total_power(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    body: DeferredBody,
) -> ApiResult<web::Json<RequestDetailResponse>> {
    let token = body.text(FieldName::new("token")).unwrap_or_default();
    state.requests.authorize_callback(&token)?;
    let id = parse_request_id(&path)?;
    let total_power = body.number(FieldName::new("total_power"));
    let request = state
        .requests
        .record_total_power(id, &token, total_power)
        .await?;
    Ok(web::Json(request.into()))
}

#[delete("/{id}")]
pub async fn delete_request(
    state: web::Data<HttpState>,
    auth: Authenticated,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = parse_request_id(&path)?;
    state.requests.delete(auth.principal, id).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
#[path = "solar_requests_tests.rs"]
mod tests;
