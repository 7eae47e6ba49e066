//! Line item handlers.
//!
//! ```text
//! POST   /api/panels/{panel_id}
//! PUT    /api/solarpanel-requests/{id}/{panel_id}   {"area": 12.5}
//! DELETE /api/solarpanel-requests/{id}/{panel_id}
//! ```

use actix_web::{HttpResponse, delete, post, put, web};

use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::Authenticated;
use crate::inbound::http::body::DeferredBody;
use crate::inbound::http::solar_requests_dto::{AddedItemResponse, RequestDetailResponse};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_panel_id, parse_request_id};

/// Put a panel into the caller's draft, opening one when none exists.
#[post("/{panel_id}")]
pub async fn add_panel(
    state: web::Data<HttpState>,
    auth: Authenticated,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let panel = parse_panel_id(&path)?;
    let summary = state.requests.add_panel(auth.principal, panel).await?;
    Ok(HttpResponse::Created().json(AddedItemResponse::from(summary)))
}

#[put("/{id}/{panel_id}")]
pub async fn resize_item(
    state: web::Data<HttpState>,
    auth: Authenticated,
    path: web::Path<(String, String)>,
    body: DeferredBody,
) -> ApiResult<web::Json<RequestDetailResponse>> {
    let (request, panel) = path.into_inner();
    let request = parse_request_id(&request)?;
    let panel = parse_panel_id(&panel)?;
    let area = body.number(FieldName::new("area"));
    let updated = state
        .requests
        .resize_item(auth.principal, request, panel, area)
        .await?;
    Ok(web::Json(updated.into()))
}

#[delete("/{id}/{panel_id}")]
pub async fn remove_item(
    state: web::Data<HttpState>,
    auth: Authenticated,
    path: web::Path<(String, String)>,
) -> ApiResult<web::Json<RequestDetailResponse>> {
    let (request, panel) = path.into_inner();
    let request = parse_request_id(&request)?;
    let panel = parse_panel_id(&panel)?;
    let updated = state
        .requests
        .remove_item(auth.principal, request, panel)
        .await?;
    Ok(web::Json(updated.into()))
}
