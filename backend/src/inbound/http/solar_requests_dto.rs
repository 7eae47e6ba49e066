//! Wire shapes for request endpoints.

use serde::{Deserialize, Serialize};

use crate::domain::{DraftSummary, RequestItem, RequestSummary, SolarPanelRequest};
use crate::inbound::http::validation::format_listing_date;

/// Cart summary for `GET /api/solarpanel-requests/info`.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DraftInfoResponse {
    pub request_id: Option<String>,
    pub panels_in_request: u64,
}

impl From<Option<DraftSummary>> for DraftInfoResponse {
    fn from(summary: Option<DraftSummary>) -> Self {
        match summary {
            Some(summary) => Self {
                request_id: Some(summary.request_id.to_string()),
                panels_in_request: summary.item_count,
            },
            None => Self {
                request_id: None,
                panels_in_request: 0,
            },
        }
    }
}

/// Query string for the list endpoint.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ListQuery {
    pub status: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// One row of the list endpoint. Dates are `dd-mm-yyyy hh:mm:ss` UTC.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct RequestRow {
    pub id: String,
    pub status: String,
    pub creator: String,
    pub moderator: Option<String>,
    pub created_at: String,
    pub formed_at: Option<String>,
    pub moderated_at: Option<String>,
    pub insolation: f64,
    pub total_power: Option<f64>,
}

impl From<RequestSummary> for RequestRow {
    fn from(summary: RequestSummary) -> Self {
        Self {
            id: summary.id.to_string(),
            status: summary.status.as_str().to_owned(),
            creator: summary.creator_login,
            moderator: summary.moderator_login,
            created_at: format_listing_date(summary.created_at),
            formed_at: summary.formed_at.map(format_listing_date),
            moderated_at: summary.moderated_at.map(format_listing_date),
            insolation: summary.insolation,
            total_power: summary.total_power,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ItemResponse {
    pub panel_id: String,
    pub title: String,
    pub panel_type: String,
    pub power: f64,
    pub width: i32,
    pub height: i32,
    pub image: Option<String>,
    pub is_deleted: bool,
    pub area: f64,
}

impl From<RequestItem> for ItemResponse {
    fn from(item: RequestItem) -> Self {
        Self {
            panel_id: item.panel.id.to_string(),
            title: item.panel.title,
            panel_type: item.panel.panel_type,
            power: item.panel.power,
            width: item.panel.width,
            height: item.panel.height,
            image: item.panel.image,
            is_deleted: item.panel.is_deleted,
            area: item.area,
        }
    }
}

/// Full request view returned by reads and mutations.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct RequestDetailResponse {
    pub id: String,
    pub status: String,
    pub insolation: f64,
    pub total_power: Option<f64>,
    pub created_at: String,
    pub formed_at: Option<String>,
    pub moderated_at: Option<String>,
    pub items: Vec<ItemResponse>,
}

impl From<SolarPanelRequest> for RequestDetailResponse {
    fn from(request: SolarPanelRequest) -> Self {
        Self {
            id: request.id.to_string(),
            status: request.status.as_str().to_owned(),
            insolation: request.insolation,
            total_power: request.total_power,
            created_at: format_listing_date(request.created_at),
            formed_at: request.formed_at.map(format_listing_date),
            moderated_at: request.moderated_at.map(format_listing_date),
            items: request.items.into_iter().map(ItemResponse::from).collect(),
        }
    }
}

/// Answer to adding a panel to the caller's draft.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AddedItemResponse {
    pub request_id: String,
    pub panels_in_request: u64,
}

impl From<DraftSummary> for AddedItemResponse {
    fn from(summary: DraftSummary) -> Self {
        Self {
            request_id: summary.request_id.to_string(),
            panels_in_request: summary.item_count,
        }
    }
}
