//! Catalog panel definitions referenced by request line items.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable panel identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PanelId(Uuid);

impl PanelId {
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for PanelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Reusable panel definition.
///
/// `power` is the rated output in watts; `width` and `height` are the
/// physical dimensions in millimetres. A soft-deleted panel stays visible in
/// requests that already reference it but cannot be added to new ones.
#[derive(Debug, Clone, PartialEq)]
pub struct Panel {
    pub id: PanelId,
    pub title: String,
    pub panel_type: String,
    pub power: f64,
    pub width: i32,
    pub height: i32,
    pub image: Option<String>,
    pub is_deleted: bool,
}
