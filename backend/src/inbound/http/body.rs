//! JSON bodies whose content is judged by the service, not the extractor.
//!
//! Mutations on an existing request must report a missing request, then a
//! foreign owner, then a wrong status, and only then bad content. A typed
//! `web::Json<T>` would reject a malformed body before any of that runs, so
//! these endpoints read the body leniently and hand each field on as found.

use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest, web};
use futures_util::future::LocalBoxFuture;
use serde_json::Value;
use tracing::debug;

use crate::domain::NumericField;

use super::validation::FieldName;

/// Request body parsed as loose JSON. `None` when the body did not parse.
#[derive(Debug, Clone, Default)]
pub struct DeferredBody(Option<Value>);

impl DeferredBody {
    fn field(&self, name: FieldName) -> Option<&Value> {
        self.0
            .as_ref()
            .and_then(|body| body.get(name.as_str()))
            .filter(|value| !value.is_null())
    }

    /// A numeric field; anything that is present but not a number, or any
    /// field of an unparseable body, is [`NumericField::Malformed`].
    pub(crate) fn number(&self, name: FieldName) -> NumericField {
        if self.0.is_none() {
            return NumericField::Malformed;
        }
        match self.field(name) {
            None => NumericField::Missing,
            Some(value) => value
                .as_f64()
                .map_or(NumericField::Malformed, NumericField::Value),
        }
    }

    /// A string field; absent or non-string values read as `None`.
    pub(crate) fn text(&self, name: FieldName) -> Option<String> {
        self.field(name).and_then(Value::as_str).map(str::to_owned)
    }
}

impl From<Value> for DeferredBody {
    fn from(value: Value) -> Self {
        Self(Some(value))
    }
}

impl FromRequest for DeferredBody {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let json = web::Json::<Value>::from_request(req, payload);
        Box::pin(async move {
            match json.await {
                Ok(body) => Ok(Self(Some(body.into_inner()))),
                Err(error) => {
                    debug!(%error, "request body kept for later validation");
                    Ok(Self(None))
                }
            }
        })
    }
}
