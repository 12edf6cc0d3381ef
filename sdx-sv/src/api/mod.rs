//! HTTP API handlers for sdx-sv
//!
//! Thin bindings from requests onto [`crate::services::SceneService`].

pub mod assets;
pub mod attributes;
pub mod conversions;
pub mod health;
pub mod sse;

pub use assets::asset_routes;
pub use attributes::attribute_routes;
pub use conversions::conversion_routes;
pub use health::health_routes;
pub use sse::event_stream;

use crate::error::{ErrorKind, OpResult};
use axum::extract::rejection::JsonRejection;
use axum::Json;

/// Unwrap a JSON body, turning a rejected body into a MalformedInput result
pub(crate) fn json_body<T, U>(payload: Result<Json<T>, JsonRejection>) -> Result<T, OpResult<U>> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| OpResult::failure(ErrorKind::MalformedInput, rejection.body_text()))
}
