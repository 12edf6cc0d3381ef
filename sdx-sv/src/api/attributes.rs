//! Node attribute handlers
//!
//! POST /attributes/get, POST /attributes/set
//!
//! The document is named explicitly on every request.

use axum::{extract::rejection::JsonRejection, extract::State, routing::post, Json, Router};
use sdx_common::document::{DocumentUrl, NodeCategory, Vec3};
use serde::Deserialize;

use super::json_body;
use crate::error::{ErrorKind, OpResult};
use crate::models::NodeAttribute;
use crate::AppState;

/// POST /attributes/get request
#[derive(Debug, Deserialize)]
pub struct GetAttributeRequest {
    /// `file:///abs/path.sdoc` or `mem://name`
    pub document: String,
    /// `mesh` or `camera` (plural accepted)
    pub category: String,
    pub node: String,
}

/// POST /attributes/set request
#[derive(Debug, Deserialize)]
pub struct SetAttributeRequest {
    pub document: String,
    pub category: String,
    pub node: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Parse the document identity and category shared by both requests
fn parse_target<T>(
    document: &str,
    category: &str,
) -> Result<(DocumentUrl, NodeCategory), OpResult<T>> {
    let url = document
        .parse::<DocumentUrl>()
        .map_err(|e| OpResult::failure(ErrorKind::MalformedInput, e.to_string()))?;
    let category = category
        .parse::<NodeCategory>()
        .map_err(|e| OpResult::failure(ErrorKind::MalformedInput, e.to_string()))?;
    Ok((url, category))
}

/// POST /attributes/get
pub async fn get_attribute(
    State(state): State<AppState>,
    payload: Result<Json<GetAttributeRequest>, JsonRejection>,
) -> OpResult<NodeAttribute> {
    let request = match json_body(payload) {
        Ok(request) => request,
        Err(failure) => return failure,
    };
    let (url, category) = match parse_target(&request.document, &request.category) {
        Ok(target) => target,
        Err(failure) => return failure,
    };

    state
        .service
        .get_attribute(&url, category, &request.node)
        .await
}

/// POST /attributes/set
pub async fn set_attribute(
    State(state): State<AppState>,
    payload: Result<Json<SetAttributeRequest>, JsonRejection>,
) -> OpResult<NodeAttribute> {
    let request = match json_body(payload) {
        Ok(request) => request,
        Err(failure) => return failure,
    };
    let (url, category) = match parse_target(&request.document, &request.category) {
        Ok(target) => target,
        Err(failure) => return failure,
    };

    let value = Vec3::new(request.x, request.y, request.z);
    if !(value.x.is_finite() && value.y.is_finite() && value.z.is_finite()) {
        return OpResult::failure(ErrorKind::MalformedInput, "vector components must be finite");
    }

    state
        .service
        .set_attribute(&url, category, &request.node, value)
        .await
}

pub fn attribute_routes() -> Router<AppState> {
    Router::new()
        .route("/attributes/get", post(get_attribute))
        .route("/attributes/set", post(set_attribute))
}
