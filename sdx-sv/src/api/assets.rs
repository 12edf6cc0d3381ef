//! Asset upload and blocking conversion
//!
//! POST /assets/upload, POST /assets/convert

use axum::{extract::rejection::JsonRejection, extract::State, routing::post, Json, Router};
use serde::Deserialize;

use super::json_body;
use crate::error::OpResult;
use crate::services::{ConvertedAsset, UploadedAsset};
use crate::AppState;

/// POST /assets/upload request
#[derive(Debug, Deserialize)]
pub struct UploadAssetRequest {
    /// glTF JSON document as a string
    pub input_data: String,
    pub file_name: String,
}

/// POST /assets/convert request
#[derive(Debug, Deserialize)]
pub struct ConvertAssetRequest {
    pub file_name: String,
}

/// POST /assets/upload
pub async fn upload_asset(
    State(state): State<AppState>,
    payload: Result<Json<UploadAssetRequest>, JsonRejection>,
) -> OpResult<UploadedAsset> {
    let request = match json_body(payload) {
        Ok(request) => request,
        Err(failure) => return failure,
    };
    state
        .service
        .upload_asset(&request.input_data, &request.file_name)
        .await
}

/// POST /assets/convert
///
/// Waits for the conversion to finish; use POST /conversions to poll instead.
pub async fn convert_asset(
    State(state): State<AppState>,
    payload: Result<Json<ConvertAssetRequest>, JsonRejection>,
) -> OpResult<ConvertedAsset> {
    let request = match json_body(payload) {
        Ok(request) => request,
        Err(failure) => return failure,
    };
    tracing::info!(file_name = %request.file_name, "Convert asset requested");
    state.service.convert_asset(&request.file_name).await
}

pub fn asset_routes() -> Router<AppState> {
    Router::new()
        .route("/assets/upload", post(upload_asset))
        .route("/assets/convert", post(convert_asset))
}
