//! Non-blocking conversion handlers
//!
//! POST /conversions, GET /conversions, GET /conversions/:task_id,
//! POST /conversions/:task_id/cancel

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::json_body;
use crate::error::{ApiError, ApiResult, OpResult};
use crate::models::{ConversionProgress, ConversionState, ConversionStatus};
use crate::services::CancelOutcome;
use crate::AppState;

/// POST /conversions request
#[derive(Debug, Deserialize)]
pub struct StartConversionRequest {
    pub file_name: String,
}

/// POST /conversions/:task_id/cancel response
#[derive(Debug, Serialize)]
pub struct CancelConversionResponse {
    pub task_id: Uuid,
    pub state: ConversionState,
    pub progress: ConversionProgress,
    /// False when the running converter has not yet reached a checkpoint
    pub cancelled: bool,
}

/// POST /conversions
///
/// Registers the task and returns its PENDING status immediately.
pub async fn start_conversion(
    State(state): State<AppState>,
    payload: Result<Json<StartConversionRequest>, JsonRejection>,
) -> OpResult<ConversionStatus> {
    let request = match json_body(payload) {
        Ok(request) => request,
        Err(failure) => return failure,
    };
    state.service.start_conversion(&request.file_name)
}

/// GET /conversions
pub async fn list_conversions(State(state): State<AppState>) -> Json<Vec<ConversionStatus>> {
    Json(state.service.tasks().list())
}

/// GET /conversions/:task_id
pub async fn get_conversion(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<Json<ConversionStatus>> {
    let status = state
        .service
        .conversion_status(&task_id)
        .ok_or_else(|| ApiError::NotFound(format!("Conversion task not found: {}", task_id)))?;

    tracing::debug!(task_id = %task_id, state = ?status.state, "Status query");
    Ok(Json(status))
}

/// POST /conversions/:task_id/cancel
///
/// Cancellation is cooperative: a running task fails at its next progress
/// checkpoint, and may still succeed if it never reaches one.
pub async fn cancel_conversion(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<Json<CancelConversionResponse>> {
    let outcome = state
        .service
        .cancel_conversion(&task_id)
        .ok_or_else(|| ApiError::NotFound(format!("Conversion task not found: {}", task_id)))?;

    if outcome == CancelOutcome::AlreadyFinished {
        return Err(ApiError::Conflict(format!(
            "Conversion task already finished: {}",
            task_id
        )));
    }

    let status = state
        .service
        .conversion_status(&task_id)
        .ok_or_else(|| ApiError::NotFound(format!("Conversion task not found: {}", task_id)))?;

    Ok(Json(CancelConversionResponse {
        task_id,
        state: status.state,
        progress: status.progress,
        cancelled: status.state.is_terminal(),
    }))
}

pub fn conversion_routes() -> Router<AppState> {
    Router::new()
        .route("/conversions", post(start_conversion).get(list_conversions))
        .route("/conversions/:task_id", get(get_conversion))
        .route("/conversions/:task_id/cancel", post(cancel_conversion))
}
