//! sdx-sv library interface for testing
//!
//! Exposes public APIs for integration testing

pub mod api;
pub mod error;
pub mod models;
pub mod services;

pub use crate::error::{ApiError, ApiResult, ErrorKind, OpFailure, OpResult};

use axum::Router;
use chrono::{DateTime, Utc};
use sdx_common::events::EventBus;
use services::SceneService;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Module name reported by /health and the SSE stream
pub const MODULE_NAME: &str = "sdx-sv";

/// Default HTTP listen address
pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:5730";

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Upload, conversion and attribute operations
    pub service: Arc<SceneService>,
    /// Event bus for SSE broadcasting
    pub event_bus: EventBus,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(service: Arc<SceneService>) -> Self {
        let event_bus = service.tasks().event_bus().clone();
        Self {
            service,
            event_bus,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    Router::new()
        .merge(api::asset_routes())
        .merge(api::conversion_routes())
        .merge(api::attribute_routes())
        .route("/events", get(api::event_stream))
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
