//! Server-Sent Events for conversion and attribute updates

use crate::AppState;
use axum::{
    extract::State,
    response::sse::{Event, Sse},
};
use futures::stream::Stream;
use std::convert::Infallible;

/// GET /events
///
/// Streams every `SceneEvent`: conversion submitted / progress / succeeded /
/// failed / cancelled, and attribute writes.
pub async fn event_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    sdx_common::sse::event_bus_stream(crate::MODULE_NAME, &state.event_bus)
}
