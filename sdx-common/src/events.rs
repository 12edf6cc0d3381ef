//! Event types and EventBus
//!
//! Events are broadcast over a `tokio::sync::broadcast` channel and can be
//! serialized for SSE transmission.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Service events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SceneEvent {
    /// A conversion task was registered
    ConversionSubmitted {
        task_id: Uuid,
        source: String,
        destination: String,
        timestamp: DateTime<Utc>,
    },

    /// A running conversion reported progress
    ConversionProgress {
        task_id: Uuid,
        current_step: u64,
        total_steps: u64,
        timestamp: DateTime<Utc>,
    },

    /// Conversion finished and the destination is readable
    ConversionSucceeded {
        task_id: Uuid,
        destination: String,
        timestamp: DateTime<Utc>,
    },

    /// Conversion finished with an error
    ConversionFailed {
        task_id: Uuid,
        error_message: String,
        timestamp: DateTime<Utc>,
    },

    /// Conversion stopped on request
    ConversionCancelled {
        task_id: Uuid,
        timestamp: DateTime<Utc>,
    },

    /// A node attribute was written and saved
    AttributeWritten {
        document: String,
        node_path: String,
        value: String,
        timestamp: DateTime<Utc>,
    },
}

impl SceneEvent {
    /// Event name used as the SSE `event:` field
    pub fn event_type(&self) -> &'static str {
        match self {
            SceneEvent::ConversionSubmitted { .. } => "ConversionSubmitted",
            SceneEvent::ConversionProgress { .. } => "ConversionProgress",
            SceneEvent::ConversionSucceeded { .. } => "ConversionSucceeded",
            SceneEvent::ConversionFailed { .. } => "ConversionFailed",
            SceneEvent::ConversionCancelled { .. } => "ConversionCancelled",
            SceneEvent::AttributeWritten { .. } => "AttributeWritten",
        }
    }
}

/// Broadcast bus for [`SceneEvent`]s
///
/// Slow subscribers lose the oldest events once `capacity` is exceeded.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<SceneEvent>,
    capacity: usize,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<SceneEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: SceneEvent,
    ) -> Result<usize, broadcast::error::SendError<SceneEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: SceneEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
