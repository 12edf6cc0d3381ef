//! Conversion task state machine types
//!
//! PENDING → RUNNING → SUCCEEDED | FAILED
//!
//! Terminal states are sticky.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Conversion task identity
pub type TaskId = Uuid;

/// Conversion task state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ConversionState {
    /// Registered, not yet scheduled
    Pending,
    /// Converter is executing
    Running,
    /// Destination is complete and readable
    Succeeded,
    /// Conversion reported an error or was cancelled
    Failed,
}

impl ConversionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, ConversionState::Succeeded | ConversionState::Failed)
    }
}

/// Step counters reported by the converter
///
/// `total` is 0 until the converter first reports; afterwards it is fixed
/// and `current <= total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConversionProgress {
    pub current: u64,
    pub total: u64,
}

impl ConversionProgress {
    pub fn new(current: u64, total: u64) -> Self {
        Self { current, total }
    }

    pub fn is_known(&self) -> bool {
        self.total > 0
    }

    /// Percentage complete (0.0 - 100.0), 0 while the total is unknown
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.current as f64 / self.total as f64) * 100.0
        }
    }
}

/// Point-in-time view of one conversion task
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionStatus {
    pub task_id: TaskId,
    pub source: String,
    pub destination: String,
    pub state: ConversionState,
    pub progress: ConversionProgress,
    /// Present iff `state` is FAILED
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub submitted_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states() {
        assert!(!ConversionState::Pending.is_terminal());
        assert!(!ConversionState::Running.is_terminal());
        assert!(ConversionState::Succeeded.is_terminal());
        assert!(ConversionState::Failed.is_terminal());
    }

    #[test]
    fn state_serializes_uppercase() {
        assert_eq!(
            serde_json::to_string(&ConversionState::Succeeded).unwrap(),
            "\"SUCCEEDED\""
        );
    }

    #[test]
    fn progress_percentage() {
        assert_eq!(ConversionProgress::default().percentage(), 0.0);
        assert!(!ConversionProgress::default().is_known());
        assert_eq!(ConversionProgress::new(1, 4).percentage(), 25.0);
    }
}
