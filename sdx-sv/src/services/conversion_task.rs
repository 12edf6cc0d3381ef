//! Conversion task
//!
//! One in-flight asset conversion. State is published through a
//! `tokio::sync::watch` channel so any number of callers can poll or await
//! it without blocking the task or each other.
//!
//! Cancellation is cooperative only. The converter is never interrupted;
//! the request is observed at its next [`ProgressReporter::report`]
//! checkpoint. A converter that finishes without reaching another
//! checkpoint completes normally even though cancellation was requested.

use crate::models::{ConversionProgress, ConversionState, ConversionStatus, TaskId};
use crate::services::asset_converter::AssetConverter;
use chrono::{DateTime, Utc};
use sdx_common::events::{EventBus, SceneEvent};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Message stored on a task that failed because it was cancelled
pub const CANCELLED_MESSAGE: &str = "conversion cancelled";

/// Converter failures
#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("source file not found: {}", .0.display())]
    SourceMissing(PathBuf),

    #[error("failed to parse {}: {source}", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}", CANCELLED_MESSAGE)]
    Cancelled,

    #[error("{0}")]
    Converter(String),
}

#[derive(Debug, Clone)]
struct TaskSnapshot {
    state: ConversionState,
    progress: ConversionProgress,
    error_message: Option<String>,
    finished_at: Option<DateTime<Utc>>,
}

/// One conversion from `source` to `destination`
#[derive(Debug)]
pub struct ConversionTask {
    id: TaskId,
    source: PathBuf,
    destination: PathBuf,
    submitted_at: DateTime<Utc>,
    state: watch::Sender<TaskSnapshot>,
    cancel_token: CancellationToken,
    event_bus: EventBus,
}

impl ConversionTask {
    /// Create a task in PENDING state
    pub fn new(source: PathBuf, destination: PathBuf, event_bus: EventBus) -> Self {
        let (state, _) = watch::channel(TaskSnapshot {
            state: ConversionState::Pending,
            progress: ConversionProgress::default(),
            error_message: None,
            finished_at: None,
        });

        Self {
            id: Uuid::new_v4(),
            source,
            destination,
            submitted_at: Utc::now(),
            state,
            cancel_token: CancellationToken::new(),
            event_bus,
        }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    pub fn state(&self) -> ConversionState {
        self.state.borrow().state
    }

    pub fn is_finished(&self) -> bool {
        self.state().is_terminal()
    }

    /// Non-suspending snapshot, valid in any state
    pub fn progress(&self) -> ConversionProgress {
        self.state.borrow().progress
    }

    /// Present once the task is FAILED
    pub fn error_message(&self) -> Option<String> {
        self.state.borrow().error_message.clone()
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.state.borrow().finished_at
    }

    pub fn status(&self) -> ConversionStatus {
        let snapshot = self.state.borrow().clone();
        ConversionStatus {
            task_id: self.id,
            source: self.source.display().to_string(),
            destination: self.destination.display().to_string(),
            state: snapshot.state,
            progress: snapshot.progress,
            error_message: snapshot.error_message,
            submitted_at: self.submitted_at,
            finished_at: snapshot.finished_at,
        }
    }

    pub fn is_cancel_requested(&self) -> bool {
        self.cancel_token.is_cancelled()
    }

    /// Suspend until the task is terminal; true iff it SUCCEEDED
    pub async fn wait_until_finished(&self) -> bool {
        let mut rx = self.state.subscribe();
        let finished = match rx.wait_for(|s| s.state.is_terminal()).await {
            Ok(snapshot) => snapshot.state == ConversionState::Succeeded,
            Err(_) => false,
        };
        finished
    }

    /// Request cancellation
    ///
    /// A PENDING task fails immediately and will never run. A RUNNING task
    /// fails at its next progress checkpoint. Returns false if the task was
    /// already terminal.
    pub fn cancel(&self) -> bool {
        if self.is_finished() {
            return false;
        }

        self.cancel_token.cancel();
        info!(task_id = %self.id, "Conversion cancellation requested");

        if self.state() == ConversionState::Pending {
            self.fail_cancelled();
        }
        true
    }

    /// Handle a converter uses to report progress and observe cancellation
    pub fn reporter(self: &Arc<Self>) -> ProgressReporter {
        ProgressReporter {
            task: Arc::clone(self),
        }
    }

    /// Execute the conversion to a terminal state
    pub async fn run(self: Arc<Self>, converter: Arc<dyn AssetConverter>) {
        if !self.start() {
            debug!(task_id = %self.id, "Conversion not started (already finished)");
            return;
        }

        info!(
            task_id = %self.id,
            source = %self.source.display(),
            destination = %self.destination.display(),
            "Conversion running"
        );

        let reporter = self.reporter();
        let result = converter
            .convert(&self.source, &self.destination, &reporter)
            .await;

        match result {
            Ok(()) => {
                if self.is_cancel_requested() {
                    warn!(
                        task_id = %self.id,
                        "Conversion completed after cancellation was requested"
                    );
                }
                self.succeed();
            }
            Err(ConversionError::Cancelled) => self.fail_cancelled(),
            Err(e) => self.fail(e.to_string()),
        }
    }

    /// PENDING → RUNNING; false if the task is no longer PENDING
    fn start(&self) -> bool {
        if self.is_cancel_requested() {
            self.fail_cancelled();
        }
        self.state.send_if_modified(|s| {
            if s.state != ConversionState::Pending {
                return false;
            }
            s.state = ConversionState::Running;
            true
        })
    }

    fn succeed(&self) {
        let finished = self.finish(ConversionState::Succeeded, None);
        if finished {
            info!(task_id = %self.id, destination = %self.destination.display(), "Conversion succeeded");
            self.event_bus.emit_lossy(SceneEvent::ConversionSucceeded {
                task_id: self.id,
                destination: self.destination.display().to_string(),
                timestamp: Utc::now(),
            });
        }
    }

    fn fail(&self, message: String) {
        let finished = self.finish(ConversionState::Failed, Some(message.clone()));
        if finished {
            error!(task_id = %self.id, error = %message, "Conversion failed");
            self.event_bus.emit_lossy(SceneEvent::ConversionFailed {
                task_id: self.id,
                error_message: message,
                timestamp: Utc::now(),
            });
        }
    }

    fn fail_cancelled(&self) {
        let finished = self.finish(ConversionState::Failed, Some(CANCELLED_MESSAGE.to_string()));
        if finished {
            info!(task_id = %self.id, "Conversion cancelled");
            self.event_bus.emit_lossy(SceneEvent::ConversionCancelled {
                task_id: self.id,
                timestamp: Utc::now(),
            });
        }
    }

    /// Enter a terminal state once; later calls are no-ops
    fn finish(&self, state: ConversionState, error_message: Option<String>) -> bool {
        self.state.send_if_modified(|s| {
            if s.state.is_terminal() {
                return false;
            }
            s.state = state;
            s.error_message = error_message;
            s.finished_at = Some(Utc::now());
            true
        })
    }

    /// Apply one progress report; returns the resulting counters
    fn record_progress(&self, current: u64, total: u64) -> Option<ConversionProgress> {
        let mut applied = None;
        self.state.send_if_modified(|s| {
            if s.state != ConversionState::Running {
                return false;
            }
            let mut progress = s.progress;
            if progress.total == 0 {
                progress.total = total;
            }
            let current = current.min(progress.total);
            progress.current = progress.current.max(current);

            if progress == s.progress {
                return false;
            }
            s.progress = progress;
            applied = Some(progress);
            true
        });
        applied
    }
}

/// Progress checkpoint handed to the converter
///
/// `total` is fixed by the first report with a non-zero total; later totals
/// are ignored. `current` is clamped to `total` and never decreases.
#[derive(Debug, Clone)]
pub struct ProgressReporter {
    task: Arc<ConversionTask>,
}

impl ProgressReporter {
    /// Record progress, or `Err(Cancelled)` if cancellation was requested
    pub fn report(&self, current: u64, total: u64) -> Result<(), ConversionError> {
        self.checkpoint()?;

        if let Some(progress) = self.task.record_progress(current, total) {
            debug!(
                task_id = %self.task.id,
                "Conversion progress {} of {}",
                progress.current,
                progress.total
            );
            self.task.event_bus.emit_lossy(SceneEvent::ConversionProgress {
                task_id: self.task.id,
                current_step: progress.current,
                total_steps: progress.total,
                timestamp: Utc::now(),
            });
        }
        Ok(())
    }

    /// `Err(Cancelled)` if cancellation was requested, without recording progress
    pub fn checkpoint(&self) -> Result<(), ConversionError> {
        if self.task.is_cancel_requested() {
            return Err(ConversionError::Cancelled);
        }
        Ok(())
    }

    pub fn task_id(&self) -> TaskId {
        self.task.id
    }
}
