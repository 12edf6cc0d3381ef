//! Conversion task registry
//!
//! Single entry point for starting conversions. Tasks run independently on
//! the tokio runtime; the manager never serializes them against each other.
//! Terminal tasks stay in the registry until the caller reclaims them or the
//! retention period expires.

use crate::models::{ConversionStatus, TaskId};
use crate::services::asset_converter::AssetConverter;
use crate::services::conversion_task::ConversionTask;
use chrono::Utc;
use sdx_common::events::{EventBus, SceneEvent};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Default time a finished task stays pollable
pub const DEFAULT_TASK_RETENTION: Duration = Duration::from_secs(600);

/// Result of a cancellation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    /// Task will fail with the cancellation message
    Requested,
    /// Task had already reached a terminal state
    AlreadyFinished,
}

pub struct TaskManager {
    tasks: RwLock<HashMap<TaskId, Arc<ConversionTask>>>,
    converter: Arc<dyn AssetConverter>,
    event_bus: EventBus,
    retention: Duration,
}

impl TaskManager {
    pub fn new(converter: Arc<dyn AssetConverter>, event_bus: EventBus) -> Self {
        Self {
            tasks: RwLock::new(HashMap::new()),
            converter,
            event_bus,
            retention: DEFAULT_TASK_RETENTION,
        }
    }

    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    /// Register a PENDING task and schedule it; never waits on other tasks
    ///
    /// Must be called from within a tokio runtime.
    pub fn submit(&self, source: PathBuf, destination: PathBuf) -> Arc<ConversionTask> {
        let task = Arc::new(ConversionTask::new(
            source,
            destination,
            self.event_bus.clone(),
        ));
        let task_id = task.id();

        self.write_tasks().insert(task_id, Arc::clone(&task));

        info!(
            task_id = %task_id,
            source = %task.source().display(),
            destination = %task.destination().display(),
            "Conversion submitted"
        );
        self.event_bus.emit_lossy(SceneEvent::ConversionSubmitted {
            task_id,
            source: task.source().display().to_string(),
            destination: task.destination().display().to_string(),
            timestamp: Utc::now(),
        });

        tokio::spawn(Arc::clone(&task).run(Arc::clone(&self.converter)));
        task
    }

    pub fn get(&self, task_id: &TaskId) -> Option<Arc<ConversionTask>> {
        self.read_tasks().get(task_id).cloned()
    }

    pub fn status(&self, task_id: &TaskId) -> Option<ConversionStatus> {
        self.get(task_id).map(|task| task.status())
    }

    /// Request cancellation of a registered task
    pub fn cancel(&self, task_id: &TaskId) -> Option<CancelOutcome> {
        let task = self.get(task_id)?;
        if task.cancel() {
            Some(CancelOutcome::Requested)
        } else {
            Some(CancelOutcome::AlreadyFinished)
        }
    }

    /// Remove a terminal task whose result the caller has retrieved
    ///
    /// Tasks still PENDING or RUNNING are left registered.
    pub fn reclaim(&self, task_id: &TaskId) -> Option<Arc<ConversionTask>> {
        let mut tasks = self.write_tasks();
        if !tasks.get(task_id)?.is_finished() {
            return None;
        }
        let task = tasks.remove(task_id);
        debug!(task_id = %task_id, "Conversion task reclaimed");
        task
    }

    /// Drop terminal tasks finished longer than the retention period ago
    pub fn reap_expired(&self) -> usize {
        let now = Utc::now();

        let mut tasks = self.write_tasks();
        let before = tasks.len();
        tasks.retain(|_, task| match task.finished_at() {
            Some(finished_at) => (now - finished_at)
                .to_std()
                .map(|age| age < self.retention)
                .unwrap_or(true),
            None => true,
        });
        let reaped = before - tasks.len();

        if reaped > 0 {
            info!(reaped, remaining = tasks.len(), "Reaped expired conversion tasks");
        }
        reaped
    }

    /// Run `reap_expired` every `interval` until `shutdown` is cancelled
    pub fn spawn_reaper(
        self: &Arc<Self>,
        interval: Duration,
        shutdown: CancellationToken,
    ) -> JoinHandle<()> {
        let manager = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => {
                        debug!("Task reaper stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        manager.reap_expired();
                    }
                }
            }
        })
    }

    /// Snapshot of every registered task, oldest first
    pub fn list(&self) -> Vec<ConversionStatus> {
        let mut statuses: Vec<_> = self.read_tasks().values().map(|t| t.status()).collect();
        statuses.sort_by_key(|s| s.submitted_at);
        statuses
    }

    /// Tasks not yet terminal
    pub fn active_count(&self) -> usize {
        self.read_tasks()
            .values()
            .filter(|t| !t.is_finished())
            .count()
    }

    pub fn len(&self) -> usize {
        self.read_tasks().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    fn read_tasks(&self) -> RwLockReadGuard<'_, HashMap<TaskId, Arc<ConversionTask>>> {
        self.tasks.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_tasks(&self) -> RwLockWriteGuard<'_, HashMap<TaskId, Arc<ConversionTask>>> {
        self.tasks.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl std::fmt::Debug for TaskManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskManager")
            .field("tasks", &self.len())
            .field("retention", &self.retention)
            .finish()
    }
}
