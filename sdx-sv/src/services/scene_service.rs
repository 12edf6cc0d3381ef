//! Scene service operations
//!
//! The four boundary operations (upload, convert, get attribute, set
//! attribute) plus the non-blocking conversion variants. Every operation
//! returns an [`OpResult`]; expected failures never escape as errors.

use crate::error::{ErrorKind, OpResult};
use crate::models::{ConversionStatus, NodeAttribute, TaskId};
use crate::services::conversion_task::ConversionTask;
use crate::services::document_session::{DocumentLeases, DocumentSession, SessionError};
use crate::services::task_manager::{CancelOutcome, TaskManager};
use crate::services::upload::{AssetUploader, UploadError};
use chrono::Utc;
use sdx_common::document::{DocumentStore, DocumentUrl, NodeCategory, Vec3, SCENE_EXTENSION};
use sdx_common::events::{EventBus, SceneEvent};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Result payload of UploadAsset
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadedAsset {
    pub file_name: String,
    pub path: String,
}

/// Result payload of ConvertAsset
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConvertedAsset {
    pub task_id: TaskId,
    pub converted_document: String,
}

pub struct SceneService {
    store: Arc<dyn DocumentStore>,
    leases: DocumentLeases,
    tasks: Arc<TaskManager>,
    uploader: AssetUploader,
    scenes_dir: PathBuf,
    event_bus: EventBus,
}

impl SceneService {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        tasks: Arc<TaskManager>,
        upload_dir: PathBuf,
        scenes_dir: PathBuf,
    ) -> Self {
        let event_bus = tasks.event_bus().clone();
        Self {
            store,
            leases: DocumentLeases::new(),
            tasks,
            uploader: AssetUploader::new(upload_dir),
            scenes_dir,
            event_bus,
        }
    }

    pub fn tasks(&self) -> &Arc<TaskManager> {
        &self.tasks
    }

    pub fn leases(&self) -> &DocumentLeases {
        &self.leases
    }

    /// UploadAsset: store a JSON payload under the upload directory
    pub async fn upload_asset(&self, input_data: &str, file_name: &str) -> OpResult<UploadedAsset> {
        self.uploader
            .upload(input_data, file_name)
            .await
            .map(|path| UploadedAsset {
                file_name: file_name.to_string(),
                path: path.display().to_string(),
            })
            .into()
    }

    /// ConvertAsset: convert an uploaded file and wait for the result
    ///
    /// The task is reclaimed once its result has been read.
    pub async fn convert_asset(&self, file_name: &str) -> OpResult<ConvertedAsset> {
        let task = match self.submit(file_name) {
            Ok(task) => task,
            Err(e) => return OpResult::Err(e.into()),
        };
        let task_id = task.id();

        let succeeded = task.wait_until_finished().await;
        self.tasks.reclaim(&task_id);

        if succeeded {
            OpResult::Ok(ConvertedAsset {
                task_id,
                converted_document: task.destination().display().to_string(),
            })
        } else {
            let message = task
                .error_message()
                .unwrap_or_else(|| "conversion failed".to_string());
            OpResult::failure(ErrorKind::ConversionFailure, message)
        }
    }

    /// StartConversion: submit and return the initial status immediately
    pub fn start_conversion(&self, file_name: &str) -> OpResult<ConversionStatus> {
        self.submit(file_name).map(|task| task.status()).into()
    }

    pub fn conversion_status(&self, task_id: &TaskId) -> Option<ConversionStatus> {
        self.tasks.status(task_id)
    }

    pub fn cancel_conversion(&self, task_id: &TaskId) -> Option<CancelOutcome> {
        self.tasks.cancel(task_id)
    }

    /// GetAttribute: read the translation of `/<CategoryPlural>/<node_name>`
    pub async fn get_attribute(
        &self,
        document: &DocumentUrl,
        category: NodeCategory,
        node_name: &str,
    ) -> OpResult<NodeAttribute> {
        let result = async {
            let session =
                DocumentSession::open(Arc::clone(&self.store), &self.leases, document.clone())
                    .await?;
            let node = session.locate_in(category, node_name)?;
            let value = session.read_attribute(&node)?;
            session.close();
            Ok::<_, SessionError>(NodeAttribute::new(node.path(), &value))
        }
        .await;

        if let Err(e) = &result {
            warn!(document = %document, node = node_name, error = %e, "GetAttribute failed");
        }
        result.into()
    }

    /// SetAttribute: write the translation and save the document
    ///
    /// The document lease is held from open to save, so concurrent writers
    /// of the same document are applied one after another.
    pub async fn set_attribute(
        &self,
        document: &DocumentUrl,
        category: NodeCategory,
        node_name: &str,
        value: Vec3,
    ) -> OpResult<NodeAttribute> {
        let result = async {
            let mut session =
                DocumentSession::open(Arc::clone(&self.store), &self.leases, document.clone())
                    .await?;
            let node = session.locate_in(category, node_name)?;
            let written = session.write_attribute(&node, value)?;
            session.save().await?;
            Ok::<_, SessionError>(NodeAttribute::new(node.path(), &written))
        }
        .await;

        match &result {
            Ok(attribute) => {
                info!(
                    document = %document,
                    path = %attribute.node_path,
                    value = %attribute.value,
                    "Attribute written"
                );
                self.event_bus.emit_lossy(SceneEvent::AttributeWritten {
                    document: document.to_string(),
                    node_path: attribute.node_path.clone(),
                    value: attribute.value.clone(),
                    timestamp: Utc::now(),
                });
            }
            Err(e) => {
                warn!(document = %document, node = node_name, error = %e, "SetAttribute failed");
            }
        }
        result.into()
    }

    fn submit(&self, file_name: &str) -> Result<Arc<ConversionTask>, UploadError> {
        let source = self.uploader.path_for(file_name)?;
        let destination = self.destination_for(file_name)?;
        Ok(self.tasks.submit(source, destination))
    }

    /// `<scenes_dir>/<stem>.sdoc`, stem being the name up to its first `.`
    fn destination_for(&self, file_name: &str) -> Result<PathBuf, UploadError> {
        let stem = file_name.split('.').next().unwrap_or_default();
        if stem.is_empty() {
            return Err(UploadError::InvalidFileName(file_name.to_string()));
        }
        Ok(self.scenes_dir.join(format!("{}.{}", stem, SCENE_EXTENSION)))
    }
}

impl std::fmt::Debug for SceneService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneService")
            .field("tasks", &self.tasks)
            .field("upload_dir", &self.uploader.upload_dir())
            .field("scenes_dir", &self.scenes_dir)
            .finish()
    }
}
