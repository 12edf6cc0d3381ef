//! Business logic services

pub mod asset_converter;
pub mod attribute_resolver;
pub mod conversion_task;
pub mod document_session;
pub mod scene_service;
pub mod task_manager;
pub mod upload;

pub use asset_converter::{AssetConverter, GltfConverter};
pub use attribute_resolver::{AttributeResolver, ResolveError};
pub use conversion_task::{ConversionError, ConversionTask, ProgressReporter, CANCELLED_MESSAGE};
pub use document_session::{DocumentLease, DocumentLeases, DocumentSession, NodeRef, SessionError};
pub use scene_service::{ConvertedAsset, SceneService, UploadedAsset};
pub use task_manager::{CancelOutcome, TaskManager, DEFAULT_TASK_RETENTION};
pub use upload::{AssetUploader, UploadError};
