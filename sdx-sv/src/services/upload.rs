//! Asset upload into the root folder's upload directory

use crate::error::{ErrorKind, OpFailure};
use serde::Serialize;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("payload is not valid JSON: {0}")]
    MalformedInput(#[from] serde_json::Error),

    #[error("invalid file name '{0}': must be a single path component")]
    InvalidFileName(String),

    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl UploadError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            UploadError::MalformedInput(_) | UploadError::InvalidFileName(_) => {
                ErrorKind::MalformedInput
            }
            UploadError::Io { .. } => ErrorKind::ConnectionError,
        }
    }
}

impl From<UploadError> for OpFailure {
    fn from(err: UploadError) -> Self {
        OpFailure::new(err.kind(), err.to_string())
    }
}

/// Writes uploaded JSON assets under one directory
#[derive(Debug, Clone)]
pub struct AssetUploader {
    upload_dir: PathBuf,
}

impl AssetUploader {
    pub fn new(upload_dir: PathBuf) -> Self {
        Self { upload_dir }
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    /// Resolve `file_name` inside the upload directory
    pub fn path_for(&self, file_name: &str) -> Result<PathBuf, UploadError> {
        validate_file_name(file_name)?;
        Ok(self.upload_dir.join(file_name))
    }

    /// Parse `input_data` as JSON and store it re-serialised with 4-space
    /// indentation at `<upload_dir>/<file_name>`
    pub async fn upload(&self, input_data: &str, file_name: &str) -> Result<PathBuf, UploadError> {
        let path = self.path_for(file_name)?;
        let value: serde_json::Value = serde_json::from_str(input_data)?;
        let bytes = to_indented_json(&value)?;

        tokio::fs::create_dir_all(&self.upload_dir)
            .await
            .map_err(|source| UploadError::Io {
                path: self.upload_dir.clone(),
                source,
            })?;
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|source| UploadError::Io {
                path: path.clone(),
                source,
            })?;

        info!(path = %path.display(), "Asset uploaded");
        Ok(path)
    }
}

fn validate_file_name(file_name: &str) -> Result<(), UploadError> {
    let invalid = || UploadError::InvalidFileName(file_name.to_string());
    if file_name.is_empty() || file_name.contains(['/', '\\']) {
        return Err(invalid());
    }
    let mut components = Path::new(file_name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(invalid()),
    }
}

fn to_indented_json(value: &serde_json::Value) -> Result<Vec<u8>, serde_json::Error> {
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    value.serialize(&mut serializer)?;
    Ok(out)
}
