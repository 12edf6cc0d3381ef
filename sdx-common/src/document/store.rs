//! Document stores
//!
//! A document is identified by a [`DocumentUrl`] and reached through a
//! [`DocumentStore`]. Every `open` is a fresh round-trip; stores do not
//! cache documents between calls.

use super::scene::SceneDocument;
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;

/// Store-level failures (open/save round-trips)
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document unreachable: {0}")]
    Unreachable(String),

    #[error("I/O error on {url}: {source}")]
    Io {
        url: String,
        #[source]
        source: std::io::Error,
    },

    #[error("document {url} is not a valid scene document: {source}")]
    Malformed {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("unsupported document URL: {0}")]
    UnsupportedScheme(String),
}

/// Explicit identity of one shared document
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DocumentUrl {
    /// `file:///abs/path.sdoc`
    File(PathBuf),
    /// `mem://name`
    Memory(String),
}

impl DocumentUrl {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        DocumentUrl::File(path.into())
    }

    pub fn memory(name: impl Into<String>) -> Self {
        DocumentUrl::Memory(name.into())
    }

    pub fn scheme(&self) -> &'static str {
        match self {
            DocumentUrl::File(_) => "file",
            DocumentUrl::Memory(_) => "mem",
        }
    }
}

impl FromStr for DocumentUrl {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(path) = s.strip_prefix("file://") {
            if path.is_empty() || !Path::new(path).is_absolute() {
                return Err(StoreError::UnsupportedScheme(s.to_string()));
            }
            return Ok(DocumentUrl::File(PathBuf::from(path)));
        }
        if let Some(name) = s.strip_prefix("mem://") {
            if name.is_empty() {
                return Err(StoreError::UnsupportedScheme(s.to_string()));
            }
            return Ok(DocumentUrl::Memory(name.to_string()));
        }
        Err(StoreError::UnsupportedScheme(s.to_string()))
    }
}

impl fmt::Display for DocumentUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentUrl::File(path) => write!(f, "file://{}", path.display()),
            DocumentUrl::Memory(name) => write!(f, "mem://{}", name),
        }
    }
}

/// Access to shared, mutable scene documents
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch the current persisted state of a document
    async fn open(&self, url: &DocumentUrl) -> Result<SceneDocument, StoreError>;

    /// Persist a document, replacing what was stored before
    async fn save(&self, url: &DocumentUrl, document: &SceneDocument) -> Result<(), StoreError>;
}

/// JSON files on a local or mounted filesystem
#[derive(Debug, Clone, Default)]
pub struct FileStore;

impl FileStore {
    pub fn new() -> Self {
        Self
    }

    fn path<'a>(url: &'a DocumentUrl) -> Result<&'a Path, StoreError> {
        match url {
            DocumentUrl::File(path) => Ok(path),
            other => Err(StoreError::UnsupportedScheme(other.to_string())),
        }
    }

    /// Write `document` to `path` through a sibling temp file + rename
    pub async fn write_atomic(path: &Path, document: &SceneDocument) -> std::io::Result<()> {
        let bytes = serde_json::to_vec_pretty(document)?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let tmp = path.with_file_name(format!(".{}.{}.tmp", file_name, uuid::Uuid::new_v4()));

        tokio::fs::write(&tmp, &bytes).await?;
        if let Err(e) = tokio::fs::rename(&tmp, path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e);
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for FileStore {
    async fn open(&self, url: &DocumentUrl) -> Result<SceneDocument, StoreError> {
        let path = Self::path(url)?;
        let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => StoreError::Unreachable(url.to_string()),
            _ => StoreError::Io {
                url: url.to_string(),
                source: e,
            },
        })?;
        debug!(document = %url, bytes = bytes.len(), "Read scene document");
        serde_json::from_slice(&bytes).map_err(|source| StoreError::Malformed {
            url: url.to_string(),
            source,
        })
    }

    async fn save(&self, url: &DocumentUrl, document: &SceneDocument) -> Result<(), StoreError> {
        let path = Self::path(url)?;
        Self::write_atomic(path, document)
            .await
            .map_err(|source| StoreError::Io {
                url: url.to_string(),
                source,
            })?;
        debug!(document = %url, "Wrote scene document");
        Ok(())
    }
}

/// In-process documents, used for tests and scratch documents
///
/// `set_reachable(false)` makes every round-trip fail as if the remote end
/// were down. An optional latency is applied to each round-trip.
#[derive(Debug)]
pub struct MemoryStore {
    documents: RwLock<HashMap<String, SceneDocument>>,
    reachable: AtomicBool,
    latency: Option<Duration>,
    saves: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            documents: RwLock::new(HashMap::new()),
            reachable: AtomicBool::new(true),
            latency: None,
            saves: AtomicUsize::new(0),
        }
    }

    /// Delay every open/save by `latency`
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    /// Seed or replace a document without a round-trip
    pub async fn insert(&self, name: impl Into<String>, document: SceneDocument) {
        self.documents.write().await.insert(name.into(), document);
    }

    /// Current stored state of a document
    pub async fn get(&self, name: &str) -> Option<SceneDocument> {
        self.documents.read().await.get(name).cloned()
    }

    /// Number of successful saves so far
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    async fn round_trip(&self, url: &DocumentUrl) -> Result<String, StoreError> {
        let name = match url {
            DocumentUrl::Memory(name) => name.clone(),
            other => return Err(StoreError::UnsupportedScheme(other.to_string())),
        };
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if !self.reachable.load(Ordering::SeqCst) {
            return Err(StoreError::Unreachable(url.to_string()));
        }
        Ok(name)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn open(&self, url: &DocumentUrl) -> Result<SceneDocument, StoreError> {
        let name = self.round_trip(url).await?;
        self.documents
            .read()
            .await
            .get(&name)
            .cloned()
            .ok_or_else(|| StoreError::Unreachable(url.to_string()))
    }

    async fn save(&self, url: &DocumentUrl, document: &SceneDocument) -> Result<(), StoreError> {
        let name = self.round_trip(url).await?;
        self.documents.write().await.insert(name, document.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Dispatches on URL scheme: `file://` to a [`FileStore`], `mem://` to a
/// shared [`MemoryStore`]
#[derive(Debug, Clone)]
pub struct RoutingStore {
    files: FileStore,
    memory: Arc<MemoryStore>,
}

impl RoutingStore {
    pub fn new(memory: Arc<MemoryStore>) -> Self {
        Self {
            files: FileStore::new(),
            memory,
        }
    }

    pub fn memory(&self) -> &Arc<MemoryStore> {
        &self.memory
    }
}

impl Default for RoutingStore {
    fn default() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }
}

#[async_trait]
impl DocumentStore for RoutingStore {
    async fn open(&self, url: &DocumentUrl) -> Result<SceneDocument, StoreError> {
        match url {
            DocumentUrl::File(_) => self.files.open(url).await,
            DocumentUrl::Memory(_) => self.memory.open(url).await,
        }
    }

    async fn save(&self, url: &DocumentUrl, document: &SceneDocument) -> Result<(), StoreError> {
        match url {
            DocumentUrl::File(_) => self.files.save(url, document).await,
            DocumentUrl::Memory(_) => self.memory.save(url, document).await,
        }
    }
}
