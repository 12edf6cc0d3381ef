//! Document sessions
//!
//! A [`DocumentSession`] owns one open handle on a shared document for the
//! span open → locate → read/write → save. Operations on one session are
//! sequential; the session never reorders them.
//!
//! Sessions on the same document identity are serialized by a
//! [`DocumentLeases`] lease held from `open` until `save`/`close`/drop.
//! The lease is in-process only: it prevents lost updates between requests
//! served by this process, not between separate service instances.

use crate::error::{ErrorKind, OpFailure};
use crate::models::AttributeValue;
use crate::services::attribute_resolver::{AttributeResolver, ResolveError};
use sdx_common::document::{
    DocumentStore, DocumentUrl, NodeCategory, NodePath, PathError, SceneDocument, StoreError, Vec3,
    TRANSLATE_ATTRIBUTE,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::sync::OwnedMutexGuard;
use tracing::{debug, info};

/// Session failures
#[derive(Debug, Error)]
pub enum SessionError {
    /// Open or save round-trip failed; message preserved verbatim
    #[error(transparent)]
    Connection(#[from] StoreError),

    #[error("node {0} not found")]
    NodeNotFound(NodePath),

    #[error("attribute '{attribute}' not found on {path}")]
    AttributeNotFound { path: NodePath, attribute: String },

    #[error("attribute '{attribute}' on {path} has no time samples")]
    NoTimeSamples { path: NodePath, attribute: String },

    #[error("node reference {0} belongs to a different document handle")]
    StaleNode(NodePath),

    #[error(transparent)]
    InvalidPath(#[from] PathError),
}

impl SessionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SessionError::Connection(_) => ErrorKind::ConnectionError,
            SessionError::NodeNotFound(_)
            | SessionError::AttributeNotFound { .. }
            | SessionError::NoTimeSamples { .. }
            | SessionError::StaleNode(_) => ErrorKind::NotFound,
            SessionError::InvalidPath(_) => ErrorKind::MalformedInput,
        }
    }

    fn from_resolve(path: &NodePath, err: ResolveError) -> Self {
        match err {
            ResolveError::AttributeNotFound(attribute) => SessionError::AttributeNotFound {
                path: path.clone(),
                attribute,
            },
            ResolveError::NoTimeSamples(attribute) => SessionError::NoTimeSamples {
                path: path.clone(),
                attribute,
            },
        }
    }
}

impl From<SessionError> for OpFailure {
    fn from(err: SessionError) -> Self {
        OpFailure::new(err.kind(), err.to_string())
    }
}

/// Per-document exclusive leases
///
/// Maps document identity to an async mutex. Entries nobody holds or waits
/// on are pruned on the next acquisition.
#[derive(Debug, Default)]
pub struct DocumentLeases {
    locks: Mutex<HashMap<DocumentUrl, Arc<tokio::sync::Mutex<()>>>>,
}

impl DocumentLeases {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive use of `url`
    pub async fn acquire(&self, url: &DocumentUrl) -> DocumentLease {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks.entry(url.clone()).or_default().clone()
        };

        if lock.try_lock().is_err() {
            debug!(document = %url, "Waiting for document lease");
        }
        DocumentLease {
            _guard: lock.lock_owned().await,
        }
    }

    /// Number of documents currently leased or waited on
    pub fn active(&self) -> usize {
        let locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks.values().filter(|l| Arc::strong_count(l) > 1).count()
    }
}

/// Held for the lifetime of a session; released on drop
#[derive(Debug)]
pub struct DocumentLease {
    _guard: OwnedMutexGuard<()>,
}

static NEXT_HANDLE_ID: AtomicU64 = AtomicU64::new(1);

/// One open connection to a document
#[derive(Debug)]
struct DocumentHandle {
    id: u64,
    document: SceneDocument,
}

/// Resolved reference to an existing node
///
/// Only valid with the session (handle) that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeRef {
    handle_id: u64,
    path: NodePath,
}

impl NodeRef {
    pub fn path(&self) -> &NodePath {
        &self.path
    }
}

/// Open → locate → read/write → save over one document
pub struct DocumentSession {
    store: Arc<dyn DocumentStore>,
    url: DocumentUrl,
    handle: DocumentHandle,
    dirty: bool,
    _lease: DocumentLease,
}

impl std::fmt::Debug for DocumentSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentSession")
            .field("url", &self.url)
            .field("handle_id", &self.handle.id)
            .field("dirty", &self.dirty)
            .finish()
    }
}

impl DocumentSession {
    /// Acquire the document lease, then fetch the document
    ///
    /// Every call is a fresh round-trip; handles are never reused. On
    /// failure the lease is released immediately.
    pub async fn open(
        store: Arc<dyn DocumentStore>,
        leases: &DocumentLeases,
        url: DocumentUrl,
    ) -> Result<Self, SessionError> {
        let lease = leases.acquire(&url).await;
        let document = store.open(&url).await?;
        let id = NEXT_HANDLE_ID.fetch_add(1, Ordering::Relaxed);

        debug!(document = %url, handle = id, "Document session opened");

        Ok(Self {
            store,
            url,
            handle: DocumentHandle { id, document },
            dirty: false,
            _lease: lease,
        })
    }

    pub fn url(&self) -> &DocumentUrl {
        &self.url
    }

    /// True once a write happened that `save` has not persisted
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn document(&self) -> &SceneDocument {
        &self.handle.document
    }

    /// Find the node at `path`
    pub fn locate(&self, path: &NodePath) -> Result<NodeRef, SessionError> {
        if self.handle.document.node(path).is_none() {
            return Err(SessionError::NodeNotFound(path.clone()));
        }
        Ok(NodeRef {
            handle_id: self.handle.id,
            path: path.clone(),
        })
    }

    /// Find `/<CategoryPlural>/<name>`
    pub fn locate_in(&self, category: NodeCategory, name: &str) -> Result<NodeRef, SessionError> {
        let path = category.path_for(name)?;
        self.locate(&path)
    }

    /// Read the translation attribute of `node`
    pub fn read_attribute(&self, node: &NodeRef) -> Result<AttributeValue, SessionError> {
        self.read(node, TRANSLATE_ATTRIBUTE)
    }

    /// Write the translation attribute of `node`; visible to others after `save`
    pub fn write_attribute(
        &mut self,
        node: &NodeRef,
        value: Vec3,
    ) -> Result<AttributeValue, SessionError> {
        self.write(node, TRANSLATE_ATTRIBUTE, value)
    }

    pub fn read(&self, node: &NodeRef, attribute: &str) -> Result<AttributeValue, SessionError> {
        self.check_handle(node)?;
        let target = self
            .handle
            .document
            .node(&node.path)
            .ok_or_else(|| SessionError::NodeNotFound(node.path.clone()))?;
        AttributeResolver::get(target, attribute)
            .map_err(|e| SessionError::from_resolve(&node.path, e))
    }

    pub fn write(
        &mut self,
        node: &NodeRef,
        attribute: &str,
        value: Vec3,
    ) -> Result<AttributeValue, SessionError> {
        self.check_handle(node)?;
        let target = self
            .handle
            .document
            .node_mut(&node.path)
            .ok_or_else(|| SessionError::NodeNotFound(node.path.clone()))?;
        let written = AttributeResolver::set(target, attribute, value)
            .map_err(|e| SessionError::from_resolve(&node.path, e))?;
        self.dirty = true;
        Ok(written)
    }

    /// Persist the document and release the handle and lease
    pub async fn save(self) -> Result<(), SessionError> {
        self.store.save(&self.url, &self.handle.document).await?;
        info!(
            document = %self.url,
            handle = self.handle.id,
            "Document saved"
        );
        Ok(())
    }

    /// Discard pending writes and release the handle and lease
    pub fn close(self) {
        if self.dirty {
            debug!(document = %self.url, "Closing session with unsaved writes");
        }
    }

    fn check_handle(&self, node: &NodeRef) -> Result<(), SessionError> {
        if node.handle_id != self.handle.id {
            return Err(SessionError::StaleNode(node.path.clone()));
        }
        Ok(())
    }
}
