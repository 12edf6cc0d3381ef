//! Scene document engine
//!
//! A hierarchical scene document is a tree of named nodes, each carrying
//! attributes. Nodes are addressed by absolute paths (`/Meshes/node_0001`).
//! Documents live behind a [`DocumentStore`], identified by a [`DocumentUrl`].

mod attribute;
mod path;
mod scene;
mod store;

pub use attribute::{AttributeData, AttributeKind, TimeSample, TimeSamples, Vec3};
pub use path::{NodeCategory, NodePath, PathError};
pub use scene::{Node, SceneDocument, TRANSLATE_ATTRIBUTE, XFORM_TYPE};
pub use store::{DocumentStore, DocumentUrl, FileStore, MemoryStore, RoutingStore, StoreError};

/// File extension of converted scene documents
pub const SCENE_EXTENSION: &str = "sdoc";
