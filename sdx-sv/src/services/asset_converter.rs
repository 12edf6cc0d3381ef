//! Asset conversion into the native scene format
//!
//! [`GltfConverter`] reads a glTF 2.0 JSON asset and writes a scene
//! document. Every glTF node becomes one scene node, flattened under
//! `/Cameras` if it references a camera and `/Meshes` otherwise.

use crate::services::conversion_task::{ConversionError, ProgressReporter};
use async_trait::async_trait;
use sdx_common::document::{
    AttributeData, FileStore, Node, NodeCategory, SceneDocument, Vec3, TRANSLATE_ATTRIBUTE,
};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, warn};

/// Converts one source asset into a scene document at `destination`
///
/// Implementations must call `progress.report` at each step and propagate
/// its error; that is the only point where cancellation is observed.
#[async_trait]
pub trait AssetConverter: Send + Sync {
    async fn convert(
        &self,
        source: &Path,
        destination: &Path,
        progress: &ProgressReporter,
    ) -> Result<(), ConversionError>;
}

/// Subset of the glTF 2.0 schema the converter reads
#[derive(Debug, Deserialize)]
struct GltfAsset {
    #[serde(default)]
    asset: Option<GltfAssetInfo>,
    #[serde(default)]
    nodes: Vec<GltfNode>,
}

#[derive(Debug, Deserialize)]
struct GltfAssetInfo {
    #[serde(default)]
    generator: Option<String>,
    #[serde(default)]
    version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GltfNode {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    translation: Option<[f64; 3]>,
    #[serde(default)]
    mesh: Option<usize>,
    #[serde(default)]
    camera: Option<usize>,
}

impl GltfNode {
    fn category(&self) -> NodeCategory {
        if self.camera.is_some() {
            NodeCategory::Camera
        } else {
            NodeCategory::Mesh
        }
    }

    fn type_name(&self) -> &'static str {
        match self.category() {
            NodeCategory::Camera => "Camera",
            NodeCategory::Mesh => "Mesh",
        }
    }
}

/// glTF 2.0 (JSON) → scene document
///
/// Total steps is the node count plus one for the final write. The
/// destination is written via temp file + rename, so a failed conversion
/// never leaves a file at the destination.
#[derive(Debug, Clone, Copy, Default)]
pub struct GltfConverter;

impl GltfConverter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AssetConverter for GltfConverter {
    async fn convert(
        &self,
        source: &Path,
        destination: &Path,
        progress: &ProgressReporter,
    ) -> Result<(), ConversionError> {
        let bytes = tokio::fs::read(source).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ConversionError::SourceMissing(source.to_path_buf()),
            _ => ConversionError::Io {
                path: source.to_path_buf(),
                source: e,
            },
        })?;

        let gltf: GltfAsset =
            serde_json::from_slice(&bytes).map_err(|e| ConversionError::Malformed {
                path: source.to_path_buf(),
                source: e,
            })?;

        let total = gltf.nodes.len() as u64 + 1;
        progress.report(0, total)?;

        let mut document = SceneDocument::new();
        document.comment = Some(describe_source(source, gltf.asset.as_ref()));

        let mut used: HashSet<(NodeCategory, String)> = HashSet::new();
        for (index, gltf_node) in gltf.nodes.iter().enumerate() {
            let category = gltf_node.category();
            let name = unique_name(
                sanitize_name(gltf_node.name.as_deref(), index),
                category,
                &mut used,
            );
            let translation = gltf_node.translation.map(Vec3::from).unwrap_or(Vec3::ZERO);

            let node = Node::new(name, gltf_node.type_name())
                .with_attribute(TRANSLATE_ATTRIBUTE, AttributeData::static_value(translation));
            let path = document
                .insert_node(&category.group_path(), node)
                .map_err(|e| ConversionError::Converter(e.to_string()))?;

            debug!(
                task_id = %progress.task_id(),
                path = %path,
                mesh = ?gltf_node.mesh,
                "Converted node"
            );
            progress.report(index as u64 + 1, total)?;
        }

        write_output(destination, &document, progress, total).await
    }
}

/// Write the converted document as the final step
///
/// A cancelled task never leaves an artifact: cancellation is checked before
/// the write, and a cancellation that lands during the write removes the file.
async fn write_output(
    destination: &Path,
    document: &SceneDocument,
    progress: &ProgressReporter,
    total: u64,
) -> Result<(), ConversionError> {
    progress.checkpoint()?;
    FileStore::write_atomic(destination, document)
        .await
        .map_err(|e| ConversionError::Io {
            path: destination.to_path_buf(),
            source: e,
        })?;

    if let Err(e) = progress.report(total, total) {
        if let Err(remove_err) = tokio::fs::remove_file(destination).await {
            warn!(
                task_id = %progress.task_id(),
                error = %remove_err,
                "Failed to remove output of cancelled conversion"
            );
        }
        return Err(e);
    }
    Ok(())
}

fn describe_source(source: &Path, info: Option<&GltfAssetInfo>) -> String {
    let mut comment = format!("Converted from {}", source.display());
    if let Some(info) = info {
        if let Some(version) = &info.version {
            comment.push_str(&format!(" (glTF {})", version));
        }
        if let Some(generator) = &info.generator {
            comment.push_str(&format!(", generator: {}", generator));
        }
    }
    comment
}

/// Map a glTF node name onto a valid path segment
///
/// Invalid characters become `_`, a leading digit gets a `_` prefix and
/// unnamed nodes are called `node_<index>` (4 digits).
fn sanitize_name(name: Option<&str>, index: usize) -> String {
    let name = name.map(str::trim).filter(|n| !n.is_empty());
    let Some(name) = name else {
        return format!("node_{:04}", index);
    };

    let mut sanitized: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if sanitized.starts_with(|c: char| c.is_ascii_digit()) {
        sanitized.insert(0, '_');
    }
    sanitized
}

/// Suffix `_<n>` until the name is unused within its category
fn unique_name(
    name: String,
    category: NodeCategory,
    used: &mut HashSet<(NodeCategory, String)>,
) -> String {
    if used.insert((category, name.clone())) {
        return name;
    }
    let mut n = 1;
    loop {
        let candidate = format!("{}_{}", name, n);
        if used.insert((category, candidate.clone())) {
            return candidate;
        }
        n += 1;
    }
}
