//! Shared fixtures for sdx-sv integration tests

#![allow(dead_code)]

use sdx_common::document::{
    AttributeData, DocumentUrl, MemoryStore, Node, NodeCategory, RoutingStore, SceneDocument,
    TimeSample, Vec3, TRANSLATE_ATTRIBUTE,
};
use sdx_common::events::EventBus;
use sdx_sv::services::{GltfConverter, SceneService, TaskManager};
use sdx_sv::{build_router, AppState};
use std::sync::Arc;
use tempfile::TempDir;

/// Name of the seeded in-memory document
pub const DOC_NAME: &str = "stage";

pub fn doc_url() -> DocumentUrl {
    DocumentUrl::memory(DOC_NAME)
}

/// Scene with one node of every interesting shape
///
/// - `/Meshes/node_0001`: static translate (4, 5, 6)
/// - `/Meshes/node_0002`: time-sampled translate, keys 0 and 10
/// - `/Meshes/bare`: no translate attribute
/// - `/Meshes/empty_samples`: time-sampled translate with no samples
/// - `/Cameras/camera_main`: static translate (0, 0, 10)
pub fn fixture_document() -> SceneDocument {
    let mut doc = SceneDocument::new();
    let meshes = NodeCategory::Mesh.group_path();
    let cameras = NodeCategory::Camera.group_path();

    doc.insert_node(
        &meshes,
        Node::new("node_0001", "Mesh").with_attribute(
            TRANSLATE_ATTRIBUTE,
            AttributeData::static_value(Vec3::new(4.0, 5.0, 6.0)),
        ),
    )
    .unwrap();
    doc.insert_node(
        &meshes,
        Node::new("node_0002", "Mesh").with_attribute(
            TRANSLATE_ATTRIBUTE,
            AttributeData::time_sampled(vec![
                TimeSample::new(0.0, Vec3::new(0.0, 1.0, 2.0)),
                TimeSample::new(10.0, Vec3::new(10.0, 10.0, 10.0)),
            ]),
        ),
    )
    .unwrap();
    doc.insert_node(&meshes, Node::new("bare", "Mesh")).unwrap();
    doc.insert_node(
        &meshes,
        Node::new("empty_samples", "Mesh")
            .with_attribute(TRANSLATE_ATTRIBUTE, AttributeData::time_sampled(vec![])),
    )
    .unwrap();
    doc.insert_node(
        &meshes,
        Node::new("rig", "Xform").with_child(Node::new("arm", "Mesh").with_attribute(
            TRANSLATE_ATTRIBUTE,
            AttributeData::static_value(Vec3::new(0.0, 1.0, 0.0)),
        )),
    )
    .unwrap();
    doc.insert_node(
        &cameras,
        Node::new("camera_main", "Camera").with_attribute(
            TRANSLATE_ATTRIBUTE,
            AttributeData::static_value(Vec3::new(0.0, 0.0, 10.0)),
        ),
    )
    .unwrap();
    doc
}

/// Small glTF asset: two meshes and a camera
pub fn sample_gltf() -> String {
    serde_json::json!({
        "asset": { "version": "2.0", "generator": "sdx-tests" },
        "scene": 0,
        "scenes": [ { "nodes": [0, 1, 2] } ],
        "nodes": [
            { "name": "Cube", "mesh": 0, "translation": [1.0, 2.0, 3.0] },
            { "name": "Main Camera", "camera": 0, "translation": [0.0, 0.0, 10.0] },
            { "mesh": 1 }
        ],
        "meshes": [ { "primitives": [] }, { "primitives": [] } ],
        "cameras": [ { "type": "perspective" } ]
    })
    .to_string()
}

/// Service over a temp root folder and a seeded in-memory document
pub struct TestService {
    pub root: TempDir,
    pub memory: Arc<MemoryStore>,
    pub service: Arc<SceneService>,
}

impl TestService {
    pub async fn new() -> Self {
        Self::with_memory(MemoryStore::new()).await
    }

    pub async fn with_memory(memory: MemoryStore) -> Self {
        let root = TempDir::new().unwrap();
        let memory = Arc::new(memory);
        memory.insert(DOC_NAME, fixture_document()).await;

        let tasks = Arc::new(TaskManager::new(
            Arc::new(GltfConverter::new()),
            EventBus::new(256),
        ));
        let service = Arc::new(SceneService::new(
            Arc::new(RoutingStore::new(Arc::clone(&memory))),
            tasks,
            root.path().join("gltf"),
            root.path().join("scenes"),
        ));

        Self {
            root,
            memory,
            service,
        }
    }

    pub fn router(&self) -> axum::Router {
        build_router(AppState::new(Arc::clone(&self.service)))
    }
}
