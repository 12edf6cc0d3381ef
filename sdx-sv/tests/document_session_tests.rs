//! Document session and attribute operation tests
//!
//! Covers the session lifecycle (open → locate → read/write → save), the
//! static vs time-sampled resolution rules, and error classification.

mod helpers;

use helpers::{doc_url, fixture_document, TestService, DOC_NAME};
use sdx_common::document::{
    AttributeData, AttributeKind, DocumentStore, DocumentUrl, FileStore, MemoryStore,
    NodeCategory, NodePath, Vec3, TRANSLATE_ATTRIBUTE,
};
use sdx_sv::services::{DocumentLeases, DocumentSession, SessionError};
use sdx_sv::ErrorKind;
use std::sync::Arc;

async fn seeded_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    store.insert(DOC_NAME, fixture_document()).await;
    store
}

#[tokio::test]
async fn write_then_read_round_trips_static() {
    let store = seeded_store().await;
    let leases = DocumentLeases::new();

    let mut session = DocumentSession::open(store.clone(), &leases, doc_url())
        .await
        .unwrap();
    let node = session.locate_in(NodeCategory::Mesh, "node_0001").unwrap();
    let v = Vec3::new(-1.5, 0.25, 1e6);
    session.write_attribute(&node, v).unwrap();
    assert_eq!(session.read_attribute(&node).unwrap().value, v);
    session.save().await.unwrap();

    let session = DocumentSession::open(store, &leases, doc_url()).await.unwrap();
    let node = session.locate_in(NodeCategory::Mesh, "node_0001").unwrap();
    let read = session.read_attribute(&node).unwrap();
    assert_eq!(read.value, v);
    assert_eq!(read.kind, AttributeKind::Static);
}

#[tokio::test]
async fn writes_are_invisible_until_save() {
    let store = seeded_store().await;
    let leases = DocumentLeases::new();

    let mut session = DocumentSession::open(store.clone(), &leases, doc_url())
        .await
        .unwrap();
    let node = session.locate_in(NodeCategory::Mesh, "node_0001").unwrap();
    session.write_attribute(&node, Vec3::new(9.0, 9.0, 9.0)).unwrap();
    assert!(session.is_dirty());

    let stored = store.get(DOC_NAME).await.unwrap();
    let path: NodePath = "/Meshes/node_0001".parse().unwrap();
    assert_eq!(
        stored.node(&path).unwrap().attribute(TRANSLATE_ATTRIBUTE),
        Some(&AttributeData::static_value(Vec3::new(4.0, 5.0, 6.0)))
    );

    session.close();
    assert_eq!(store.save_count(), 0);
}

#[tokio::test]
async fn locate_missing_node_is_not_found() {
    let store = seeded_store().await;
    let leases = DocumentLeases::new();
    let session = DocumentSession::open(store, &leases, doc_url()).await.unwrap();

    for (category, name) in [
        (NodeCategory::Mesh, "does_not_exist"),
        (NodeCategory::Camera, "node_0001"),
        (NodeCategory::Mesh, "camera_main"),
    ] {
        let err = session.locate_in(category, name).unwrap_err();
        assert!(matches!(err, SessionError::NodeNotFound(_)), "{:?}", err);
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}

#[tokio::test]
async fn nested_nodes_are_located_by_full_path() {
    let store = seeded_store().await;
    let leases = DocumentLeases::new();
    let mut session = DocumentSession::open(store, &leases, doc_url()).await.unwrap();

    let path: NodePath = "/Meshes/rig/arm".parse().unwrap();
    let node = session.locate(&path).unwrap();
    assert_eq!(session.read_attribute(&node).unwrap().value, Vec3::new(0.0, 1.0, 0.0));
    session.write_attribute(&node, Vec3::new(2.0, 2.0, 2.0)).unwrap();
    assert_eq!(session.read_attribute(&node).unwrap().value, Vec3::new(2.0, 2.0, 2.0));

    // Category lookup only reaches direct children of the group
    assert!(matches!(
        session.locate_in(NodeCategory::Mesh, "arm"),
        Err(SessionError::NodeNotFound(_))
    ));
}

#[tokio::test]
async fn invalid_node_name_is_malformed_input() {
    let store = seeded_store().await;
    let leases = DocumentLeases::new();
    let session = DocumentSession::open(store, &leases, doc_url()).await.unwrap();

    for name in ["", "a/b", "..", "*", "1abc"] {
        let err = session.locate_in(NodeCategory::Mesh, name).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedInput, "name {:?}", name);
    }
}

#[tokio::test]
async fn missing_attribute_is_not_found() {
    let store = seeded_store().await;
    let leases = DocumentLeases::new();
    let mut session = DocumentSession::open(store, &leases, doc_url()).await.unwrap();
    let node = session.locate_in(NodeCategory::Mesh, "bare").unwrap();

    let err = session.read_attribute(&node).unwrap_err();
    assert!(matches!(err, SessionError::AttributeNotFound { .. }));
    assert_eq!(err.kind(), ErrorKind::NotFound);

    assert!(session.write_attribute(&node, Vec3::ZERO).is_err());
    assert!(!session.is_dirty());
}

#[tokio::test]
async fn empty_time_samples_are_not_found() {
    let store = seeded_store().await;
    let leases = DocumentLeases::new();
    let session = DocumentSession::open(store, &leases, doc_url()).await.unwrap();
    let node = session.locate_in(NodeCategory::Mesh, "empty_samples").unwrap();

    let err = session.read_attribute(&node).unwrap_err();
    assert!(matches!(err, SessionError::NoTimeSamples { .. }));
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn node_ref_from_another_session_is_rejected() {
    let store = seeded_store().await;
    let first_leases = DocumentLeases::new();
    let second_leases = DocumentLeases::new();

    let first = DocumentSession::open(store.clone(), &first_leases, doc_url())
        .await
        .unwrap();
    let second = DocumentSession::open(store, &second_leases, doc_url())
        .await
        .unwrap();

    let node = first.locate_in(NodeCategory::Mesh, "node_0001").unwrap();
    assert!(matches!(
        second.read_attribute(&node),
        Err(SessionError::StaleNode(_))
    ));
}

#[tokio::test]
async fn unreachable_document_is_connection_error() {
    let store = seeded_store().await;
    store.set_reachable(false);
    let leases = DocumentLeases::new();

    let err = DocumentSession::open(store.clone(), &leases, doc_url())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConnectionError);
    assert!(err.to_string().contains("mem://stage"));

    // The lease was released on failure
    assert_eq!(leases.active(), 0);
}

#[tokio::test]
async fn failed_save_is_connection_error_not_not_found() {
    let store = seeded_store().await;
    let leases = DocumentLeases::new();

    let mut session = DocumentSession::open(store.clone(), &leases, doc_url())
        .await
        .unwrap();
    let node = session.locate_in(NodeCategory::Mesh, "node_0001").unwrap();
    session.write_attribute(&node, Vec3::new(1.0, 1.0, 1.0)).unwrap();

    store.set_reachable(false);
    let err = session.save().await.unwrap_err();
    assert!(matches!(err, SessionError::Connection(_)));
    assert_eq!(err.kind(), ErrorKind::ConnectionError);
}

#[tokio::test]
async fn file_documents_round_trip() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("stage.sdoc");
    let url = DocumentUrl::file(&path);
    FileStore::new().save(&url, &fixture_document()).await.unwrap();

    let store: Arc<dyn DocumentStore> = Arc::new(FileStore::new());
    let leases = DocumentLeases::new();

    let mut session = DocumentSession::open(store.clone(), &leases, url.clone())
        .await
        .unwrap();
    let node = session.locate_in(NodeCategory::Camera, "camera_main").unwrap();
    session.write_attribute(&node, Vec3::new(3.0, 2.0, 1.0)).unwrap();
    session.save().await.unwrap();

    let session = DocumentSession::open(store, &leases, url).await.unwrap();
    let node = session.locate_in(NodeCategory::Camera, "camera_main").unwrap();
    assert_eq!(
        session.read_attribute(&node).unwrap().value,
        Vec3::new(3.0, 2.0, 1.0)
    );
}

// ============================================================================
// Service-level scenarios
// ============================================================================

#[tokio::test]
async fn set_then_get_static_attribute() {
    let t = TestService::new().await;

    let set = t
        .service
        .set_attribute(&doc_url(), NodeCategory::Mesh, "node_0001", Vec3::new(1.0, 2.0, 3.0))
        .await;
    assert_eq!(set.value().unwrap().value, "(1, 2, 3)");

    let get = t
        .service
        .get_attribute(&doc_url(), NodeCategory::Mesh, "node_0001")
        .await;
    let attribute = get.value().unwrap();
    assert_eq!(attribute.value, "(1, 2, 3)");
    assert_eq!(attribute.node_path, "/Meshes/node_0001");
    assert_eq!(attribute.kind, AttributeKind::Static);
}

#[tokio::test]
async fn set_time_sampled_writes_only_first_key() {
    let t = TestService::new().await;

    let set = t
        .service
        .set_attribute(&doc_url(), NodeCategory::Mesh, "node_0002", Vec3::new(7.0, 8.0, 9.0))
        .await;
    let written = set.value().unwrap();
    assert_eq!(written.kind, AttributeKind::TimeSampled);
    assert_eq!(written.time, Some(0.0));

    let stored = t.memory.get(DOC_NAME).await.unwrap();
    let path: NodePath = "/Meshes/node_0002".parse().unwrap();
    match stored.node(&path).unwrap().attribute(TRANSLATE_ATTRIBUTE).unwrap() {
        AttributeData::TimeSampled { samples } => {
            assert_eq!(samples.len(), 2);
            assert_eq!(samples.at(0.0), Some(Vec3::new(7.0, 8.0, 9.0)));
            assert_eq!(samples.at(10.0), Some(Vec3::new(10.0, 10.0, 10.0)));
        }
        other => panic!("attribute kind changed: {:?}", other),
    }
}

#[tokio::test]
async fn sequential_sets_last_writer_wins() {
    let t = TestService::new().await;
    let v1 = Vec3::new(1.0, 1.0, 1.0);
    let v2 = Vec3::new(2.0, 2.0, 2.0);

    assert!(t
        .service
        .set_attribute(&doc_url(), NodeCategory::Mesh, "node_0001", v1)
        .await
        .is_ok());
    assert!(t
        .service
        .set_attribute(&doc_url(), NodeCategory::Mesh, "node_0001", v2)
        .await
        .is_ok());

    let get = t
        .service
        .get_attribute(&doc_url(), NodeCategory::Mesh, "node_0001")
        .await;
    assert_eq!(get.value().unwrap().value, "(2, 2, 2)");
}

#[tokio::test]
async fn get_on_missing_node_is_a_failure_result() {
    let t = TestService::new().await;
    let result = t
        .service
        .get_attribute(&doc_url(), NodeCategory::Camera, "missing")
        .await;

    let failure = result.error().unwrap();
    assert_eq!(failure.kind, ErrorKind::NotFound);
    assert!(failure.message.contains("/Cameras/missing"));
}

#[tokio::test]
async fn unknown_document_is_connection_error() {
    let t = TestService::new().await;
    let result = t
        .service
        .get_attribute(&DocumentUrl::memory("elsewhere"), NodeCategory::Mesh, "node_0001")
        .await;
    assert_eq!(result.error().unwrap().kind, ErrorKind::ConnectionError);
}
