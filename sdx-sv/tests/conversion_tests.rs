//! Upload and conversion workflow tests

mod helpers;

use helpers::{sample_gltf, TestService};
use sdx_common::document::{
    AttributeData, NodePath, SceneDocument, Vec3, TRANSLATE_ATTRIBUTE,
};
use sdx_common::events::SceneEvent;
use sdx_sv::models::{ConversionProgress, ConversionState};
use sdx_sv::services::CANCELLED_MESSAGE;
use sdx_sv::ErrorKind;
use std::time::Duration;

fn load_scene(path: &std::path::Path) -> SceneDocument {
    let bytes = std::fs::read(path).unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn convert_missing_source_fails_without_artifact() {
    let t = TestService::new().await;

    let result = t.service.convert_asset("1.gltf").await;

    let failure = result.error().expect("conversion should fail");
    assert_eq!(failure.kind, ErrorKind::ConversionFailure);
    assert!(!failure.message.is_empty());
    assert!(failure.message.contains("1.gltf"), "{}", failure.message);
    assert!(!t.root.path().join("scenes").join("1.sdoc").exists());
}

#[tokio::test]
async fn start_conversion_missing_source_reaches_failed() {
    let t = TestService::new().await;

    let status = t.service.start_conversion("1.gltf").value().cloned().unwrap();
    let task = t.service.tasks().get(&status.task_id).unwrap();
    assert!(!task.wait_until_finished().await);

    let status = t.service.conversion_status(&status.task_id).unwrap();
    assert_eq!(status.state, ConversionState::Failed);
    assert!(status.error_message.unwrap().contains("source file not found"));
}

#[tokio::test]
async fn upload_then_convert() {
    let t = TestService::new().await;

    let uploaded = t.service.upload_asset(&sample_gltf(), "1.gltf").await;
    assert!(uploaded.is_ok());
    let upload_path = t.root.path().join("gltf").join("1.gltf");
    assert!(upload_path.exists());

    let converted = t.service.convert_asset("1.gltf").await;
    let converted = converted.value().expect("conversion should succeed");
    let destination = t.root.path().join("scenes").join("1.sdoc");
    assert_eq!(converted.converted_document, destination.display().to_string());

    let scene = load_scene(&destination);
    let cube: NodePath = "/Meshes/Cube".parse().unwrap();
    let camera: NodePath = "/Cameras/Main_Camera".parse().unwrap();
    let unnamed: NodePath = "/Meshes/node_0002".parse().unwrap();

    assert_eq!(
        scene.node(&cube).unwrap().attribute(TRANSLATE_ATTRIBUTE),
        Some(&AttributeData::static_value(Vec3::new(1.0, 2.0, 3.0)))
    );
    assert_eq!(scene.node(&camera).unwrap().type_name, "Camera");
    assert_eq!(
        scene.node(&unnamed).unwrap().attribute(TRANSLATE_ATTRIBUTE),
        Some(&AttributeData::static_value(Vec3::ZERO))
    );

    // Blocking conversions reclaim their task
    assert!(t.service.tasks().is_empty());
}

#[tokio::test]
async fn malformed_upload_is_rejected() {
    let t = TestService::new().await;
    let result = t.service.upload_asset("{\"nodes\": [", "1.gltf").await;
    assert_eq!(result.error().unwrap().kind, ErrorKind::MalformedInput);
    assert!(!t.root.path().join("gltf").join("1.gltf").exists());
}

#[tokio::test]
async fn unparseable_source_fails_conversion() {
    let t = TestService::new().await;
    // Valid JSON but not a glTF document
    assert!(t.service.upload_asset("[1, 2, 3]", "bad.gltf").await.is_ok());

    let result = t.service.convert_asset("bad.gltf").await;
    let failure = result.error().unwrap();
    assert_eq!(failure.kind, ErrorKind::ConversionFailure);
    assert!(failure.message.contains("failed to parse"));
    assert!(!t.root.path().join("scenes").join("bad.sdoc").exists());
}

#[tokio::test]
async fn completed_task_is_stable_and_progress_is_complete() {
    let t = TestService::new().await;
    t.service.upload_asset(&sample_gltf(), "2.gltf").await;

    let status = t.service.start_conversion("2.gltf").value().cloned().unwrap();
    let task = t.service.tasks().get(&status.task_id).unwrap();
    assert!(task.wait_until_finished().await);

    let first = t.service.conversion_status(&status.task_id).unwrap();
    assert_eq!(first.state, ConversionState::Succeeded);
    // 3 nodes + final write
    assert_eq!(first.progress, ConversionProgress::new(4, 4));
    assert_eq!(first.error_message, None);

    tokio::time::sleep(Duration::from_millis(20)).await;
    let second = t.service.conversion_status(&status.task_id).unwrap();
    assert_eq!(second, first);
}

#[tokio::test]
async fn progress_events_are_monotonic() {
    let t = TestService::new().await;
    t.service.upload_asset(&sample_gltf(), "3.gltf").await;
    let mut rx = t.service.tasks().event_bus().subscribe();

    let status = t.service.start_conversion("3.gltf").value().cloned().unwrap();
    let task = t.service.tasks().get(&status.task_id).unwrap();
    task.wait_until_finished().await;

    let mut steps = Vec::new();
    let mut succeeded = false;
    while let Ok(event) = rx.try_recv() {
        match event {
            SceneEvent::ConversionProgress {
                current_step,
                total_steps,
                ..
            } => steps.push((current_step, total_steps)),
            SceneEvent::ConversionSucceeded { .. } => succeeded = true,
            _ => {}
        }
    }

    assert!(succeeded);
    assert!(!steps.is_empty());
    assert!(steps.windows(2).all(|w| w[1].0 >= w[0].0));
    assert!(steps.iter().all(|(current, total)| *total == 4 && current <= total));
}

#[tokio::test]
async fn cancelled_task_fails_with_cancellation_message() {
    let t = TestService::new().await;
    t.service.upload_asset(&sample_gltf(), "4.gltf").await;

    let status = t.service.start_conversion("4.gltf").value().cloned().unwrap();
    let task = t.service.tasks().get(&status.task_id).unwrap();
    t.service.cancel_conversion(&status.task_id);

    // Best-effort: the task may already have finished before the request
    let succeeded = task.wait_until_finished().await;
    let status = t.service.conversion_status(&status.task_id).unwrap();
    if succeeded {
        assert_eq!(status.state, ConversionState::Succeeded);
    } else {
        assert_eq!(status.state, ConversionState::Failed);
        assert_eq!(status.error_message.as_deref(), Some(CANCELLED_MESSAGE));
        assert!(!t.root.path().join("scenes").join("4.sdoc").exists());
    }
}

#[tokio::test]
async fn failed_cancellations_never_leave_output() {
    let t = TestService::new().await;
    t.service.upload_asset(&sample_gltf(), "race.gltf").await;
    let destination = t.root.path().join("scenes").join("race.sdoc");

    for _ in 0..20 {
        let status = t.service.start_conversion("race.gltf").value().cloned().unwrap();
        let task = t.service.tasks().get(&status.task_id).unwrap();
        tokio::task::yield_now().await;
        t.service.cancel_conversion(&status.task_id);

        if !task.wait_until_finished().await {
            assert!(!destination.exists(), "failed task left {}", destination.display());
        }
        let _ = std::fs::remove_file(&destination);
        t.service.tasks().reclaim(&status.task_id);
    }
}

#[tokio::test]
async fn converted_document_is_editable() {
    let t = TestService::new().await;
    t.service.upload_asset(&sample_gltf(), "5.gltf").await;
    let converted = t.service.convert_asset("5.gltf").await;
    let path = converted.value().unwrap().converted_document.clone();

    let url = format!("file://{}", path).parse().unwrap();
    let set = t
        .service
        .set_attribute(
            &url,
            sdx_common::document::NodeCategory::Mesh,
            "Cube",
            Vec3::new(0.5, -2.0, 3.25),
        )
        .await;
    assert_eq!(set.value().unwrap().value, "(0.5, -2, 3.25)");
}
