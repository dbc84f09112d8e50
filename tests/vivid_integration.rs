//! Integration tests driving the bridge against vivid virtual cameras.
//!
//! These tests require:
//! - The `integration` feature flag: `cargo test --features integration`
//! - The vivid kernel module loaded with two capture devices, i.e. with the
//!   module options `n_devs=2 node_types=0x1,0x1`
//! - Access to /dev/video* devices (may require sudo or video group membership)
//!
//! Tests will fail if vivid is not available or not configured correctly.

#![cfg(feature = "integration")]

use camera_view_bridge::config::V4L2Options;
use camera_view_bridge::{
    BridgeError, CameraEngine, CaptureFormat, CommitOutcome, FieldName, FourCC, NodeHandle,
    PropUpdate, V4L2EngineFactory, ViewRegistry,
};
use serde_json::json;
use serial_test::serial;
use std::fs;
use std::path::Path;

/// Find all available vivid virtual camera devices.
///
/// Uses sysfs to check device driver name before opening, avoiding
/// unnecessary device opens on real cameras.
fn find_vivid_devices() -> Vec<usize> {
    let video4linux = Path::new("/sys/class/video4linux");
    if !video4linux.exists() {
        return Vec::new();
    }

    let mut devices = Vec::new();
    for index in 0..10 {
        let name_path = video4linux.join(format!("video{index}")).join("name");
        let Ok(name) = fs::read_to_string(&name_path) else {
            continue;
        };

        if !name.to_lowercase().contains("vivid") {
            continue;
        }

        if v4l::Device::new(index).is_ok() {
            devices.push(index);
        }
    }
    devices
}

/// Macro to fail test if vivid is not available.
///
/// Returns the first vivid device index.
macro_rules! require_vivid {
    () => {
        match find_vivid_devices().first().copied() {
            Some(idx) => idx,
            None => {
                panic!(
                    "vivid virtual camera not available.\n\
                     Load the vivid module with options: n_devs=2 node_types=0x1,0x1\n\
                     Or run unit tests only: cargo test --lib"
                );
            }
        }
    };
}

/// Macro to get two vivid devices.
macro_rules! require_vivid_pair {
    () => {{
        let devices = find_vivid_devices();
        match devices.as_slice() {
            [first, second, ..] => (*first, *second),
            _ => panic!(
                "Two vivid devices required but found {}.\n\
                 Load the vivid module with options: n_devs=2 node_types=0x1,0x1\n\
                 Or run unit tests only: cargo test --lib",
                devices.len()
            ),
        }
    }};
}

fn registry() -> ViewRegistry<V4L2EngineFactory> {
    ViewRegistry::new(V4L2EngineFactory::new(V4L2Options::default()))
}

fn activate(registry: &ViewRegistry<V4L2EngineFactory>, node: NodeHandle, index: usize) {
    let camera_id = index.to_string();
    registry.set_field(node, PropUpdate::CameraId(Some(camera_id)));
    registry.set_field(node, PropUpdate::IsActive(true));
}

#[test]
#[serial]
fn test_vivid_commit_opens_device() {
    let device_index = require_vivid!();
    let registry = registry();
    let node = NodeHandle::next();
    registry.resolve(node).expect("Failed to resolve node");

    activate(&registry, node, device_index);
    let outcome = registry.commit(node).expect("Failed to commit");
    let CommitOutcome::Applied(fields) = outcome else {
        panic!("expected an apply, got {outcome:?}");
    };
    assert!(fields.contains(FieldName::CameraId));

    let engine = registry.resolve(node).expect("Failed to resolve node");
    let engine = engine.lock();
    let caps = engine.capabilities().expect("device should be open");
    assert!(caps.driver.contains("vivid"), "Expected vivid driver");
    assert!(caps.can_capture, "vivid should support capture");
    assert!(caps.can_stream, "vivid should support streaming");
    assert_eq!(engine.device_index(), Some(device_index));

    let (card, bus) = (&caps.card, &caps.bus_info);
    println!("Opened vivid device {device_index}: {card} ({bus})");
}

#[test]
#[serial]
fn test_vivid_format_commit() {
    let device_index = require_vivid!();
    let registry = registry();
    let node = NodeHandle::next();
    registry.resolve(node).expect("Failed to resolve node");

    activate(&registry, node, device_index);
    let format = json!({"width": 640, "height": 480, "pixelFormat": "YUYV"});
    registry.set_field(node, PropUpdate::Format(Some(format)));
    registry.commit(node).expect("Failed to commit");

    let engine = registry.resolve(node).expect("Failed to resolve node");
    let actual = engine.lock().active_format();
    let actual = actual.expect("format should be set");
    println!("Actual: {actual:?}");
    assert_eq!(actual, CaptureFormat::new(640, 480, FourCC::YUYV));
}

#[test]
#[serial]
fn test_vivid_fps_commit() {
    let device_index = require_vivid!();
    let registry = registry();
    let node = NodeHandle::next();
    registry.resolve(node).expect("Failed to resolve node");

    activate(&registry, node, device_index);
    registry.commit(node).expect("Failed to commit");

    registry.set_field(node, PropUpdate::Fps(30));
    let outcome = registry.commit(node).expect("Failed to commit fps");
    let expected = [FieldName::Fps].into_iter().collect();
    assert_eq!(outcome, CommitOutcome::Applied(expected));
}

#[test]
#[serial]
fn test_vivid_switch_camera_reapplies_format() {
    let (first, second) = require_vivid_pair!();
    let registry = registry();
    let node = NodeHandle::next();
    registry.resolve(node).expect("Failed to resolve node");

    activate(&registry, node, first);
    let format = json!({"width": 640, "height": 480});
    registry.set_field(node, PropUpdate::Format(Some(format)));
    registry.commit(node).expect("Failed to commit");

    let camera_id = format!("/dev/video{second}");
    registry.set_field(node, PropUpdate::CameraId(Some(camera_id)));
    registry.commit(node).expect("Failed to switch camera");

    let engine = registry.resolve(node).expect("Failed to resolve node");
    let engine = engine.lock();
    assert_eq!(engine.device_index(), Some(second));
    let format = engine.active_format().expect("format should be reapplied");
    assert_eq!((format.width, format.height), (640, 480));
}

#[test]
#[serial]
fn test_vivid_invalid_commit_reports_once() {
    let device_index = require_vivid!();
    let registry = registry();
    let node = NodeHandle::next();
    registry.resolve(node).expect("Failed to resolve node");

    activate(&registry, node, device_index);
    registry.set_field(node, PropUpdate::Zoom(2.0));

    let err = registry.commit(node).expect_err("Commit should fail");
    assert!(matches!(err, BridgeError::ApplyFailed { .. }));
    let retry = registry.commit(node).expect("Second commit");
    assert_eq!(retry, CommitOutcome::Clean);

    let engine = registry.resolve(node).expect("Failed to resolve node");
    let zoom = engine.lock().props().zoom;
    assert!((zoom - 2.0).abs() < f32::EPSILON);
}

#[test]
#[serial]
fn test_vivid_release_drops_engine() {
    let device_index = require_vivid!();
    let registry = registry();
    let node = NodeHandle::next();
    registry.resolve(node).expect("Failed to resolve node");

    activate(&registry, node, device_index);
    registry.commit(node).expect("Failed to commit");

    assert!(registry.release(node));
    assert!(registry.is_empty());

    // The device must be free again for a new node.
    let other = NodeHandle::next();
    registry.resolve(other).expect("Failed to resolve node");
    activate(&registry, other, device_index);
    registry.commit(other).expect("Failed to reopen device");
}
