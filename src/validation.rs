//! Property validation shared by engine backends.
//!
//! Engines call [`validate_props`] at the top of `apply` so that an invalid
//! combination is rejected before any hardware is touched.

use serde_json::Value;

use crate::field::{ChangeSet, FieldName};
use crate::props::CameraProps;
use crate::traits::{BridgeError, CaptureFormat, Result};

/// Torch modes understood by the engines.
pub const TORCH_MODES: [&str; 2] = ["off", "on"];

/// Orientations understood by the engines.
pub const ORIENTATIONS: [&str; 4] = [
    "portrait",
    "portraitUpsideDown",
    "landscapeLeft",
    "landscapeRight",
];

/// Sentinel for "pick the frame processor rate automatically".
pub const AUTO_FRAME_PROCESSOR_FPS: f64 = -1.0;

/// Validates the declared properties touched by `changed`.
///
/// Checks on a single field run only when that field changed. The
/// `isActive`/`cameraId` pairing runs whenever either side changed.
///
/// # Errors
///
/// Returns `InvalidConfiguration` describing the first violation found.
pub fn validate_props(props: &CameraProps, changed: &ChangeSet) -> Result<()> {
    for field in changed {
        match field {
            FieldName::Zoom => validate_zoom(props.zoom)?,
            FieldName::Torch => validate_choice(field, &props.torch, &TORCH_MODES)?,
            FieldName::Orientation => {
                validate_choice(field, &props.orientation, &ORIENTATIONS)?;
            }
            FieldName::FrameProcessorFps => {
                validate_frame_processor_fps(props.frame_processor_fps)?;
            }
            FieldName::Format => validate_format(props.format.as_ref())?,
            FieldName::Hdr | FieldName::LowLightBoost => validate_exclusive_modes(props)?,
            _ => {}
        }
    }

    let session_touched =
        changed.contains(FieldName::IsActive) || changed.contains(FieldName::CameraId);
    let missing_camera = props.camera_id.as_deref().is_none_or(str::is_empty);
    if session_touched && props.is_active && missing_camera {
        return Err(BridgeError::InvalidConfiguration(
            "isActive requires a cameraId".to_owned(),
        ));
    }

    Ok(())
}

/// Decodes the user-supplied `format` map into a capture format.
///
/// # Errors
///
/// Returns `InvalidConfiguration` if the map is missing dimensions, has a
/// zero dimension, or names a pixel format that is not four characters.
pub fn decode_format(value: &Value) -> Result<CaptureFormat> {
    let format: CaptureFormat = serde_json::from_value(value.clone())
        .map_err(|err| BridgeError::InvalidConfiguration(format!("format: {err}")))?;

    if format.width == 0 || format.height == 0 {
        return Err(BridgeError::InvalidConfiguration(format!(
            "format: {}x{} has a zero dimension",
            format.width, format.height
        )));
    }
    Ok(format)
}

fn validate_format(format: Option<&Value>) -> Result<()> {
    if let Some(format) = format {
        decode_format(format)?;
    }
    Ok(())
}

fn validate_exclusive_modes(props: &CameraProps) -> Result<()> {
    if props.hdr == Some(true) && props.low_light_boost == Some(true) {
        return Err(BridgeError::InvalidConfiguration(
            "hdr and lowLightBoost cannot be enabled together".to_owned(),
        ));
    }
    Ok(())
}

fn validate_zoom(zoom: f32) -> Result<()> {
    if zoom.is_finite() && (0.0..=1.0).contains(&zoom) {
        return Ok(());
    }
    Err(BridgeError::InvalidConfiguration(format!(
        "zoom {zoom} outside 0.0..=1.0"
    )))
}

#[allow(clippy::float_cmp)]
fn validate_frame_processor_fps(fps: f64) -> Result<()> {
    if (fps.is_finite() && fps > 0.0) || fps == AUTO_FRAME_PROCESSOR_FPS {
        return Ok(());
    }
    Err(BridgeError::InvalidConfiguration(format!(
        "frameProcessorFps {fps} must be positive or -1"
    )))
}

fn validate_choice(field: FieldName, value: &str, allowed: &[&str]) -> Result<()> {
    if allowed.contains(&value) {
        return Ok(());
    }
    Err(BridgeError::InvalidConfiguration(format!(
        "{field} `{value}` is not one of {}",
        allowed.join(", ")
    )))
}
