//! Typed camera view properties and single-field updates.

use serde_json::Value;

use crate::field::FieldName;
use crate::traits::{BridgeError, Result};

/// Torch setting applied when none is declared.
pub const DEFAULT_TORCH: &str = "off";
/// Orientation applied when none is declared.
pub const DEFAULT_ORIENTATION: &str = "portrait";
/// Frame processor rate applied when none is declared.
pub const DEFAULT_FRAME_PROCESSOR_FPS: f64 = 1.0;

/// Declared property values of one camera view.
// Flat on purpose: one member per view property.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, PartialEq)]
pub struct CameraProps {
    /// Device identifier.
    pub camera_id: Option<String>,
    /// Photo capture output.
    pub photo: Option<bool>,
    /// Video capture output.
    pub video: Option<bool>,
    /// Audio capture.
    pub audio: Option<bool>,
    /// Frame processor output.
    pub enable_frame_processor: bool,
    /// Depth data delivery.
    pub enable_depth_data: bool,
    /// High quality photo pipeline.
    pub enable_high_quality_photos: Option<bool>,
    /// Portrait effects matte delivery.
    pub enable_portrait_effects_matte_delivery: bool,
    /// User-supplied capture format description.
    pub format: Option<Value>,
    /// Capture frame rate. `None` lets the device choose.
    pub fps: Option<u32>,
    /// Frame processor invocation rate, `-1` for automatic.
    pub frame_processor_fps: f64,
    /// HDR mode.
    pub hdr: Option<bool>,
    /// Low light boost mode.
    pub low_light_boost: Option<bool>,
    /// Output color space.
    pub color_space: Option<String>,
    /// Whether the session should be running.
    pub is_active: bool,
    /// Torch mode (`off` or `on`).
    pub torch: String,
    /// Normalized zoom factor.
    pub zoom: f32,
    /// Pinch-to-zoom gesture.
    pub enable_zoom_gesture: bool,
    /// Output orientation.
    pub orientation: String,
}

impl Default for CameraProps {
    fn default() -> Self {
        Self {
            camera_id: None,
            photo: None,
            video: None,
            audio: None,
            enable_frame_processor: false,
            enable_depth_data: false,
            enable_high_quality_photos: None,
            enable_portrait_effects_matte_delivery: false,
            format: None,
            fps: None,
            frame_processor_fps: DEFAULT_FRAME_PROCESSOR_FPS,
            hdr: None,
            low_light_boost: None,
            color_space: None,
            is_active: false,
            torch: DEFAULT_TORCH.to_owned(),
            zoom: 0.0,
            enable_zoom_gesture: false,
            orientation: DEFAULT_ORIENTATION.to_owned(),
        }
    }
}

/// A new value for exactly one field.
#[derive(Debug, Clone, PartialEq)]
pub enum PropUpdate {
    /// New `cameraId`.
    CameraId(Option<String>),
    /// New `photo`.
    Photo(Option<bool>),
    /// New `video`.
    Video(Option<bool>),
    /// New `audio`.
    Audio(Option<bool>),
    /// New `enableFrameProcessor`.
    EnableFrameProcessor(bool),
    /// New `enableDepthData`.
    EnableDepthData(bool),
    /// New `enableHighQualityPhotos`.
    EnableHighQualityPhotos(Option<bool>),
    /// New `enablePortraitEffectsMatteDelivery`.
    EnablePortraitEffectsMatteDelivery(bool),
    /// New `format`.
    Format(Option<Value>),
    /// New `fps`; zero or negative means unset.
    Fps(i32),
    /// New `frameProcessorFps`.
    FrameProcessorFps(f64),
    /// New `hdr`.
    Hdr(Option<bool>),
    /// New `lowLightBoost`.
    LowLightBoost(Option<bool>),
    /// New `colorSpace`.
    ColorSpace(Option<String>),
    /// New `isActive`.
    IsActive(bool),
    /// New `torch`.
    Torch(String),
    /// New `zoom`, narrowed to `f32` on write.
    Zoom(f64),
    /// New `enableZoomGesture`.
    EnableZoomGesture(bool),
    /// New `orientation`.
    Orientation(String),
}

/// Write `new` into `slot` unless it is already equal.
fn replace_if_changed<T: PartialEq>(slot: &mut T, new: T) -> bool {
    if *slot == new {
        return false;
    }
    *slot = new;
    true
}

/// [`replace_if_changed`] for floats, where a NaN never equals itself.
fn replace_float_if_changed<T>(slot: &mut T, new: T) -> bool
where
    T: Copy + PartialEq + Into<f64>,
{
    let current: f64 = (*slot).into();
    let incoming: f64 = new.into();
    if current.is_nan() && incoming.is_nan() {
        return false;
    }
    replace_if_changed(slot, new)
}

impl PropUpdate {
    /// The field this update targets.
    #[must_use]
    pub const fn field(&self) -> FieldName {
        match self {
            Self::CameraId(_) => FieldName::CameraId,
            Self::Photo(_) => FieldName::Photo,
            Self::Video(_) => FieldName::Video,
            Self::Audio(_) => FieldName::Audio,
            Self::EnableFrameProcessor(_) => FieldName::EnableFrameProcessor,
            Self::EnableDepthData(_) => FieldName::EnableDepthData,
            Self::EnableHighQualityPhotos(_) => FieldName::EnableHighQualityPhotos,
            Self::EnablePortraitEffectsMatteDelivery(_) => {
                FieldName::EnablePortraitEffectsMatteDelivery
            }
            Self::Format(_) => FieldName::Format,
            Self::Fps(_) => FieldName::Fps,
            Self::FrameProcessorFps(_) => FieldName::FrameProcessorFps,
            Self::Hdr(_) => FieldName::Hdr,
            Self::LowLightBoost(_) => FieldName::LowLightBoost,
            Self::ColorSpace(_) => FieldName::ColorSpace,
            Self::IsActive(_) => FieldName::IsActive,
            Self::Torch(_) => FieldName::Torch,
            Self::Zoom(_) => FieldName::Zoom,
            Self::EnableZoomGesture(_) => FieldName::EnableZoomGesture,
            Self::Orientation(_) => FieldName::Orientation,
        }
    }

    /// Write the value into `props` if it differs from the current one.
    ///
    /// Returns `true` when a write happened.
    pub fn write_to(self, props: &mut CameraProps) -> bool {
        match self {
            Self::CameraId(v) => replace_if_changed(&mut props.camera_id, v),
            Self::Photo(v) => replace_if_changed(&mut props.photo, v),
            Self::Video(v) => replace_if_changed(&mut props.video, v),
            Self::Audio(v) => replace_if_changed(&mut props.audio, v),
            Self::EnableFrameProcessor(v) => {
                replace_if_changed(&mut props.enable_frame_processor, v)
            }
            Self::EnableDepthData(v) => replace_if_changed(&mut props.enable_depth_data, v),
            Self::EnableHighQualityPhotos(v) => {
                replace_if_changed(&mut props.enable_high_quality_photos, v)
            }
            Self::EnablePortraitEffectsMatteDelivery(v) => {
                replace_if_changed(&mut props.enable_portrait_effects_matte_delivery, v)
            }
            Self::Format(v) => replace_if_changed(&mut props.format, v),
            Self::Fps(v) => {
                let fps = u32::try_from(v).ok().filter(|fps| *fps > 0);
                replace_if_changed(&mut props.fps, fps)
            }
            Self::FrameProcessorFps(v) => {
                replace_float_if_changed(&mut props.frame_processor_fps, v)
            }
            Self::Hdr(v) => replace_if_changed(&mut props.hdr, v),
            Self::LowLightBoost(v) => replace_if_changed(&mut props.low_light_boost, v),
            Self::ColorSpace(v) => replace_if_changed(&mut props.color_space, v),
            Self::IsActive(v) => replace_if_changed(&mut props.is_active, v),
            Self::Torch(v) => replace_if_changed(&mut props.torch, v),
            Self::Zoom(v) => {
                #[allow(clippy::cast_possible_truncation)]
                let zoom = v as f32;
                replace_float_if_changed(&mut props.zoom, zoom)
            }
            Self::EnableZoomGesture(v) => replace_if_changed(&mut props.enable_zoom_gesture, v),
            Self::Orientation(v) => replace_if_changed(&mut props.orientation, v),
        }
    }

    /// Decode a dynamic framework value for the property named `name`.
    ///
    /// `null` clears nullable fields and resets the others to their default.
    pub fn from_json(name: &str, value: &Value) -> Result<Self> {
        let field: FieldName = name.parse()?;
        let update = match field {
            FieldName::CameraId => Self::CameraId(opt_string(field, value)?),
            FieldName::Photo => Self::Photo(opt_bool(field, value)?),
            FieldName::Video => Self::Video(opt_bool(field, value)?),
            FieldName::Audio => Self::Audio(opt_bool(field, value)?),
            FieldName::EnableFrameProcessor => {
                Self::EnableFrameProcessor(opt_bool(field, value)?.unwrap_or(false))
            }
            FieldName::EnableDepthData => {
                Self::EnableDepthData(opt_bool(field, value)?.unwrap_or(false))
            }
            FieldName::EnableHighQualityPhotos => {
                Self::EnableHighQualityPhotos(opt_bool(field, value)?)
            }
            FieldName::EnablePortraitEffectsMatteDelivery => {
                Self::EnablePortraitEffectsMatteDelivery(opt_bool(field, value)?.unwrap_or(false))
            }
            FieldName::Format => match value {
                Value::Null => Self::Format(None),
                Value::Object(_) => Self::Format(Some(value.clone())),
                _ => return Err(invalid(field, "expected an object")),
            },
            FieldName::Fps => Self::Fps(opt_int(field, value)?.unwrap_or(-1)),
            FieldName::FrameProcessorFps => {
                Self::FrameProcessorFps(number_or(field, value, DEFAULT_FRAME_PROCESSOR_FPS)?)
            }
            FieldName::Hdr => Self::Hdr(opt_bool(field, value)?),
            FieldName::LowLightBoost => Self::LowLightBoost(opt_bool(field, value)?),
            FieldName::ColorSpace => Self::ColorSpace(opt_string(field, value)?),
            FieldName::IsActive => Self::IsActive(opt_bool(field, value)?.unwrap_or(false)),
            FieldName::Torch => Self::Torch(string_or(field, value, DEFAULT_TORCH)?),
            FieldName::Zoom => Self::Zoom(opt_number(field, value)?.unwrap_or(0.0)),
            FieldName::EnableZoomGesture => {
                Self::EnableZoomGesture(opt_bool(field, value)?.unwrap_or(false))
            }
            FieldName::Orientation => {
                Self::Orientation(string_or(field, value, DEFAULT_ORIENTATION)?)
            }
        };
        Ok(update)
    }
}

fn invalid(field: FieldName, reason: &str) -> BridgeError {
    BridgeError::InvalidProp {
        field: field.as_str().to_owned(),
        reason: reason.to_owned(),
    }
}

fn opt_bool(field: FieldName, value: &Value) -> Result<Option<bool>> {
    match value {
        Value::Null => Ok(None),
        Value::Bool(b) => Ok(Some(*b)),
        _ => Err(invalid(field, "expected a boolean")),
    }
}

fn opt_string(field: FieldName, value: &Value) -> Result<Option<String>> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        _ => Err(invalid(field, "expected a string")),
    }
}

fn string_or(field: FieldName, value: &Value, default: &str) -> Result<String> {
    let s = opt_string(field, value)?;
    Ok(s.unwrap_or_else(|| default.to_owned()))
}

fn number_or(field: FieldName, value: &Value, default: f64) -> Result<f64> {
    Ok(opt_number(field, value)?.unwrap_or(default))
}

fn opt_number(field: FieldName, value: &Value) -> Result<Option<f64>> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => n
            .as_f64()
            .map(Some)
            .ok_or_else(|| invalid(field, "number out of range")),
        _ => Err(invalid(field, "expected a number")),
    }
}

fn opt_int(field: FieldName, value: &Value) -> Result<Option<i32>> {
    let Some(n) = opt_number(field, value)? else {
        return Ok(None);
    };
    if n.fract() != 0.0 || n < f64::from(i32::MIN) || n > f64::from(i32::MAX) {
        return Err(invalid(field, "expected an integer"));
    }
    #[allow(clippy::cast_possible_truncation)]
    let n = n as i32;
    Ok(Some(n))
}
