//! V4L2 engine backend using the v4l crate.

use std::path::{Path, PathBuf};

use tracing::{debug, info};
use v4l::video::capture::Parameters;
use v4l::video::Capture;
use v4l::Device;

use crate::config::V4L2Options;
use crate::field::{ChangeSet, FieldName};
use crate::props::CameraProps;
use crate::registry::NodeHandle;
use crate::traits::{BridgeError, CameraEngine, CaptureFormat, EngineFactory, FourCC, Result};
use crate::validation::{decode_format, validate_props};

/// Device capability flags.
#[derive(Debug, Clone, Default)]
pub struct DeviceCapabilities {
    /// Driver name.
    pub driver: String,
    /// Card/device name.
    pub card: String,
    /// Bus information.
    pub bus_info: String,
    /// Whether the device can capture video.
    pub can_capture: bool,
    /// Whether the device supports streaming.
    pub can_stream: bool,
}

struct OpenDevice {
    index: usize,
    device: Device,
    capabilities: DeviceCapabilities,
    format: Option<CaptureFormat>,
}

impl OpenDevice {
    fn open(device_dir: &Path, index: usize) -> Result<Self> {
        let path = device_dir.join(format!("video{index}"));
        let device = Device::with_path(&path)
            .map_err(|err| BridgeError::Device(format!("{}: {err}", path.display())))?;

        let caps = device
            .query_caps()
            .map_err(|err| BridgeError::Device(err.to_string()))?;

        let capabilities = DeviceCapabilities {
            driver: caps.driver,
            card: caps.card,
            bus_info: caps.bus,
            can_capture: caps.capabilities.contains(v4l::capability::Flags::VIDEO_CAPTURE),
            can_stream: caps.capabilities.contains(v4l::capability::Flags::STREAMING),
        };
        if !capabilities.can_capture {
            return Err(BridgeError::Device(format!(
                "{} ({}) is not a capture device",
                path.display(),
                capabilities.card
            )));
        }

        Ok(Self {
            index,
            device,
            capabilities,
            format: None,
        })
    }

    fn set_format(&mut self, format: &CaptureFormat) -> Result<CaptureFormat> {
        let mut fmt = self
            .device
            .format()
            .map_err(|err| BridgeError::Device(err.to_string()))?;

        fmt.width = format.width;
        fmt.height = format.height;
        fmt.fourcc = format.pixel_format.into();

        let fmt = self
            .device
            .set_format(&fmt)
            .map_err(|err| BridgeError::Device(err.to_string()))?;

        let actual = CaptureFormat {
            width: fmt.width,
            height: fmt.height,
            pixel_format: FourCC::from(fmt.fourcc),
        };
        self.format = Some(actual);
        Ok(actual)
    }

    fn set_fps(&self, fps: u32) -> Result<()> {
        self.device
            .set_params(&Parameters::with_fps(fps))
            .map_err(|err| BridgeError::Device(err.to_string()))?;
        Ok(())
    }
}

/// Camera engine driving a V4L2 capture device.
///
/// `cameraId` selects the device, `format` and `fps` are pushed to the
/// driver. The remaining fields have no V4L2 counterpart and are kept as
/// declared state.
pub struct V4L2Engine {
    node: NodeHandle,
    device_dir: PathBuf,
    props: CameraProps,
    device: Option<OpenDevice>,
}

impl V4L2Engine {
    /// Create an engine with no device open.
    #[must_use]
    pub fn new<P: Into<PathBuf>>(node: NodeHandle, device_dir: P) -> Self {
        Self {
            node,
            device_dir: device_dir.into(),
            props: CameraProps::default(),
            device: None,
        }
    }

    /// Index of the open device, if any.
    #[must_use]
    pub fn device_index(&self) -> Option<usize> {
        self.device.as_ref().map(|open| open.index)
    }

    /// Capabilities of the open device, if any.
    #[must_use]
    pub fn capabilities(&self) -> Option<&DeviceCapabilities> {
        self.device.as_ref().map(|open| &open.capabilities)
    }

    /// Format last accepted by the driver, if any.
    #[must_use]
    pub fn active_format(&self) -> Option<CaptureFormat> {
        self.device.as_ref().and_then(|open| open.format)
    }

    fn reopen(&mut self) -> Result<()> {
        self.device = None;
        let Some(camera_id) = self.props.camera_id.as_deref() else {
            info!(node = %self.node, "camera closed");
            return Ok(());
        };

        let index = parse_camera_id(camera_id)?;
        let open = OpenDevice::open(&self.device_dir, index)?;
        info!(
            node = %self.node,
            index,
            driver = %open.capabilities.driver,
            card = %open.capabilities.card,
            bus = %open.capabilities.bus_info,
            "camera opened"
        );
        self.device = Some(open);
        Ok(())
    }
}

impl CameraEngine for V4L2Engine {
    fn props(&self) -> &CameraProps {
        &self.props
    }

    fn props_mut(&mut self) -> &mut CameraProps {
        &mut self.props
    }

    fn apply(&mut self, changed: &ChangeSet) -> Result<()> {
        validate_props(&self.props, changed)?;

        let reopened = changed.contains(FieldName::CameraId);
        if reopened {
            self.reopen()?;
        }

        let Some(open) = self.device.as_mut() else {
            debug!(node = %self.node, fields = %changed, "no device open, fields recorded");
            return Ok(());
        };

        if reopened || changed.contains(FieldName::Format) {
            if let Some(format) = &self.props.format {
                let requested = decode_format(format)?;
                let actual = open.set_format(&requested)?;
                debug!(
                    node = %self.node,
                    width = actual.width,
                    height = actual.height,
                    pixel_format = %actual.pixel_format,
                    "format set"
                );
            }
        }

        if reopened || changed.contains(FieldName::Fps) {
            if let Some(fps) = self.props.fps {
                open.set_fps(fps)?;
                debug!(node = %self.node, fps, "frame rate set");
            }
        }

        Ok(())
    }
}

/// Parse a `cameraId` of the form `"2"` or `"/dev/video2"` into a device index.
pub fn parse_camera_id(camera_id: &str) -> Result<usize> {
    let digits = Path::new(camera_id)
        .file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.strip_prefix("video").unwrap_or(name));

    if let Some(index) = digits.and_then(|d| d.parse().ok()) {
        return Ok(index);
    }
    Err(BridgeError::InvalidConfiguration(format!(
        "cameraId `{camera_id}` is not a V4L2 device"
    )))
}

/// Builds [`V4L2Engine`]s while the video4linux subsystem is present.
#[derive(Debug, Clone, Default)]
pub struct V4L2EngineFactory {
    options: V4L2Options,
}

impl V4L2EngineFactory {
    /// Create a factory with the given device locations.
    #[must_use]
    pub const fn new(options: V4L2Options) -> Self {
        Self { options }
    }
}

impl EngineFactory for V4L2EngineFactory {
    type Engine = V4L2Engine;

    fn create(&self, node: NodeHandle) -> Result<V4L2Engine> {
        if !self.options.sysfs_root.is_dir() {
            return Err(BridgeError::EngineUnavailable(format!(
                "video4linux not present at {}",
                self.options.sysfs_root.display()
            )));
        }
        Ok(V4L2Engine::new(node, self.options.device_dir.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options_in_tmp() -> V4L2Options {
        V4L2Options {
            sysfs_root: std::env::temp_dir(),
            device_dir: std::env::temp_dir().join("camera-view-bridge-no-devices"),
        }
    }

    #[test]
    fn test_parse_camera_id() {
        assert_eq!(parse_camera_id("0").expect("index"), 0);
        assert_eq!(parse_camera_id("/dev/video2").expect("path"), 2);
        assert_eq!(parse_camera_id("video11").expect("name"), 11);
        assert!(parse_camera_id("front").is_err());
        assert!(parse_camera_id("").is_err());
    }

    #[test]
    fn test_factory_unavailable_without_sysfs() {
        let factory = V4L2EngineFactory::new(V4L2Options {
            sysfs_root: PathBuf::from("/nonexistent/video4linux"),
            ..V4L2Options::default()
        });
        let err = factory.create(NodeHandle::next()).err();
        assert!(matches!(err, Some(BridgeError::EngineUnavailable(_))));
    }

    #[test]
    fn test_apply_without_device_records_fields() {
        let factory = V4L2EngineFactory::new(options_in_tmp());
        let mut engine = factory
            .create(NodeHandle::next())
            .expect("create should succeed");
        engine.props_mut().zoom = 0.5;
        engine.props_mut().torch = "on".to_owned();

        let changed: ChangeSet = [FieldName::Zoom, FieldName::Torch].into_iter().collect();
        engine.apply(&changed).expect("apply should succeed");
        assert!(engine.device_index().is_none());
        assert!(engine.active_format().is_none());
    }

    #[test]
    fn test_apply_rejects_invalid_values() {
        let mut engine = V4L2Engine::new(NodeHandle::next(), "/dev");
        engine.props_mut().orientation = "sideways".to_owned();

        let changed: ChangeSet = [FieldName::Orientation].into_iter().collect();
        let err = engine.apply(&changed).expect_err("apply should fail");
        assert!(matches!(err, BridgeError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_apply_missing_device() {
        let mut engine = V4L2Engine::new(NodeHandle::next(), options_in_tmp().device_dir);
        engine.props_mut().camera_id = Some("0".to_owned());

        let changed: ChangeSet = [FieldName::CameraId].into_iter().collect();
        let err = engine.apply(&changed).expect_err("apply should fail");
        assert!(matches!(err, BridgeError::Device(_)));
        assert!(engine.device_index().is_none());
    }

    #[test]
    fn test_clearing_camera_id_closes_device() {
        let mut engine = V4L2Engine::new(NodeHandle::next(), "/dev");
        let changed: ChangeSet = [FieldName::CameraId].into_iter().collect();
        engine.apply(&changed).expect("apply should succeed");
        assert!(engine.capabilities().is_none());
    }
}
