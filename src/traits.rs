//! Core traits and types shared by the bridge and its engine backends.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::field::ChangeSet;
use crate::props::CameraProps;
use crate::registry::NodeHandle;

/// Pixel format representation (e.g., YUYV, MJPG).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FourCC(pub [u8; 4]);

impl FourCC {
    /// Create a new `FourCC` from a 4-byte array.
    #[must_use]
    pub const fn new(code: &[u8; 4]) -> Self {
        Self(*code)
    }

    /// YUYV pixel format (4:2:2 packed).
    pub const YUYV: Self = Self::new(b"YUYV");
    /// MJPEG pixel format (Motion JPEG).
    pub const MJPG: Self = Self::new(b"MJPG");
}

impl From<v4l::FourCC> for FourCC {
    fn from(fourcc: v4l::FourCC) -> Self {
        Self(fourcc.repr)
    }
}

impl From<FourCC> for v4l::FourCC {
    fn from(fourcc: FourCC) -> Self {
        Self::new(&fourcc.0)
    }
}

impl std::str::FromStr for FourCC {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self> {
        let Ok(code) = <[u8; 4]>::try_from(s.as_bytes()) else {
            return Err(BridgeError::InvalidProp {
                field: "format".to_owned(),
                reason: format!("pixel format `{s}` is not a four character code"),
            });
        };
        Ok(Self(code))
    }
}

impl std::fmt::Display for FourCC {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.0))
    }
}

impl Serialize for FourCC {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FourCC {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Capture format requested through the `format` property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureFormat {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Pixel format.
    #[serde(default = "default_pixel_format")]
    pub pixel_format: FourCC,
}

const fn default_pixel_format() -> FourCC {
    FourCC::YUYV
}

impl CaptureFormat {
    /// Create a new format specification.
    #[must_use]
    pub const fn new(width: u32, height: u32, pixel_format: FourCC) -> Self {
        Self {
            width,
            height,
            pixel_format,
        }
    }
}

/// Error type for bridge operations.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The execution context needed to build an engine is missing.
    #[error("Engine unavailable: {0}")]
    EngineUnavailable(String),

    /// The engine rejected a committed field set.
    #[error("Apply failed for {node} ({fields}): {source}")]
    ApplyFailed {
        /// Node whose transaction failed.
        node: NodeHandle,
        /// Fields that were committed.
        fields: ChangeSet,
        /// Engine-reported cause.
        #[source]
        source: Box<BridgeError>,
    },

    /// Property name outside the known field set.
    #[error("Unknown field: {0}")]
    UnknownField(String),

    /// Property value of the wrong shape.
    #[error("Invalid value for `{field}`: {reason}")]
    InvalidProp {
        /// Wire name of the property.
        field: String,
        /// What was wrong with it.
        reason: String,
    },

    /// Declared values cannot be applied together.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Camera device error.
    #[error("Device error: {0}")]
    Device(String),

    /// Bridge configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for bridge operations.
pub type Result<T> = std::result::Result<T, BridgeError>;

/// A live camera engine bound to one view node.
///
/// Field writes land in [`CameraProps`] immediately; the expensive
/// reconfiguration happens only in [`CameraEngine::apply`].
pub trait CameraEngine {
    /// Current declared property values.
    fn props(&self) -> &CameraProps;

    /// Mutable access for field writes.
    fn props_mut(&mut self) -> &mut CameraProps;

    /// Reconfigure for the fields named in `changed`. Never called with an
    /// empty set.
    fn apply(&mut self, changed: &ChangeSet) -> Result<()>;
}

/// Builds engines for newly observed nodes.
pub trait EngineFactory {
    /// The engine type produced.
    type Engine: CameraEngine;

    /// Create an engine for `node`.
    fn create(&self, node: NodeHandle) -> Result<Self::Engine>;
}
