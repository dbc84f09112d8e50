//! Bridge configuration loaded from a JSON file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::logs::LogOptions;
use crate::traits::{BridgeError, Result};

/// Top-level bridge configuration. Every field has a default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BridgeConfig {
    /// Logging options.
    pub log: LogOptions,
    /// V4L2 backend options.
    pub v4l2: V4L2Options,
}

/// Where the V4L2 backend looks for devices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct V4L2Options {
    /// sysfs class directory; engines are unavailable when it is missing.
    pub sysfs_root: PathBuf,
    /// Directory holding `videoN` device nodes.
    pub device_dir: PathBuf,
}

impl Default for V4L2Options {
    fn default() -> Self {
        Self {
            sysfs_root: PathBuf::from("/sys/class/video4linux"),
            device_dir: PathBuf::from("/dev"),
        }
    }
}

impl BridgeConfig {
    /// Load configuration from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|err| BridgeError::Config(format!("{}: {err}", path.display())))?;
        Self::from_json(&raw)
    }

    /// Parse configuration from a JSON string.
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|err| BridgeError::Config(err.to_string()))
    }
}
