//! Property names and the per-node set of names changed since the last commit.

use std::fmt;
use std::str::FromStr;

use crate::traits::BridgeError;

/// A camera view property, as named by the declarative framework.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldName {
    /// `cameraId`
    CameraId,
    /// `photo`
    Photo,
    /// `video`
    Video,
    /// `audio`
    Audio,
    /// `enableFrameProcessor`
    EnableFrameProcessor,
    /// `enableDepthData`
    EnableDepthData,
    /// `enableHighQualityPhotos`
    EnableHighQualityPhotos,
    /// `enablePortraitEffectsMatteDelivery`
    EnablePortraitEffectsMatteDelivery,
    /// `format`
    Format,
    /// `fps`
    Fps,
    /// `frameProcessorFps`
    FrameProcessorFps,
    /// `hdr`
    Hdr,
    /// `lowLightBoost`
    LowLightBoost,
    /// `colorSpace`
    ColorSpace,
    /// `isActive`
    IsActive,
    /// `torch`
    Torch,
    /// `zoom`
    Zoom,
    /// `enableZoomGesture`
    EnableZoomGesture,
    /// `orientation`
    Orientation,
}

impl FieldName {
    /// Every field, in declaration order.
    pub const ALL: [Self; 19] = [
        Self::CameraId,
        Self::Photo,
        Self::Video,
        Self::Audio,
        Self::EnableFrameProcessor,
        Self::EnableDepthData,
        Self::EnableHighQualityPhotos,
        Self::EnablePortraitEffectsMatteDelivery,
        Self::Format,
        Self::Fps,
        Self::FrameProcessorFps,
        Self::Hdr,
        Self::LowLightBoost,
        Self::ColorSpace,
        Self::IsActive,
        Self::Torch,
        Self::Zoom,
        Self::EnableZoomGesture,
        Self::Orientation,
    ];

    /// The framework's wire name for this field.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CameraId => "cameraId",
            Self::Photo => "photo",
            Self::Video => "video",
            Self::Audio => "audio",
            Self::EnableFrameProcessor => "enableFrameProcessor",
            Self::EnableDepthData => "enableDepthData",
            Self::EnableHighQualityPhotos => "enableHighQualityPhotos",
            Self::EnablePortraitEffectsMatteDelivery => "enablePortraitEffectsMatteDelivery",
            Self::Format => "format",
            Self::Fps => "fps",
            Self::FrameProcessorFps => "frameProcessorFps",
            Self::Hdr => "hdr",
            Self::LowLightBoost => "lowLightBoost",
            Self::ColorSpace => "colorSpace",
            Self::IsActive => "isActive",
            Self::Torch => "torch",
            Self::Zoom => "zoom",
            Self::EnableZoomGesture => "enableZoomGesture",
            Self::Orientation => "orientation",
        }
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldName {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| BridgeError::UnknownField(s.to_owned()))
    }
}

/// Ordered set of fields changed during one update transaction.
///
/// Duplicates collapse and iteration follows first-insertion order, so a
/// commit always hands the engine the same sequence for the same updates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    fields: Vec<FieldName>,
}

impl ChangeSet {
    /// Create an empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Add `field`. Returns `false` if it was already present.
    pub fn insert(&mut self, field: FieldName) -> bool {
        if self.contains(field) {
            return false;
        }
        self.fields.push(field);
        true
    }

    /// Whether `field` is in the set.
    #[must_use]
    pub fn contains(&self, field: FieldName) -> bool {
        self.fields.contains(&field)
    }

    /// Number of distinct fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = FieldName> + '_ {
        self.fields.iter().copied()
    }

    /// Move the contents out, leaving this set empty.
    pub fn take(&mut self) -> Self {
        std::mem::take(self)
    }
}

impl FromIterator<FieldName> for ChangeSet {
    fn from_iter<I: IntoIterator<Item = FieldName>>(iter: I) -> Self {
        let mut set = Self::new();
        for field in iter {
            set.insert(field);
        }
        set
    }
}

impl<'a> IntoIterator for &'a ChangeSet {
    type Item = FieldName;
    type IntoIter = std::iter::Copied<std::slice::Iter<'a, FieldName>>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter().copied()
    }
}

impl fmt::Display for ChangeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, field) in self.fields.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            f.write_str(field.as_str())?;
        }
        Ok(())
    }
}
