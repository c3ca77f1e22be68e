use serde::{Deserialize, Serialize};

use crate::{
    foundation::{
        core::ResourceId,
        error::{AtlasError, AtlasResult},
    },
    resources::resolver::ResourceHandle,
};

fn default_frame_time() -> u32 {
    1
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
/// One entry of an explicit frame order.
pub enum AnimationFrame {
    /// Frame index shown for the section's default frame time.
    Index(u32),
    /// Frame index with its own display time.
    Timed {
        /// Frame index into the sheet.
        index: u32,
        /// Display time in ticks; falls back to the section frame time.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        time: Option<u32>,
    },
}

impl AnimationFrame {
    /// Sheet index of this frame.
    pub fn index(&self) -> u32 {
        match *self {
            Self::Index(i) | Self::Timed { index: i, .. } => i,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
/// Animation section of a sprite's metadata.
///
/// The [`AnimationInfo::empty`] value stands in for sprites without metadata; its frame is the
/// whole raster.
pub struct AnimationInfo {
    /// Explicit frame width in pixels.
    #[serde(default, rename = "width", skip_serializing_if = "Option::is_none")]
    pub frame_width: Option<u32>,
    /// Explicit frame height in pixels.
    #[serde(default, rename = "height", skip_serializing_if = "Option::is_none")]
    pub frame_height: Option<u32>,
    /// Default display time per frame, in ticks.
    #[serde(default = "default_frame_time", rename = "frametime")]
    pub frame_time: u32,
    /// Blend between consecutive frames.
    #[serde(default)]
    pub interpolate: bool,
    /// Explicit frame order; empty means sheet order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub frames: Vec<AnimationFrame>,
    #[serde(skip)]
    empty: bool,
}

impl Default for AnimationInfo {
    fn default() -> Self {
        Self::empty()
    }
}

impl AnimationInfo {
    /// No-op animation used when a sprite has no metadata.
    pub fn empty() -> Self {
        Self {
            frame_width: None,
            frame_height: None,
            frame_time: 1,
            interpolate: false,
            frames: Vec::new(),
            empty: true,
        }
    }

    /// True for the no-metadata value.
    pub fn is_empty(&self) -> bool {
        self.empty
    }

    /// Logical frame size for a `width` x `height` raster.
    ///
    /// Explicit dimensions win; a single missing side falls back to the raster side; with neither,
    /// frames are squares of the shorter raster side. The raster must be an exact multiple of the
    /// frame size.
    pub fn frame_size(&self, id: &ResourceId, width: u32, height: u32) -> AtlasResult<(u32, u32)> {
        if self.empty {
            return Ok((width, height));
        }
        let (fw, fh) = match (self.frame_width, self.frame_height) {
            (Some(w), Some(h)) => (w, h),
            (Some(w), None) => (w, height),
            (None, Some(h)) => (width, h),
            (None, None) => {
                let side = width.min(height);
                (side, side)
            }
        };
        if fw == 0 || fh == 0 {
            return Err(AtlasError::metadata(id, "frame size must be non-zero"));
        }
        if width % fw != 0 || height % fh != 0 {
            return Err(AtlasError::metadata(
                id,
                format!("image size {width},{height} is not a multiple of frame size {fw},{fh}"),
            ));
        }
        Ok((fw, fh))
    }

    /// Number of frames laid out in a raster of the given size.
    pub fn frame_count(&self, id: &ResourceId, width: u32, height: u32) -> AtlasResult<u32> {
        let (fw, fh) = self.frame_size(id, width, height)?;
        Ok((width / fw) * (height / fh))
    }
}

/// Reads the optional animation section attached to an open resource.
pub trait AnimationMetadataReader: Send + Sync {
    /// Return the animation section, or `None` when the resource carries none.
    fn read(
        &self,
        id: &ResourceId,
        handle: &mut dyn ResourceHandle,
    ) -> AtlasResult<Option<AnimationInfo>>;
}

#[derive(Deserialize)]
struct MetadataFile {
    #[serde(default)]
    animation: Option<AnimationInfo>,
}

/// Reader for JSON sidecar metadata of the form `{"animation": {...}}`.
#[derive(Clone, Copy, Debug, Default)]
pub struct McmetaReader;

impl AnimationMetadataReader for McmetaReader {
    fn read(
        &self,
        id: &ResourceId,
        handle: &mut dyn ResourceHandle,
    ) -> AtlasResult<Option<AnimationInfo>> {
        let Some(bytes) = handle.metadata_bytes()? else {
            return Ok(None);
        };
        parse_metadata(id, &bytes)
    }
}

/// Parse sidecar metadata bytes into an animation section.
pub fn parse_metadata(id: &ResourceId, bytes: &[u8]) -> AtlasResult<Option<AnimationInfo>> {
    let file: MetadataFile =
        serde_json::from_slice(bytes).map_err(|e| AtlasError::metadata(id, e.to_string()))?;
    Ok(file.animation)
}

#[cfg(test)]
#[path = "../../tests/unit/resources/animation.rs"]
mod tests;
