use crate::foundation::{
    core::ResourceId,
    error::{AtlasError, AtlasResult},
};

#[derive(Clone, Debug)]
/// Decoded sprite sheet in straight-alpha RGBA8.
pub struct DecodedImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Row-major RGBA8 pixels.
    pub rgba8: image::RgbaImage,
}

impl DecodedImage {
    /// Wrap an already decoded RGBA8 buffer.
    pub fn from_rgba8(rgba8: image::RgbaImage) -> Self {
        let (width, height) = rgba8.dimensions();
        Self {
            width,
            height,
            rgba8,
        }
    }
}

/// Turns raw resource bytes into a raster image.
pub trait ImageDecoder: Send + Sync {
    /// Decode `bytes` read for `id`.
    fn decode(&self, id: &ResourceId, bytes: &[u8]) -> AtlasResult<DecodedImage>;
}

/// [`ImageDecoder`] backed by the `image` crate's format detection.
#[derive(Clone, Copy, Debug, Default)]
pub struct RasterDecoder;

impl ImageDecoder for RasterDecoder {
    fn decode(&self, id: &ResourceId, bytes: &[u8]) -> AtlasResult<DecodedImage> {
        decode_image(id, bytes)
    }
}

/// Decode encoded image bytes and convert to RGBA8.
pub fn decode_image(id: &ResourceId, bytes: &[u8]) -> AtlasResult<DecodedImage> {
    let dyn_img =
        image::load_from_memory(bytes).map_err(|e| AtlasError::decode(id, e.to_string()))?;
    let rgba8 = dyn_img.to_rgba8();
    if rgba8.width() == 0 || rgba8.height() == 0 {
        return Err(AtlasError::decode(id, "image has zero width or height"));
    }
    Ok(DecodedImage::from_rgba8(rgba8))
}

#[cfg(test)]
#[path = "../../tests/unit/resources/decode.rs"]
mod tests;
