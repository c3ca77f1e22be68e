use image::{RgbaImage, imageops};

use crate::{
    atlas::{
        materialize::{Placement, SpriteBaker},
        session::SpriteInfo,
    },
    foundation::{
        core::ResourceId,
        error::{AtlasError, BakeError},
    },
    resources::{decode::DecodedImage, resolver::ResourceHandle},
};

#[derive(Clone, Debug)]
/// Sprite ready for upload: placement plus its mip chain.
pub struct BakedSprite {
    /// Sprite id.
    pub id: ResourceId,
    /// Atlas x origin.
    pub x: u32,
    /// Atlas y origin.
    pub y: u32,
    /// Width of mip level 0.
    pub width: u32,
    /// Height of mip level 0.
    pub height: u32,
    /// Animation frames contained in the source sheet.
    pub frame_count: u32,
    /// Mip chain of the first frame; `mips[0]` is full size, each next level halves it.
    pub mips: Vec<RgbaImage>,
}

impl BakedSprite {
    /// Number of mip levels.
    pub fn mip_count(&self) -> usize {
        self.mips.len()
    }
}

/// [`SpriteBaker`] that crops the first frame, fits it to the placement and builds mipmaps.
#[derive(Clone, Copy, Debug, Default)]
pub struct StandardSpriteBaker;

impl SpriteBaker for StandardSpriteBaker {
    type Sprite = BakedSprite;

    fn bake(
        &self,
        info: &SpriteInfo,
        _handle: &dyn ResourceHandle,
        image: &DecodedImage,
        placement: &Placement,
    ) -> Result<BakedSprite, BakeError> {
        if placement.width == 0 || placement.height == 0 {
            return Err(AtlasError::bake(
                &info.id,
                format!("invalid placement size {}x{}", placement.width, placement.height),
            ));
        }
        let frame_count = info
            .animation
            .frame_count(&info.id, image.width, image.height)
            .map_err(|e| AtlasError::bake(&info.id, e.to_string()))?;
        if info.width > image.width || info.height > image.height {
            return Err(AtlasError::bake(
                &info.id,
                format!(
                    "frame {}x{} exceeds image {}x{}",
                    info.width, info.height, image.width, image.height
                ),
            ));
        }

        let frame = imageops::crop_imm(&image.rgba8, 0, 0, info.width, info.height).to_image();
        let base = if frame.dimensions() == (placement.width, placement.height) {
            frame
        } else {
            imageops::resize(
                &frame,
                placement.width,
                placement.height,
                imageops::FilterType::Nearest,
            )
        };

        // a chain halving down to 1x1 has at most bit_length(max side) levels
        let longest = u32::BITS - placement.width.max(placement.height).leading_zeros();
        let levels = longest.min(placement.mip_level.saturating_add(1)) as usize;
        let mut mips = Vec::with_capacity(levels);
        mips.push(base);
        for _ in 0..placement.mip_level {
            let Some(prev) = mips.last() else { break };
            let (w, h) = prev.dimensions();
            if w == 1 && h == 1 {
                break;
            }
            let next = imageops::resize(
                prev,
                (w / 2).max(1),
                (h / 2).max(1),
                imageops::FilterType::Triangle,
            );
            mips.push(next);
        }

        Ok(BakedSprite {
            id: info.id.clone(),
            x: placement.x,
            y: placement.y,
            width: placement.width,
            height: placement.height,
            frame_count,
            mips,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/atlas/sprite.rs"]
mod tests;
