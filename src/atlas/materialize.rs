use crate::{
    atlas::session::{BuildSession, SpriteInfo, SpriteRecord},
    foundation::error::{AtlasError, AtlasResult, BakeError},
    resources::{decode::DecodedImage, resolver::ResourceHandle},
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// Where and how large a sprite ends up in the stitched atlas.
pub struct Placement {
    /// Final width in pixels.
    pub width: u32,
    /// Final height in pixels.
    pub height: u32,
    /// Highest mip level the atlas uses (0 = no mipmaps).
    pub mip_level: u32,
    /// Atlas x origin.
    pub x: u32,
    /// Atlas y origin.
    pub y: u32,
}

/// Engine-side step that turns a loaded sprite into its final atlas form.
pub trait SpriteBaker {
    /// Final sprite type.
    type Sprite;

    /// Bake `info` from its open resource and decoded raster.
    ///
    /// The resource is closed by the caller once this returns.
    fn bake(
        &self,
        info: &SpriteInfo,
        handle: &dyn ResourceHandle,
        image: &DecodedImage,
        placement: &Placement,
    ) -> Result<Self::Sprite, BakeError>;
}

/// Consume the session record for `info` and bake it.
///
/// A missing record means the loader never registered this id; it is reported as
/// [`AtlasError::MissingRegistryEntry`]. Either way the record's resource is released exactly
/// once before this returns, including when the baker fails or panics.
#[tracing::instrument(skip(session, baker, info), fields(sprite = %info.id))]
pub fn materialize<B: SpriteBaker + ?Sized>(
    session: &BuildSession,
    baker: &B,
    info: &SpriteInfo,
    placement: &Placement,
) -> AtlasResult<B::Sprite> {
    let Some(record) = session.take(&info.id) else {
        tracing::error!(sprite = %info.id, "sprite was not loaded in the early stage");
        return Err(AtlasError::MissingRegistryEntry(info.id.clone()));
    };

    let SpriteRecord { handle, image, .. } = record;
    let baked = baker.bake(info, handle.handle(), &image, placement);
    handle.release();

    baked.inspect_err(|e| tracing::error!(sprite = %info.id, "error baking sprite: {e}"))
}

/// [`materialize`], substituting `placeholder()` when no sprite could be produced.
pub fn materialize_or_placeholder<B, F>(
    session: &BuildSession,
    baker: &B,
    info: &SpriteInfo,
    placement: &Placement,
    placeholder: F,
) -> B::Sprite
where
    B: SpriteBaker + ?Sized,
    F: FnOnce() -> B::Sprite,
{
    materialize(session, baker, info, placement).unwrap_or_else(|_| placeholder())
}

#[cfg(test)]
#[path = "../../tests/unit/atlas/materialize.rs"]
mod tests;
