//! atlasbake prepares sprites for texture atlas builds and caches baked models.
//!
//! # Pipeline overview
//!
//! 1. **Load**: [`SpriteLoader::load`] fetches and decodes a batch of sprites on a bounded worker
//!    pool and registers them in a [`BuildSession`].
//! 2. **Materialize**: [`materialize`] consumes one session record per sprite and hands it to a
//!    [`SpriteBaker`], releasing the backing resource afterwards.
//! 3. **Finish**: [`BuildSession::finish`] drops whatever was not consumed.
//!
//! Independently, [`BakedModelProvider`] answers id lookups for baked models, in front of a
//! transform-keyed compute cache and an id-keyed override table with negative caching.
//!
//! Failures for a single sprite never fail a batch: they are logged through `tracing` and the
//! caller substitutes its placeholder.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod atlas;
mod bake;
mod foundation;
mod resources;

pub use atlas::loader::SpriteLoader;
pub use atlas::materialize::{Placement, SpriteBaker, materialize, materialize_or_placeholder};
pub use atlas::session::{BuildSession, HandleGuard, SpriteInfo, SpriteRecord};
pub use atlas::sprite::{BakedSprite, StandardSpriteBaker};
pub use bake::provider::{BakedModelProvider, ModelBaker};
pub use bake::transform::{ModelRotation, TransformKey, Transformation};
pub use foundation::config::{BuildConfig, LoaderOpts, SpriteOpts, default_placeholder};
pub use foundation::core::{DEFAULT_NAMESPACE, ResourceId};
pub use foundation::error::{AtlasError, AtlasResult, BakeError};
pub use resources::animation::{
    AnimationFrame, AnimationInfo, AnimationMetadataReader, McmetaReader, parse_metadata,
};
pub use resources::decode::{DecodedImage, ImageDecoder, RasterDecoder, decode_image};
pub use resources::resolver::{
    FsResourceResolver, METADATA_EXTENSION, MemoryResolver, ResourceHandle, ResourceResolver,
};
