use std::{
    any::Any,
    collections::HashSet,
    panic::{self, AssertUnwindSafe},
    sync::Arc,
};

use rayon::prelude::*;

use crate::{
    atlas::session::{BuildSession, HandleGuard, SpriteInfo, SpriteRecord},
    foundation::{
        config::LoaderOpts,
        core::ResourceId,
        error::{AtlasError, AtlasResult},
    },
    resources::{
        animation::{AnimationInfo, AnimationMetadataReader, McmetaReader},
        decode::{ImageDecoder, RasterDecoder},
        resolver::ResourceResolver,
    },
};

/// Loads and decodes a batch of sprites ahead of atlas stitching.
///
/// Each id is fetched independently on a bounded worker pool and the call returns only after every
/// id has finished. Failures, panics included, are logged per id and the id is left out of the
/// result; a batch never fails as a whole.
pub struct SpriteLoader {
    resolver: Arc<dyn ResourceResolver>,
    decoder: Arc<dyn ImageDecoder>,
    metadata: Arc<dyn AnimationMetadataReader>,
    opts: LoaderOpts,
    pool: Option<rayon::ThreadPool>,
}

impl SpriteLoader {
    /// Build a loader over `resolver` with the default decoder and metadata reader.
    ///
    /// The worker pool is created here when `opts.parallel` is set.
    pub fn new(resolver: Arc<dyn ResourceResolver>, opts: LoaderOpts) -> AtlasResult<Self> {
        let pool = if opts.parallel {
            Some(build_thread_pool(opts.threads)?)
        } else {
            None
        };
        Ok(Self {
            resolver,
            decoder: Arc::new(RasterDecoder),
            metadata: Arc::new(McmetaReader),
            opts,
            pool,
        })
    }

    /// Replace the image decoder.
    pub fn with_decoder(mut self, decoder: Arc<dyn ImageDecoder>) -> Self {
        self.decoder = decoder;
        self
    }

    /// Replace the animation metadata reader.
    pub fn with_metadata_reader(mut self, metadata: Arc<dyn AnimationMetadataReader>) -> Self {
        self.metadata = metadata;
        self
    }

    /// Loader settings.
    pub fn opts(&self) -> &LoaderOpts {
        &self.opts
    }

    /// Load every id in `ids` except the placeholder, registering successes in `session`.
    ///
    /// Returns one descriptor per registered sprite, in no particular order.
    #[tracing::instrument(skip_all, fields(requested = ids.len()))]
    pub fn load(&self, session: &BuildSession, ids: &HashSet<ResourceId>) -> Vec<SpriteInfo> {
        let work: Vec<&ResourceId> = ids
            .iter()
            .filter(|id| **id != self.opts.placeholder)
            .collect();

        let load_into_session = |id: &ResourceId| -> Option<SpriteInfo> {
            match panic::catch_unwind(AssertUnwindSafe(|| self.load_one(id))) {
                Ok(Ok(record)) => {
                    let info = record.info.clone();
                    session.insert(record);
                    Some(info)
                }
                Ok(Err(e)) if e.is_metadata() => {
                    tracing::error!(sprite = %id, "unable to parse metadata: {e}");
                    None
                }
                Ok(Err(e)) => {
                    tracing::error!(sprite = %id, "using placeholder, unable to load: {e}");
                    None
                }
                Err(payload) => {
                    tracing::error!(
                        sprite = %id,
                        "using placeholder, loading panicked: {}",
                        panic_message(payload.as_ref())
                    );
                    None
                }
            }
        };

        let loaded: Vec<SpriteInfo> = match &self.pool {
            Some(pool) => pool.install(|| {
                work.par_iter()
                    .filter_map(|id| load_into_session(*id))
                    .collect()
            }),
            None => work.iter().filter_map(|id| load_into_session(*id)).collect(),
        };

        tracing::debug!(
            attempted = work.len(),
            loaded = loaded.len(),
            failed = work.len() - loaded.len(),
            "sprite batch finished"
        );
        loaded
    }

    /// Resolve, open, decode and size a single sprite.
    ///
    /// The opened handle is closed again if any later step fails.
    pub fn load_one(&self, id: &ResourceId) -> AtlasResult<SpriteRecord> {
        let location = self.resolver.resolve(id);
        let mut handle = HandleGuard::new(self.resolver.open(id, &location)?);
        let bytes = handle.handle_mut().read_all()?;
        let image = self.decoder.decode(id, &bytes)?;
        let animation = self
            .metadata
            .read(id, handle.handle_mut())?
            .unwrap_or_else(AnimationInfo::empty);
        let (width, height) = animation.frame_size(id, image.width, image.height)?;

        Ok(SpriteRecord {
            info: SpriteInfo {
                id: id.clone(),
                width,
                height,
                animation,
            },
            handle,
            image,
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

fn build_thread_pool(threads: Option<usize>) -> AtlasResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(AtlasError::validation(
            "loader 'threads' must be >= 1 when set",
        ));
    }

    let mut builder = rayon::ThreadPoolBuilder::new().thread_name(|i| format!("sprite-load-{i}"));
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| AtlasError::validation(format!("failed to build rayon thread pool: {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/atlas/loader.rs"]
mod tests;
