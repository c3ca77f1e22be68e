use crate::foundation::core::ResourceId;

/// Convenience result type used across atlasbake.
pub type AtlasResult<T> = Result<T, AtlasError>;

/// Error reported by engine-provided bake functions.
///
/// Bake failures are always constructed through [`AtlasError::bake`] so they carry the offending
/// id.
pub type BakeError = AtlasError;

/// Top-level error taxonomy used by loader, materializer and cache APIs.
#[derive(thiserror::Error, Debug)]
pub enum AtlasError {
    /// The resolver found no resource at the location derived from `id`.
    #[error("resource not found: {id} ({location})")]
    ResourceNotFound {
        /// Sprite or model id that was being resolved.
        id: ResourceId,
        /// Concrete location that was probed.
        location: String,
    },

    /// An I/O failure other than "not found" while opening or reading a resource.
    #[error("io error at '{location}': {source}")]
    Io {
        /// Concrete location being accessed.
        location: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Resource bytes could not be decoded into a raster image.
    #[error("decode error for {id}: {message}")]
    Decode {
        /// Offending id.
        id: ResourceId,
        /// Decoder message.
        message: String,
    },

    /// Animation metadata was present but malformed or inconsistent with the raster.
    #[error("metadata parse error for {id}: {message}")]
    MetadataParse {
        /// Offending id.
        id: ResourceId,
        /// Parser message.
        message: String,
    },

    /// Engine-side bake failure.
    #[error("bake error for {id}: {message}")]
    Bake {
        /// Offending id.
        id: ResourceId,
        /// Engine message.
        message: String,
    },

    /// Materialization was requested for an id the loader never registered this session.
    #[error("sprite {0} was not loaded in the early stage")]
    MissingRegistryEntry(ResourceId),

    /// Invalid user-provided data (configuration, ids).
    #[error("validation error: {0}")]
    Validation(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AtlasError {
    /// Build a [`AtlasError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`AtlasError::Decode`] value.
    pub fn decode(id: &ResourceId, msg: impl Into<String>) -> Self {
        Self::Decode {
            id: id.clone(),
            message: msg.into(),
        }
    }

    /// Build a [`AtlasError::MetadataParse`] value.
    pub fn metadata(id: &ResourceId, msg: impl Into<String>) -> Self {
        Self::MetadataParse {
            id: id.clone(),
            message: msg.into(),
        }
    }

    /// Build a [`AtlasError::Bake`] value.
    pub fn bake(id: &ResourceId, msg: impl Into<String>) -> Self {
        Self::Bake {
            id: id.clone(),
            message: msg.into(),
        }
    }

    /// True for failures that come from metadata rather than from the resource bytes.
    pub fn is_metadata(&self) -> bool {
        matches!(self, Self::MetadataParse { .. })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
