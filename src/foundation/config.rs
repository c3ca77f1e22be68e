use std::{fs::File, io::BufReader, path::Path};

use serde::{Deserialize, Serialize};

use crate::foundation::{
    core::{DEFAULT_NAMESPACE, ResourceId},
    error::{AtlasError, AtlasResult},
};

/// Id of the engine's built-in placeholder sprite. It is never loaded from disk.
pub fn default_placeholder() -> ResourceId {
    ResourceId::new_unchecked(DEFAULT_NAMESPACE, "missing")
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
/// Worker pool and placeholder settings for the sprite loader.
pub struct LoaderOpts {
    /// Fan out per-id work onto the worker pool. When false every id is loaded on the calling
    /// thread, with the same failure policy.
    pub parallel: bool,
    /// Worker pool size. `None` uses rayon's default (one worker per core).
    pub threads: Option<usize>,
    /// Placeholder id skipped by every load batch.
    pub placeholder: ResourceId,
}

impl Default for LoaderOpts {
    fn default() -> Self {
        Self {
            parallel: true,
            threads: None,
            placeholder: default_placeholder(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
/// Settings for the standard sprite baker.
pub struct SpriteOpts {
    /// Number of mip levels generated per sprite, including the full-size level.
    pub mip_levels: u32,
}

impl Default for SpriteOpts {
    fn default() -> Self {
        Self { mip_levels: 4 }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
/// Top-level build configuration, usually read from a JSON file.
pub struct BuildConfig {
    /// Loader settings.
    pub loader: LoaderOpts,
    /// Standard sprite baker settings.
    pub sprites: SpriteOpts,
}

impl BuildConfig {
    /// Parse and validate a configuration from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> AtlasResult<Self> {
        let cfg: Self = serde_json::from_reader(r)
            .map_err(|e| AtlasError::validation(format!("parse build config JSON: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Parse and validate a configuration from a JSON string.
    pub fn from_json_str(s: &str) -> AtlasResult<Self> {
        Self::from_reader(s.as_bytes())
    }

    /// Parse and validate a configuration from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> AtlasResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            AtlasError::validation(format!("open build config '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> AtlasResult<()> {
        if self.loader.threads == Some(0) {
            return Err(AtlasError::validation(
                "loader 'threads' must be >= 1 when set",
            ));
        }
        if self.sprites.mip_levels == 0 {
            return Err(AtlasError::validation(
                "sprites 'mip_levels' must be >= 1",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/config.rs"]
mod tests;
