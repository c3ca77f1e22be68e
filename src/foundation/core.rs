use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::foundation::error::{AtlasError, AtlasResult};

/// Namespace applied to ids written without an explicit `namespace:` prefix.
pub const DEFAULT_NAMESPACE: &str = "builtin";

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
/// Namespaced identifier of a sprite or model, written `namespace:path`.
pub struct ResourceId {
    namespace: String,
    path: String,
}

impl ResourceId {
    /// Build an id from already separated parts, validating both.
    pub fn new(namespace: impl Into<String>, path: impl Into<String>) -> AtlasResult<Self> {
        let namespace = namespace.into();
        let path = path.into();
        validate_part(&namespace, "namespace", false)?;
        validate_part(&path, "path", true)?;
        Ok(Self { namespace, path })
    }

    pub(crate) fn new_unchecked(namespace: &str, path: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            path: path.to_string(),
        }
    }

    /// Parse `namespace:path`; a bare `path` uses [`DEFAULT_NAMESPACE`].
    pub fn parse(s: &str) -> AtlasResult<Self> {
        match s.split_once(':') {
            Some((ns, path)) => Self::new(ns, path),
            None => Self::new(DEFAULT_NAMESPACE, s),
        }
    }

    /// Namespace part.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Path part, `/`-separated.
    pub fn path(&self) -> &str {
        &self.path
    }
}

fn validate_part(part: &str, what: &str, allow_slash: bool) -> AtlasResult<()> {
    if part.is_empty() {
        return Err(AtlasError::validation(format!(
            "resource id {what} must be non-empty"
        )));
    }
    let bad = part.chars().find(|&c| {
        !(c.is_ascii_lowercase()
            || c.is_ascii_digit()
            || matches!(c, '_' | '-' | '.')
            || (allow_slash && c == '/'))
    });
    if let Some(c) = bad {
        return Err(AtlasError::validation(format!(
            "invalid character '{c}' in resource id {what} '{part}'"
        )));
    }
    // ids map onto directory trees; every segment must name a real child
    if part.split('/').any(|seg| matches!(seg, "" | "." | "..")) {
        return Err(AtlasError::validation(format!(
            "empty or relative segment in resource id {what} '{part}'"
        )));
    }
    Ok(())
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.path)
    }
}

impl FromStr for ResourceId {
    type Err = AtlasError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ResourceId {
    type Error = AtlasError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ResourceId> for String {
    fn from(value: ResourceId) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
