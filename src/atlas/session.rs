use std::collections::HashMap;

use parking_lot::Mutex;
use serde::Serialize;

use crate::{
    foundation::core::ResourceId,
    resources::{animation::AnimationInfo, decode::DecodedImage, resolver::ResourceHandle},
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
/// Descriptor produced by the loader for every sprite that loaded successfully.
pub struct SpriteInfo {
    /// Sprite id.
    pub id: ResourceId,
    /// Logical frame width in pixels.
    pub width: u32,
    /// Logical frame height in pixels.
    pub height: u32,
    /// Animation section, [`AnimationInfo::empty`] when absent.
    pub animation: AnimationInfo,
}

/// Owns an open [`ResourceHandle`] and closes it when dropped.
///
/// Close failures are logged and swallowed.
pub struct HandleGuard {
    handle: Box<dyn ResourceHandle>,
}

impl HandleGuard {
    /// Take ownership of `handle`.
    pub fn new(handle: Box<dyn ResourceHandle>) -> Self {
        Self { handle }
    }

    /// Borrow the guarded handle.
    pub fn handle(&self) -> &dyn ResourceHandle {
        self.handle.as_ref()
    }

    /// Borrow the guarded handle mutably.
    pub fn handle_mut(&mut self) -> &mut dyn ResourceHandle {
        self.handle.as_mut()
    }

    /// Close the handle now.
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for HandleGuard {
    fn drop(&mut self) {
        if let Err(e) = self.handle.close() {
            tracing::debug!(location = self.handle.location(), "ignoring close failure: {e}");
        }
    }
}

impl std::fmt::Debug for HandleGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandleGuard")
            .field("location", &self.handle.location())
            .finish()
    }
}

/// A loaded sprite waiting to be materialized: descriptor, open resource and decoded raster.
#[derive(Debug)]
pub struct SpriteRecord {
    /// Descriptor returned to the loader's caller.
    pub info: SpriteInfo,
    /// Backing resource; closed when the record is dropped.
    pub handle: HandleGuard,
    /// Decoded raster.
    pub image: DecodedImage,
}

/// Registry of loaded sprites for one atlas-stitch cycle.
///
/// Created empty by [`BuildSession::begin`], filled concurrently by the loader, drained by the
/// materializer and discarded by [`BuildSession::finish`]. Records never outlive the session.
#[derive(Debug, Default)]
pub struct BuildSession {
    records: Mutex<HashMap<ResourceId, SpriteRecord>>,
}

impl BuildSession {
    /// Start an empty session.
    pub fn begin() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&self, record: SpriteRecord) {
        let id = record.info.id.clone();
        if self.records.lock().insert(id.clone(), record).is_some() {
            tracing::warn!(sprite = %id, "replaced an existing sprite record");
        }
    }

    /// Remove and return the record for `id`.
    pub fn take(&self, id: &ResourceId) -> Option<SpriteRecord> {
        self.records.lock().remove(id)
    }

    /// True when a record for `id` is waiting.
    pub fn contains(&self, id: &ResourceId) -> bool {
        self.records.lock().contains_key(id)
    }

    /// Number of records waiting.
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// True when no records are waiting.
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// Ids of the waiting records, sorted.
    pub fn ids(&self) -> Vec<ResourceId> {
        let mut ids: Vec<_> = self.records.lock().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// End the session, releasing every unconsumed record. Returns how many were released.
    pub fn finish(self) -> usize {
        let records = self.records.into_inner();
        let leftover = records.len();
        if leftover > 0 {
            tracing::debug!(leftover, "releasing unconsumed sprite records");
        }
        drop(records);
        leftover
    }
}

#[cfg(test)]
#[path = "../../tests/unit/atlas/session.rs"]
mod tests;
