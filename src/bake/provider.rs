use std::collections::{BTreeSet, HashMap};

use crate::{
    bake::transform::{ModelRotation, TransformKey},
    foundation::{core::ResourceId, error::BakeError},
};

/// Engine-side model baking used on cache misses.
pub trait ModelBaker {
    /// Baked model handle; cloning should be cheap (typically an `Arc`).
    type Model: Clone;

    /// Bake `id` under `rotation`.
    fn bake(
        &mut self,
        id: &ResourceId,
        rotation: ModelRotation,
    ) -> Result<Self::Model, BakeError>;

    /// True when `model` is the engine's "could not resolve" placeholder.
    fn is_missing(&self, model: &Self::Model) -> bool;
}

/// Id-keyed view over baked models backed by two tables.
///
/// - a compute cache keyed by [`TransformKey`], filled on demand by the [`ModelBaker`];
/// - an override table keyed by id, which wins for canonical lookups. A `None` entry is a
///   tombstone: the id is known to resolve to the missing model and is never baked again.
///
/// Non-canonical transform variants are served by the compute cache only.
pub struct BakedModelProvider<B: ModelBaker> {
    baker: B,
    baked_cache: HashMap<TransformKey, B::Model>,
    overrides: HashMap<ResourceId, Option<B::Model>>,
}

impl<B: ModelBaker> BakedModelProvider<B> {
    /// Provider with an empty compute cache.
    pub fn new(baker: B) -> Self {
        Self::with_cache(baker, HashMap::new())
    }

    /// Provider over an existing compute cache.
    pub fn with_cache(baker: B, baked_cache: HashMap<TransformKey, B::Model>) -> Self {
        Self {
            baker,
            baked_cache,
            overrides: HashMap::new(),
        }
    }

    /// Borrow the baker.
    pub fn baker(&self) -> &B {
        &self.baker
    }

    /// Borrow the baker mutably.
    pub fn baker_mut(&mut self) -> &mut B {
        &mut self.baker
    }

    /// Canonical model for `id`, baking it on a miss.
    ///
    /// Overrides (tombstones included) are returned as-is. A bake that yields the missing model,
    /// or fails, leaves a tombstone so later calls return `None` without baking.
    pub fn get(&mut self, id: &ResourceId) -> Option<B::Model> {
        if let Some(entry) = self.overrides.get(id) {
            return entry.clone();
        }

        let key = TransformKey::canonical(id.clone());
        if let Some(model) = self.baked_cache.get(&key) {
            return Some(model.clone());
        }

        match self.bake_variant(id, ModelRotation::IDENTITY) {
            Some(model) => {
                self.baked_cache.insert(key, model.clone());
                Some(model)
            }
            None => {
                tracing::debug!(model = %id, "caching missing model");
                self.overrides.insert(id.clone(), None);
                None
            }
        }
    }

    /// Model for `id` under `rotation`.
    ///
    /// The canonical rotation goes through [`BakedModelProvider::get`]. Other rotations are
    /// served and filled by the compute cache only; missing results are not cached.
    pub fn get_transformed(
        &mut self,
        id: &ResourceId,
        rotation: ModelRotation,
    ) -> Option<B::Model> {
        let key = TransformKey::new(id.clone(), rotation);
        if key.is_canonical() {
            return self.get(id);
        }
        if let Some(model) = self.baked_cache.get(&key) {
            return Some(model.clone());
        }
        let model = self.bake_variant(id, rotation)?;
        self.baked_cache.insert(key, model.clone());
        Some(model)
    }

    fn bake_variant(&mut self, id: &ResourceId, rotation: ModelRotation) -> Option<B::Model> {
        match self.baker.bake(id, rotation) {
            Ok(model) if self.baker.is_missing(&model) => None,
            Ok(model) => Some(model),
            Err(e) => {
                tracing::error!(
                    model = %id,
                    rotation = rotation.degrees(),
                    "exception baking model: {e}"
                );
                None
            }
        }
    }

    /// Store a permanent override for `id`. The compute cache is left untouched.
    ///
    /// Returns the previous override, or else the canonical compute-cache entry.
    pub fn put(&mut self, id: ResourceId, model: B::Model) -> Option<B::Model> {
        let key = TransformKey::canonical(id.clone());
        match self.overrides.insert(id, Some(model)) {
            Some(Some(prev)) => Some(prev),
            _ => self.baked_cache.get(&key).cloned(),
        }
    }

    /// Store many overrides at once.
    pub fn put_all(&mut self, models: impl IntoIterator<Item = (ResourceId, B::Model)>) {
        self.overrides.extend(models.into_iter().map(|(id, model)| (id, Some(model))));
    }

    /// Drop the override for `id`; when there was no override model, drop the canonical
    /// compute-cache entry instead.
    pub fn remove(&mut self, id: &ResourceId) -> Option<B::Model> {
        if let Some(Some(prev)) = self.overrides.remove(id) {
            return Some(prev);
        }
        self.baked_cache.remove(&TransformKey::canonical(id.clone()))
    }

    /// Rewrite every override, then every canonical compute-cache entry whose id has no override.
    ///
    /// Tombstones are passed as `None`. A compute-cache entry rewritten to `None` is removed.
    /// Non-canonical variants are never touched.
    pub fn replace_all<F>(&mut self, mut f: F)
    where
        F: FnMut(&ResourceId, Option<B::Model>) -> Option<B::Model>,
    {
        for (id, slot) in self.overrides.iter_mut() {
            let old = slot.take();
            *slot = f(id, old);
        }

        let cache = std::mem::take(&mut self.baked_cache);
        self.baked_cache = cache
            .into_iter()
            .filter_map(|(key, model)| {
                if !key.is_canonical() || self.overrides.contains_key(&key.id) {
                    return Some((key, model));
                }
                let replaced = f(&key.id, Some(model))?;
                Some((key, replaced))
            })
            .collect();
    }

    /// True when `id` has an override entry, tombstones included.
    pub fn has_override(&self, id: &ResourceId) -> bool {
        self.overrides.contains_key(id)
    }

    /// True when `id` is negatively cached.
    pub fn is_tombstoned(&self, id: &ResourceId) -> bool {
        matches!(self.overrides.get(id), Some(None))
    }

    /// Compute-cache entry for `key`, without baking.
    pub fn cached(&self, key: &TransformKey) -> Option<&B::Model> {
        self.baked_cache.get(key)
    }

    /// Distinct ids present in the compute cache, sorted.
    pub fn ids(&self) -> Vec<ResourceId> {
        self.baked_cache
            .keys()
            .map(|key| key.id.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Number of compute-cache entries. Overrides are not counted.
    pub fn len(&self) -> usize {
        self.baked_cache.len()
    }

    /// True when the compute cache is empty.
    pub fn is_empty(&self) -> bool {
        self.baked_cache.is_empty()
    }

    /// Clear the compute cache. Overrides survive; rebuild the provider to drop them.
    pub fn clear(&mut self) {
        self.baked_cache.clear();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/bake/provider.rs"]
mod tests;
