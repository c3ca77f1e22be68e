use std::hash::{Hash, Hasher};

use kurbo::Affine;

use crate::foundation::{
    core::ResourceId,
    error::{AtlasError, AtlasResult},
};

#[derive(Clone, Copy, Debug)]
/// Affine orientation applied to a model before baking.
///
/// Equality and hashing compare the exact coefficients, with `-0.0` folded into `0.0`.
pub struct Transformation(Affine);

impl Transformation {
    /// The identity transform.
    pub const IDENTITY: Self = Self(Affine::IDENTITY);

    /// Wrap an affine transform.
    pub fn new(affine: Affine) -> Self {
        Self(affine)
    }

    /// Underlying affine transform.
    pub fn affine(self) -> Affine {
        self.0
    }

    fn coeff_bits(self) -> [u64; 6] {
        self.0.as_coeffs().map(|c| (c + 0.0).to_bits())
    }
}

impl PartialEq for Transformation {
    fn eq(&self, other: &Self) -> bool {
        self.coeff_bits() == other.coeff_bits()
    }
}

impl Eq for Transformation {}

impl Hash for Transformation {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.coeff_bits().hash(state);
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
/// Quarter-turn model orientation plus its UV-lock flag.
pub struct ModelRotation {
    quarter_turns: u8,
    uv_locked: bool,
}

impl ModelRotation {
    /// Unrotated, not UV-locked: the canonical orientation served by id-only lookups.
    pub const IDENTITY: Self = Self {
        quarter_turns: 0,
        uv_locked: false,
    };

    /// Rotation by `degrees` (a multiple of 90).
    pub fn new(degrees: u32, uv_locked: bool) -> AtlasResult<Self> {
        if degrees % 90 != 0 {
            return Err(AtlasError::validation(format!(
                "model rotation must be a multiple of 90 degrees, got {degrees}"
            )));
        }
        Ok(Self {
            quarter_turns: ((degrees / 90) % 4) as u8,
            uv_locked,
        })
    }

    /// Rotation angle in degrees, in `0..360`.
    pub fn degrees(self) -> u32 {
        u32::from(self.quarter_turns) * 90
    }

    /// Whether textures stay aligned to the world instead of rotating with the model.
    pub fn is_uv_locked(self) -> bool {
        self.uv_locked
    }

    /// Exact rotation matrix for this orientation.
    pub fn rotation(self) -> Transformation {
        let coeffs = match self.quarter_turns {
            0 => return Transformation::IDENTITY,
            1 => [0.0, 1.0, -1.0, 0.0, 0.0, 0.0],
            2 => [-1.0, 0.0, 0.0, -1.0, 0.0, 0.0],
            _ => [0.0, -1.0, 1.0, 0.0, 0.0, 0.0],
        };
        Transformation::new(Affine::new(coeffs))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
/// Compute-cache slot: one id under one transform and UV-lock setting.
pub struct TransformKey {
    /// Model id.
    pub id: ResourceId,
    /// Applied transform.
    pub transform: Transformation,
    /// UV-lock flag.
    pub uv_locked: bool,
}

impl TransformKey {
    /// Key for `id` under `rotation`.
    pub fn new(id: ResourceId, rotation: ModelRotation) -> Self {
        Self {
            id,
            transform: rotation.rotation(),
            uv_locked: rotation.is_uv_locked(),
        }
    }

    /// Key for `id` under [`ModelRotation::IDENTITY`].
    pub fn canonical(id: ResourceId) -> Self {
        Self::new(id, ModelRotation::IDENTITY)
    }

    /// True when this key uses the canonical transform and UV-lock pair.
    pub fn is_canonical(&self) -> bool {
        let canonical = ModelRotation::IDENTITY;
        self.transform == canonical.rotation() && self.uv_locked == canonical.is_uv_locked()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/bake/transform.rs"]
mod tests;
