pub(crate) mod provider;
pub(crate) mod transform;
