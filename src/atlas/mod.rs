pub(crate) mod loader;
pub(crate) mod materialize;
pub(crate) mod session;
pub(crate) mod sprite;
