pub(crate) mod animation;
pub(crate) mod decode;
pub(crate) mod resolver;
