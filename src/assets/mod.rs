//! Visual asset resolution and the content-addressable cache used by generators.

pub(crate) mod cache;
pub(crate) mod resolver;
