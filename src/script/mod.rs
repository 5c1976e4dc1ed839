//! Authoring-time script model and its builder DSL.

pub(crate) mod dsl;
pub(crate) mod model;
