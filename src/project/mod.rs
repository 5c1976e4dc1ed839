//! Render-ready project document, its persisted form and compile metadata.

pub(crate) mod document;
pub(crate) mod metadata;
pub(crate) mod model;
