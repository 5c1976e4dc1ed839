//! Staged render pipeline: filter-graph construction, subtitles and ffmpeg encoding.

pub(crate) mod context;
pub(crate) mod encode;
pub(crate) mod graph;
pub(crate) mod pipeline;
pub(crate) mod stages;
pub(crate) mod subtitles;
