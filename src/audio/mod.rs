//! Audio mix planning (narration, music) in timeline sample space.

pub(crate) mod mix;
