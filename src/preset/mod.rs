//! Named presets bundling effects, transitions, subtitle style and output defaults.

pub(crate) mod catalog;
