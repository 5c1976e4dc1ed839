//! Narration providers and batch generation.
//!
//! Providers are constructed explicitly through a registry; the scheduler only ever sees the
//! resulting durations.

pub(crate) mod generate;
pub(crate) mod provider;
