//! Deterministic timeline scheduling.

pub(crate) mod scheduler;
