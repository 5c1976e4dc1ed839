//! Concurrent fan-out of one project across several output targets.

pub(crate) mod multi_output;
