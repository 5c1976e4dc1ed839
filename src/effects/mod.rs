//! Visual effects and layer transitions.
//!
//! Effects and transitions are carried through the project as unparsed specs and lowered to
//! filter-graph expressions only at render time.

pub(crate) mod fx;
pub(crate) mod transitions;
