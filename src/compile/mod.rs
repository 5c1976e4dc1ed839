//! Script compilation: layer assembly and the compile front door.

pub(crate) mod assembler;
pub(crate) mod compiler;
