//! Cross-cutting utilities: filesystem primitives ([`fs`]) and name/path
//! normalization ([`path`]), split out the way the teacher project keeps
//! its own `utils::fs` separate from path-string logic.

pub mod fs;
pub mod path;
