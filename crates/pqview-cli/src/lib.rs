//! Library side of the `pqview` command-line tool.

pub mod logging;
pub mod ops;
pub mod render;
