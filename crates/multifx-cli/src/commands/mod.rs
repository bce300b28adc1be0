//! CLI command implementations.

pub mod common;
pub mod effects;
pub mod patch;
pub mod process;
