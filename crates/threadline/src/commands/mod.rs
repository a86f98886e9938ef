//! CLI command implementations.

pub mod config;
pub mod logging;
pub mod replay;
