//! Shared helpers for threadline.
//!
//! - Prefixed, sortable identifiers
//! - Logging setup
//! - Timing guards for expensive passes

pub mod id;
pub mod log;
pub mod timing;

pub use id::{IdPrefix, Identifier};
pub use log::{LogConfig, LogLevel};
pub use timing::TimingGuard;
