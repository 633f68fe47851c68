//! Webprep Common Utilities
//!
//! Shared infrastructure for all webprep crates:
//! - Error types and result aliases
//! - Byte-size accounting for batch summaries
//! - Tracing/logging initialization
//! - Configuration loading

pub mod config;
pub mod error;
pub mod logging;
pub mod size;

pub use config::*;
pub use error::*;
pub use size::*;
