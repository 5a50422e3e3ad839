//! Shortform Common Utilities
//!
//! Shared infrastructure for all Shortform crates:
//! - Error types and result aliases
//! - Configuration loading, including the caption style record
//! - Colour values in the renderer's subtitle notation
//! - Tracing/logging initialization

pub mod color;
pub mod config;
pub mod error;
pub mod logging;

pub use color::*;
pub use config::*;
pub use error::*;
