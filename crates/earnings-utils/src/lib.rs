//! Shared utilities for the earnings workspace
//!
//! Logging setup and application-level configuration used by the binaries.

pub mod config;
pub mod logging;

pub use config::Config;
pub use logging::{init_tracing, init_tracing_from};
