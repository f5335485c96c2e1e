//! Configuration module for b3stream
//!
//! Provides the CLI arguments and the validated runtime configuration.

mod settings;

pub use settings::*;
