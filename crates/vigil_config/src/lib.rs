//! Parsing and validation of `vigil.toml` bench configuration files.
//!
//! This crate reads the bench configuration and produces a strongly-typed
//! [`BenchConfig`]: clock and reset definitions, signal names, VGA geometry
//! and declared pixel content, UART bit timing, and the expected protocol
//! traffic. [`resolve_timing`] turns its textual durations into
//! [`SimTime`](vigil_common::SimTime) values.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod resolve;
pub mod types;

pub use error::ConfigError;
pub use loader::{
    load_config, load_config_file, load_config_from_str, validate_config, CONFIG_FILE_NAME,
    MIN_RESET_CYCLES,
};
pub use resolve::{resolve_timing, ResolvedTiming};
pub use types::*;
