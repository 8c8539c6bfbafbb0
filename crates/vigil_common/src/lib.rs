//! Shared foundational types used across the vigil verification workspace.
//!
//! This crate provides 4-state signal values, femtosecond simulation time
//! with duration parsing, and clock frequencies.

#![warn(missing_docs)]

pub mod frequency;
pub mod logic;
pub mod time;

pub use frequency::{Frequency, ParseFrequencyError};
pub use logic::Logic;
pub use time::{ParseTimeError, SimTime};
