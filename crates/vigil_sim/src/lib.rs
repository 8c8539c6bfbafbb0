//! Simulation side of the vigil verification workspace.
//!
//! The checkers in `vigil_verify` never talk to a simulator directly; they
//! go through the [`SignalAccess`] trait defined here. This crate also ships
//! an implementation of that trait, [`SimKernel`], which clocks a behavioral
//! [`Device`] and can dump every signal change to a VCD file.
//!
//! # Modules
//!
//! - `access`: the `SignalAccess` boundary, `Trigger` and `WaitOutcome`
//! - `device`: the `Device` trait and its port view
//! - `kernel`: clock event queue and device evaluation
//! - `waveform`: waveform recording (VCD format)
//! - `reference`: behavioral model of the reference circuit, with faults

#![warn(missing_docs)]

pub mod access;
pub mod device;
pub mod error;
pub mod kernel;
pub mod reference;
pub mod value;
pub mod waveform;

pub use access::{SignalAccess, Trigger, WaitOutcome};
pub use device::{Device, Pins, PortDecl};
pub use error::SimError;
pub use kernel::SimKernel;
pub use reference::{Fault, ReferenceConfig, ReferenceDesign};
pub use value::{EdgeKind, PortDirection, SimSignalId, SimSignalState};
pub use waveform::{VcdRecorder, WaveformRecorder};
