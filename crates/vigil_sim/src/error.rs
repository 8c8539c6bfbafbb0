//! Simulation error types.
//!
//! All errors that can occur while constructing a kernel or driving it
//! through the [`SignalAccess`](crate::SignalAccess) interface are variants
//! of [`SimError`].

use std::io;

/// Errors that can occur during simulation setup or execution.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// No signal with the given name exists.
    #[error("unknown signal '{name}'")]
    UnknownSignal {
        /// The requested name.
        name: String,
    },

    /// The signal is an output of the device and cannot be driven.
    #[error("signal '{name}' is a device output and cannot be driven")]
    NotDrivable {
        /// The signal name.
        name: String,
    },

    /// A device declared the same port twice.
    #[error("device declares port '{name}' more than once")]
    DuplicatePort {
        /// The duplicated port name.
        name: String,
    },

    /// A clock was started on a signal that already has one.
    #[error("clock on '{name}' is already running")]
    ClockAlreadyRunning {
        /// The clock signal.
        name: String,
    },

    /// A clock period that cannot be split into two equal halves.
    #[error("invalid clock period {period_fs} fs for '{name}'")]
    InvalidPeriod {
        /// The clock signal.
        name: String,
        /// The rejected period in femtoseconds.
        period_fs: u64,
    },

    /// A wait without deadline can never complete because nothing is scheduled.
    #[error("simulation stalled at {time_fs} fs: no pending events")]
    Stalled {
        /// Time at which the event queue ran dry.
        time_fs: u64,
    },

    /// An I/O error occurred while writing waveform data.
    #[error("waveform I/O error: {0}")]
    WaveformIo(#[from] io::Error),
}
