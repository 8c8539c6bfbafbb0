//! Verification failure taxonomy.
//!
//! Every assertion failure carries the cycle (counted from reset release)
//! and the offending signal, so a report pinpoints exactly where the circuit
//! diverged from its model.

use std::fmt;

use vigil_common::{Logic, SimTime};
use vigil_sim::SimError;

/// Position of a sampled bit within a UART frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UartBit {
    /// The start bit.
    Start,
    /// Data bit `i`, 0 = LSB.
    Data(u8),
    /// The `j`-th stop-bit sample.
    Stop(u32),
}

impl fmt::Display for UartBit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UartBit::Start => write!(f, "start bit"),
            UartBit::Data(i) => write!(f, "data bit {i}"),
            UartBit::Stop(j) => write!(f, "stop sample {j}"),
        }
    }
}

/// Errors that abort a scenario.
#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    /// The clock or reset could not be established.
    #[error("setup failed: {0}")]
    Setup(String),

    /// A driven signal had the wrong level.
    #[error("cycle {cycle}: {signal} expected {expected}, observed {observed}")]
    Mismatch {
        /// Cycle since reset release.
        cycle: u64,
        /// The signal.
        signal: String,
        /// The model's value.
        expected: Logic,
        /// The circuit's value.
        observed: Logic,
    },

    /// A signal that must be driven read as `X` or `Z`.
    #[error("cycle {cycle}: {signal} is not driven (observed {observed})")]
    Undriven {
        /// Cycle since reset release.
        cycle: u64,
        /// The signal.
        signal: String,
        /// The undriven value.
        observed: Logic,
    },

    /// An awaited edge did not occur within the per-event bound.
    #[error("cycle {cycle}: no {waiting_for} within {bound}")]
    Timeout {
        /// Cycle at which the bound expired.
        cycle: u64,
        /// Description of the awaited trigger.
        waiting_for: String,
        /// The per-event bound.
        bound: SimTime,
    },

    /// The scenario ran past its maximum duration.
    #[error("cycle {cycle}: scenario exceeded {limit} while waiting for {waiting_for}")]
    ScenarioDeadline {
        /// Cycle at which the deadline expired.
        cycle: u64,
        /// Description of the awaited trigger.
        waiting_for: String,
        /// The scenario bound.
        limit: SimTime,
    },

    /// A UART frame bit differed from the expected byte.
    #[error("cycle {cycle}: {signal} {bit} of byte 0x{byte:02X} expected {expected}, observed {observed}")]
    UartBit {
        /// Cycle of the sample.
        cycle: u64,
        /// The serial line.
        signal: String,
        /// The byte being decoded.
        byte: u8,
        /// Which bit of the frame.
        bit: UartBit,
        /// Expected level.
        expected: Logic,
        /// Sampled level.
        observed: Logic,
    },

    /// A shift-register output bit differed from the expected sequence.
    #[error("cycle {cycle}: {signal} transaction {index} expected {expected}, observed {observed}")]
    Serial {
        /// Cycle of the sample.
        cycle: u64,
        /// The data-out line.
        signal: String,
        /// Zero-based transaction index.
        index: usize,
        /// Expected level.
        expected: Logic,
        /// Sampled level.
        observed: Logic,
    },

    /// An aggregate colour count differed from its declared value.
    #[error("cycle {cycle}: counted {counted} {class} pixels, expected {expected}")]
    CountMismatch {
        /// Cycle at which the counted region ended.
        cycle: u64,
        /// The colour class.
        class: String,
        /// Declared count.
        expected: u64,
        /// Observed count.
        counted: u64,
    },

    /// The simulation backend failed.
    #[error(transparent)]
    Sim(#[from] SimError),
}

impl VerifyError {
    /// The cycle the failure was detected at, if it is cycle-specific.
    pub fn cycle(&self) -> Option<u64> {
        match self {
            VerifyError::Mismatch { cycle, .. }
            | VerifyError::Undriven { cycle, .. }
            | VerifyError::Timeout { cycle, .. }
            | VerifyError::ScenarioDeadline { cycle, .. }
            | VerifyError::UartBit { cycle, .. }
            | VerifyError::Serial { cycle, .. }
            | VerifyError::CountMismatch { cycle, .. } => Some(*cycle),
            VerifyError::Setup(_) | VerifyError::Sim(_) => None,
        }
    }

    /// Short category name used in reports.
    pub fn kind(&self) -> &'static str {
        match self {
            VerifyError::Setup(_) => "setup",
            VerifyError::Mismatch { .. }
            | VerifyError::UartBit { .. }
            | VerifyError::Serial { .. }
            | VerifyError::CountMismatch { .. } => "mismatch",
            VerifyError::Undriven { .. } => "undriven",
            VerifyError::Timeout { .. } | VerifyError::ScenarioDeadline { .. } => "timeout",
            VerifyError::Sim(_) => "simulator",
        }
    }
}
