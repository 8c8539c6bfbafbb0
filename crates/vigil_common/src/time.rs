//! Simulation time with femtosecond precision.
//!
//! [`SimTime`] is the single time representation shared by the configuration
//! layer (clock periods, settle delays, timeouts) and the simulation kernel.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;

/// Femtoseconds per picosecond.
pub const FS_PER_PS: u64 = 1_000;
/// Femtoseconds per nanosecond.
pub const FS_PER_NS: u64 = 1_000_000;
/// Femtoseconds per microsecond.
pub const FS_PER_US: u64 = 1_000_000_000;
/// Femtoseconds per millisecond.
pub const FS_PER_MS: u64 = 1_000_000_000_000;
/// Femtoseconds per second.
pub const FS_PER_S: u64 = FS_PER_MS * 1_000;

/// A point in (or span of) simulation time, in femtoseconds.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct SimTime {
    /// Simulation time in femtoseconds.
    pub fs: u64,
}

impl SimTime {
    /// Time zero.
    pub fn zero() -> Self {
        Self { fs: 0 }
    }

    /// Creates a time from a femtosecond value.
    pub fn from_fs(fs: u64) -> Self {
        Self { fs }
    }

    /// Creates a time from a picosecond value.
    pub fn from_ps(ps: u64) -> Self {
        Self { fs: ps * FS_PER_PS }
    }

    /// Creates a time from a nanosecond value.
    pub fn from_ns(ns: u64) -> Self {
        Self { fs: ns * FS_PER_NS }
    }

    /// Creates a time from a microsecond value.
    pub fn from_us(us: u64) -> Self {
        Self { fs: us * FS_PER_US }
    }

    /// Converts to nanoseconds (truncated).
    pub fn to_ns(&self) -> u64 {
        self.fs / FS_PER_NS
    }

    /// Returns `self * n`, saturating at the maximum representable time.
    pub fn times(self, n: u64) -> Self {
        Self {
            fs: self.fs.saturating_mul(n),
        }
    }

    /// Adds two times, saturating instead of overflowing.
    pub fn saturating_add(self, rhs: SimTime) -> Self {
        Self {
            fs: self.fs.saturating_add(rhs.fs),
        }
    }

    /// Subtracts `rhs`, clamping at zero.
    pub fn saturating_sub(self, rhs: SimTime) -> Self {
        Self {
            fs: self.fs.saturating_sub(rhs.fs),
        }
    }
}

impl Add for SimTime {
    type Output = SimTime;

    fn add(self, rhs: SimTime) -> SimTime {
        SimTime {
            fs: self.fs + rhs.fs,
        }
    }
}

impl Sub for SimTime {
    type Output = SimTime;

    fn sub(self, rhs: SimTime) -> SimTime {
        SimTime {
            fs: self.fs - rhs.fs,
        }
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fs = self.fs;
        if fs == 0 {
            write!(f, "0 fs")
        } else if fs >= FS_PER_MS && fs.is_multiple_of(FS_PER_MS) {
            write!(f, "{} ms", fs / FS_PER_MS)
        } else if fs >= FS_PER_US && fs.is_multiple_of(FS_PER_US) {
            write!(f, "{} us", fs / FS_PER_US)
        } else if fs >= FS_PER_NS && fs.is_multiple_of(FS_PER_NS) {
            write!(f, "{} ns", fs / FS_PER_NS)
        } else if fs >= FS_PER_PS && fs.is_multiple_of(FS_PER_PS) {
            write!(f, "{} ps", fs / FS_PER_PS)
        } else {
            write!(f, "{fs} fs")
        }
    }
}

/// Error returned when a duration string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid duration '{input}': {reason}")]
pub struct ParseTimeError {
    /// The offending input.
    pub input: String,
    /// What was wrong with it.
    pub reason: &'static str,
}

/// Parses strings like `"40ns"`, `"10 us"`, `"2ms"`.
///
/// A unit is mandatory: bare numbers are ambiguous between femtoseconds and
/// clock cycles and are rejected.
impl FromStr for SimTime {
    type Err = ParseTimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let err = |reason| ParseTimeError {
            input: s.to_string(),
            reason,
        };
        if s.is_empty() {
            return Err(err("empty duration string"));
        }

        let digit_end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
        if digit_end == 0 {
            return Err(err("no numeric value"));
        }
        let number: u64 = s[..digit_end]
            .parse()
            .map_err(|_| err("number out of range"))?;

        let multiplier = match s[digit_end..].trim() {
            "fs" => 1,
            "ps" => FS_PER_PS,
            "ns" => FS_PER_NS,
            "us" => FS_PER_US,
            "ms" => FS_PER_MS,
            "s" => FS_PER_S,
            "" => return Err(err("missing unit (use fs, ps, ns, us, ms, or s)")),
            _ => return Err(err("unknown unit (use fs, ps, ns, us, ms, or s)")),
        };

        number
            .checked_mul(multiplier)
            .map(SimTime::from_fs)
            .ok_or_else(|| err("number out of range"))
    }
}
