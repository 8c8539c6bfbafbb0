//! Clock frequencies with unit parsing and period conversion.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::time::{SimTime, FS_PER_S};

/// A frequency value stored in Hertz.
///
/// Parses strings like "25MHz", "100KHz", "1GHz", "48000Hz", and bare
/// numeric values (interpreted as Hz).
#[derive(Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Frequency(f64);

impl Frequency {
    /// Creates a new frequency from a value in Hertz.
    pub fn new(hz: f64) -> Self {
        Self(hz)
    }

    /// Returns the frequency in Hertz.
    pub fn hz(&self) -> f64 {
        self.0
    }

    /// Returns the frequency in megahertz.
    pub fn mhz(&self) -> f64 {
        self.0 / 1_000_000.0
    }

    /// Returns the clock period rounded to the nearest femtosecond.
    ///
    /// Returns `None` for non-positive or non-finite frequencies, and for
    /// frequencies so high that the period rounds to zero.
    pub fn period(&self) -> Option<SimTime> {
        if !self.0.is_finite() || self.0 <= 0.0 {
            return None;
        }
        let fs = (FS_PER_S as f64 / self.0).round();
        if fs < 1.0 || fs > u64::MAX as f64 {
            return None;
        }
        Some(SimTime::from_fs(fs as u64))
    }
}

impl fmt::Debug for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Frequency({self})")
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hz = self.0;
        if hz >= 1_000_000_000.0 {
            write!(f, "{}GHz", hz / 1_000_000_000.0)
        } else if hz >= 1_000_000.0 {
            write!(f, "{}MHz", hz / 1_000_000.0)
        } else if hz >= 1_000.0 {
            write!(f, "{}KHz", hz / 1_000.0)
        } else {
            write!(f, "{hz}Hz")
        }
    }
}

/// Error type for parsing frequency strings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid frequency: '{input}'")]
pub struct ParseFrequencyError {
    /// The input string that failed to parse.
    pub input: String,
}

impl FromStr for Frequency {
    type Err = ParseFrequencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let err = || ParseFrequencyError {
            input: s.to_string(),
        };

        let lower = s.to_ascii_lowercase();
        let (digits, scale) = if let Some(num) = lower.strip_suffix("ghz") {
            (num, 1_000_000_000.0)
        } else if let Some(num) = lower.strip_suffix("mhz") {
            (num, 1_000_000.0)
        } else if let Some(num) = lower.strip_suffix("khz") {
            (num, 1_000.0)
        } else if let Some(num) = lower.strip_suffix("hz") {
            (num, 1.0)
        } else {
            (lower.as_str(), 1.0)
        };

        let val: f64 = digits.trim().parse().map_err(|_| err())?;
        Ok(Frequency(val * scale))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_suffixes() {
        assert_eq!("1GHz".parse::<Frequency>().unwrap().hz(), 1_000_000_000.0);
        assert_eq!("25MHz".parse::<Frequency>().unwrap().hz(), 25_000_000.0);
        assert_eq!("100KHz".parse::<Frequency>().unwrap().hz(), 100_000.0);
        assert_eq!("48000Hz".parse::<Frequency>().unwrap().hz(), 48_000.0);
        assert_eq!("25000000".parse::<Frequency>().unwrap().mhz(), 25.0);
        assert_eq!("50mhz".parse::<Frequency>().unwrap().mhz(), 50.0);
    }

    #[test]
    fn parse_invalid() {
        assert!("not_a_freq".parse::<Frequency>().is_err());
        assert!("MHz".parse::<Frequency>().is_err());
    }

    #[test]
    fn period_of_reference_clock() {
        let f: Frequency = "25MHz".parse().unwrap();
        assert_eq!(f.period(), Some(SimTime::from_ns(40)));
    }

    #[test]
    fn period_rejects_degenerate_values() {
        assert_eq!(Frequency::new(0.0).period(), None);
        assert_eq!(Frequency::new(-5.0).period(), None);
        assert_eq!(Frequency::new(f64::NAN).period(), None);
        assert_eq!(Frequency::new(1e18).period(), None);
    }

    #[test]
    fn display_selects_best_unit() {
        assert_eq!(format!("{}", Frequency::new(1_000_000_000.0)), "1GHz");
        assert_eq!(format!("{}", Frequency::new(25_000_000.0)), "25MHz");
        assert_eq!(format!("{}", Frequency::new(44_100.0)), "44.1KHz");
        assert_eq!(format!("{}", Frequency::new(500.0)), "500Hz");
    }
}
