//! Four-state signal values as observed on a simulated net.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Not;

/// A single 4-state logic value following the IEEE 1164 standard.
///
/// The four states represent:
/// - `Zero`: logic low (driven 0)
/// - `One`: logic high (driven 1)
/// - `X`: unknown or uninitialized value
/// - `Z`: high-impedance (tri-state, not driven)
///
/// Only `Zero` and `One` count as *driven*; checkers treat the other two as
/// an indeterminate circuit state rather than a wrong value.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum Logic {
    /// Logic low (0).
    Zero = 0,
    /// Logic high (1).
    One = 1,
    /// Unknown or uninitialized.
    #[default]
    X = 2,
    /// High-impedance (tri-state).
    Z = 3,
}

impl Logic {
    /// Converts a character to a [`Logic`] value.
    ///
    /// Accepts '0', '1', 'x'/'X', and 'z'/'Z'.
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '0' => Some(Logic::Zero),
            '1' => Some(Logic::One),
            'x' | 'X' => Some(Logic::X),
            'z' | 'Z' => Some(Logic::Z),
            _ => None,
        }
    }

    /// Returns `true` if the value is a driven `0` or `1`.
    pub fn is_driven(self) -> bool {
        matches!(self, Logic::Zero | Logic::One)
    }

    /// Returns the boolean level of a driven value, `None` for `X`/`Z`.
    pub fn to_bool(self) -> Option<bool> {
        match self {
            Logic::Zero => Some(false),
            Logic::One => Some(true),
            Logic::X | Logic::Z => None,
        }
    }

    /// Lowercase VCD character for this value.
    pub fn vcd_char(self) -> char {
        match self {
            Logic::Zero => '0',
            Logic::One => '1',
            Logic::X => 'x',
            Logic::Z => 'z',
        }
    }
}

impl From<bool> for Logic {
    fn from(b: bool) -> Self {
        if b {
            Logic::One
        } else {
            Logic::Zero
        }
    }
}

impl fmt::Display for Logic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Logic::Zero => write!(f, "0"),
            Logic::One => write!(f, "1"),
            Logic::X => write!(f, "X"),
            Logic::Z => write!(f, "Z"),
        }
    }
}

/// IEEE 1164 NOT:
/// - `!0 = 1`, `!1 = 0`, `!X = X`, `!Z = X`
impl Not for Logic {
    type Output = Self;

    fn not(self) -> Self {
        use Logic::*;
        match self {
            Zero => One,
            One => Zero,
            X | Z => X,
        }
    }
}
