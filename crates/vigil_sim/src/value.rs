//! Simulation signal identifiers and per-signal state.

use serde::{Deserialize, Serialize};
use vigil_common::Logic;

/// Opaque ID for a kernel signal.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct SimSignalId(u32);

impl SimSignalId {
    /// Creates a `SimSignalId` from a raw index.
    pub fn from_raw(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw index.
    pub fn as_raw(self) -> u32 {
        self.0
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// Which side drives a signal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PortDirection {
    /// Driven by the testbench (or a kernel clock), read by the device.
    Input,
    /// Driven by the device, read by the testbench.
    Output,
}

/// The runtime state of one simulation signal.
#[derive(Clone, Debug)]
pub struct SimSignalState {
    /// Signal name, unique within the kernel.
    pub name: String,
    /// Current value.
    pub value: Logic,
    /// Which side drives it.
    pub direction: PortDirection,
}

/// Classification of a value change as seen by edge triggers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EdgeKind {
    /// Transition to `1` from any other state.
    Rising,
    /// Transition to `0` from any other state.
    Falling,
    /// Transition to `X` or `Z`.
    Other,
}

impl EdgeKind {
    /// Classifies a change from `old` to `new`; `None` if nothing changed.
    pub fn classify(old: Logic, new: Logic) -> Option<EdgeKind> {
        if old == new {
            return None;
        }
        Some(match new {
            Logic::One => EdgeKind::Rising,
            Logic::Zero => EdgeKind::Falling,
            Logic::X | Logic::Z => EdgeKind::Other,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_roundtrip() {
        let id = SimSignalId::from_raw(7);
        assert_eq!(id.as_raw(), 7);
        assert_eq!(id.index(), 7);
    }

    #[test]
    fn classify_edges() {
        use Logic::*;
        assert_eq!(EdgeKind::classify(Zero, One), Some(EdgeKind::Rising));
        assert_eq!(EdgeKind::classify(X, One), Some(EdgeKind::Rising));
        assert_eq!(EdgeKind::classify(One, Zero), Some(EdgeKind::Falling));
        assert_eq!(EdgeKind::classify(Z, Zero), Some(EdgeKind::Falling));
        assert_eq!(EdgeKind::classify(One, X), Some(EdgeKind::Other));
        assert_eq!(EdgeKind::classify(One, One), None);
    }
}
