//! Behavioral devices the kernel can simulate.

use std::collections::HashMap;

use vigil_common::Logic;

use crate::value::{PortDirection, SimSignalId, SimSignalState};

/// Declaration of one device port.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PortDecl {
    /// Port name, unique within the device.
    pub name: String,
    /// Which side drives it.
    pub direction: PortDirection,
    /// Power-up value, before anything drives it.
    pub initial: Logic,
}

impl PortDecl {
    /// An input port, `X` until driven.
    pub fn input(name: &str) -> Self {
        Self {
            name: name.to_string(),
            direction: PortDirection::Input,
            initial: Logic::X,
        }
    }

    /// An output port with the given power-up value.
    pub fn output(name: &str, initial: Logic) -> Self {
        Self {
            name: name.to_string(),
            direction: PortDirection::Output,
            initial,
        }
    }
}

/// A synchronous circuit evaluated once per rising edge of its clock.
pub trait Device {
    /// Human-readable device name, used as the waveform scope.
    fn name(&self) -> &str;

    /// All ports of the device, including its clock.
    fn ports(&self) -> Vec<PortDecl>;

    /// The input port whose rising edge evaluates the device.
    fn clock_port(&self) -> &str;

    /// Computes the outputs after one rising edge from the current inputs.
    fn on_rising_edge(&mut self, pins: &mut Pins<'_>);
}

/// The device's view of its ports during one evaluation.
///
/// Reads return values from before the edge; writes are collected and
/// applied by the kernel once the evaluation returns.
pub struct Pins<'k> {
    by_name: &'k HashMap<String, SimSignalId>,
    signals: &'k [SimSignalState],
    writes: Vec<(SimSignalId, Logic)>,
}

impl<'k> Pins<'k> {
    pub(crate) fn new(
        by_name: &'k HashMap<String, SimSignalId>,
        signals: &'k [SimSignalState],
    ) -> Self {
        Self {
            by_name,
            signals,
            writes: Vec::new(),
        }
    }

    /// Reads a port. Unknown names read as `X`.
    pub fn read(&self, port: &str) -> Logic {
        self.by_name
            .get(port)
            .map(|id| self.signals[id.index()].value)
            .unwrap_or(Logic::X)
    }

    /// Schedules a new value for a port. Unknown names are ignored.
    pub fn write(&mut self, port: &str, value: Logic) {
        if let Some(&id) = self.by_name.get(port) {
            self.writes.push((id, value));
        }
    }

    pub(crate) fn into_writes(self) -> Vec<(SimSignalId, Logic)> {
        self.writes
    }
}
