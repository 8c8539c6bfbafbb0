//! The signal access boundary between a verification core and a simulator.
//!
//! [`SignalAccess`] is everything the checkers need from a simulation engine:
//! read and drive named signals, start a free-running clock, and block until
//! a [`Trigger`] fires. The in-tree [`SimKernel`](crate::SimKernel) implements
//! it; an adapter around an external HDL simulator would implement the same
//! trait.

use std::fmt;

use vigil_common::{Logic, SimTime};

use crate::error::SimError;

/// A condition a caller suspends on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Trigger<'a> {
    /// The next transition of the signal to `1`.
    RisingEdge(&'a str),
    /// The next transition of the signal to `0`.
    FallingEdge(&'a str),
    /// The `count`-th next rising edge of a clock.
    ClockCycles {
        /// The clock signal.
        clock: &'a str,
        /// Number of rising edges to let pass.
        count: u64,
    },
    /// A fixed span of simulation time. Used for settle delays only.
    Timer(SimTime),
}

impl fmt::Display for Trigger<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trigger::RisingEdge(s) => write!(f, "rising edge on {s}"),
            Trigger::FallingEdge(s) => write!(f, "falling edge on {s}"),
            Trigger::ClockCycles { clock, count } => write!(f, "{count} cycle(s) of {clock}"),
            Trigger::Timer(t) => write!(f, "timer of {t}"),
        }
    }
}

/// How a bounded wait ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The trigger fired before the deadline.
    Fired,
    /// The deadline passed first; simulation time now equals the deadline.
    TimedOut,
}

/// Read/drive/wait access to a running simulation.
///
/// Sampling convention: a caller resumed by a rising edge of the clock that
/// drives the circuit observes the values from *before* that edge took
/// effect, and values it drives at that point are seen by the circuit on the
/// following edge.
pub trait SignalAccess {
    /// Current simulation time.
    fn now(&self) -> SimTime;

    /// Reads the current value of a signal.
    fn read(&self, signal: &str) -> Result<Logic, SimError>;

    /// Drives an input signal.
    fn drive(&mut self, signal: &str, value: Logic) -> Result<(), SimError>;

    /// Starts a 50% duty-cycle clock that runs until the simulation ends.
    fn start_clock(&mut self, signal: &str, period: SimTime) -> Result<(), SimError>;

    /// Blocks until `trigger` fires or simulation time reaches `deadline`.
    fn wait(
        &mut self,
        trigger: &Trigger<'_>,
        deadline: Option<SimTime>,
    ) -> Result<WaitOutcome, SimError>;

    /// Ends the simulation, flushing any attached output.
    fn finish(&mut self) -> Result<(), SimError> {
        Ok(())
    }

    /// Suspends until the next rising edge of `signal`.
    fn await_rising_edge(&mut self, signal: &str) -> Result<(), SimError> {
        self.wait(&Trigger::RisingEdge(signal), None).map(drop)
    }

    /// Suspends until the next falling edge of `signal`.
    fn await_falling_edge(&mut self, signal: &str) -> Result<(), SimError> {
        self.wait(&Trigger::FallingEdge(signal), None).map(drop)
    }

    /// Suspends for exactly `count` rising edges of `clock`.
    fn await_cycles(&mut self, clock: &str, count: u64) -> Result<(), SimError> {
        self.wait(&Trigger::ClockCycles { clock, count }, None)
            .map(drop)
    }

    /// Suspends for a fixed span of simulation time.
    fn await_duration(&mut self, duration: SimTime) -> Result<(), SimError> {
        self.wait(&Trigger::Timer(duration), None).map(drop)
    }
}
