//! Clock and reset harness.
//!
//! [`Bench`] wraps a [`SignalAccess`] for the duration of one scenario. It
//! owns the clock, the reset pulse, the cycle counter every failure is
//! reported against, and the bounds applied to every wait.

use vigil_common::{Logic, SimTime};
use vigil_config::MIN_RESET_CYCLES;
use vigil_sim::{SignalAccess, Trigger, WaitOutcome};

use crate::error::VerifyError;
use crate::procedure::{Procedure, Step};

/// Clock, reset and wait-bound parameters shared by every scenario.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessSpec {
    /// The primary clock port.
    pub clock: String,
    /// Primary clock period.
    pub period: SimTime,
    /// The active-low reset port.
    pub reset: String,
    /// Cycles the reset is held low.
    pub reset_cycles: u64,
    /// Delay after releasing the reset.
    pub reset_settle: SimTime,
    /// Inputs driven to a known level before reset.
    pub idle_drives: Vec<(String, Logic)>,
    /// Bound on each edge wait.
    pub event_timeout: SimTime,
    /// Bound on a whole scenario, if any.
    pub scenario_timeout: Option<SimTime>,
}

/// One scenario's view of the simulation.
pub struct Bench<'s> {
    sim: &'s mut dyn SignalAccess,
    spec: &'s HarnessSpec,
    released_at: Option<SimTime>,
    deadline: Option<SimTime>,
}

impl<'s> Bench<'s> {
    /// Wraps a simulation. The scenario deadline starts counting now.
    pub fn new(sim: &'s mut dyn SignalAccess, spec: &'s HarnessSpec) -> Self {
        let deadline = spec
            .scenario_timeout
            .map(|limit| sim.now().saturating_add(limit));
        Self {
            sim,
            spec,
            released_at: None,
            deadline,
        }
    }

    /// The harness parameters.
    pub fn spec(&self) -> &HarnessSpec {
        self.spec
    }

    /// The primary clock port.
    pub fn clock(&self) -> &str {
        &self.spec.clock
    }

    /// Current simulation time.
    pub fn now(&self) -> SimTime {
        self.sim.now()
    }

    /// Whole clock cycles since the reset was released; zero before that.
    pub fn cycle(&self) -> u64 {
        match self.released_at {
            Some(at) if self.spec.period.fs > 0 => {
                self.sim.now().saturating_sub(at).fs / self.spec.period.fs
            }
            _ => 0,
        }
    }

    /// Starts the primary clock.
    pub fn start_clock(&mut self) -> Result<(), VerifyError> {
        self.sim
            .start_clock(&self.spec.clock, self.spec.period)
            .map_err(|e| VerifyError::Setup(format!("cannot start clock: {e}")))
    }

    /// Drives every configured idle input.
    pub fn drive_idle(&mut self) -> Result<(), VerifyError> {
        for (signal, level) in &self.spec.idle_drives {
            self.sim
                .drive(signal, *level)
                .map_err(|e| VerifyError::Setup(format!("cannot drive idle input: {e}")))?;
        }
        Ok(())
    }

    /// Holds the reset low for `cycles` clock cycles, releases it, and
    /// waits the settle delay.
    pub fn reset_pulse(&mut self, cycles: u64) -> Result<(), VerifyError> {
        if cycles < MIN_RESET_CYCLES {
            return Err(VerifyError::Setup(format!(
                "reset must last at least {MIN_RESET_CYCLES} cycle(s), got {cycles}"
            )));
        }
        let spec = self.spec;
        self.sim
            .drive(&spec.reset, Logic::Zero)
            .map_err(|e| VerifyError::Setup(format!("cannot assert reset: {e}")))?;
        self.wait(&Trigger::ClockCycles {
            clock: &spec.clock,
            count: cycles,
        })?;
        self.released_at = Some(self.sim.now());
        self.sim.drive(&spec.reset, Logic::One)?;
        self.wait(&Trigger::Timer(spec.reset_settle))?;
        tracing::info!(cycles, time = %self.sim.now(), "reset released");
        Ok(())
    }

    /// Clock, idle inputs, and the configured reset pulse.
    pub fn prologue(&mut self) -> Result<(), VerifyError> {
        self.start_clock()?;
        self.drive_idle()?;
        self.reset_pulse(self.spec.reset_cycles)
    }

    /// Reads a signal as-is.
    pub fn read(&self, signal: &str) -> Result<Logic, VerifyError> {
        Ok(self.sim.read(signal)?)
    }

    /// Reads a signal that must be driven, reporting failures at `cycle`.
    pub fn read_driven_at(&self, signal: &str, cycle: u64) -> Result<bool, VerifyError> {
        let value = self.read(signal)?;
        value.to_bool().ok_or_else(|| VerifyError::Undriven {
            cycle,
            signal: signal.to_string(),
            observed: value,
        })
    }

    /// Reads a signal that must be driven.
    pub fn read_driven(&self, signal: &str) -> Result<bool, VerifyError> {
        self.read_driven_at(signal, self.cycle())
    }

    /// Asserts a driven level, reporting failures at `cycle`.
    pub fn expect_at(&self, signal: &str, expected: bool, cycle: u64) -> Result<(), VerifyError> {
        let observed = self.read_driven_at(signal, cycle)?;
        if observed != expected {
            return Err(VerifyError::Mismatch {
                cycle,
                signal: signal.to_string(),
                expected: Logic::from(expected),
                observed: Logic::from(observed),
            });
        }
        Ok(())
    }

    /// Asserts a driven level at the current cycle.
    pub fn expect(&self, signal: &str, expected: bool) -> Result<(), VerifyError> {
        self.expect_at(signal, expected, self.cycle())
    }

    /// Drives an input.
    pub fn drive(&mut self, signal: &str, level: bool) -> Result<(), VerifyError> {
        Ok(self.sim.drive(signal, Logic::from(level))?)
    }

    /// Drives an input at the next falling edge of the primary clock, so the
    /// change is half a cycle from the edges the circuit samples on.
    pub fn drive_on_falling_edge(&mut self, signal: &str, level: bool) -> Result<(), VerifyError> {
        let spec = self.spec;
        self.wait(&Trigger::FallingEdge(&spec.clock))?;
        self.drive(signal, level)
    }

    /// Suspends on `trigger`.
    ///
    /// Edge waits are bounded by the event timeout; every wait is bounded by
    /// the scenario deadline.
    pub fn wait(&mut self, trigger: &Trigger<'_>) -> Result<(), VerifyError> {
        let event_bound = match trigger {
            Trigger::RisingEdge(_) | Trigger::FallingEdge(_) => {
                Some(self.sim.now().saturating_add(self.spec.event_timeout))
            }
            Trigger::ClockCycles { .. } | Trigger::Timer(_) => None,
        };
        let bound = match (event_bound, self.deadline) {
            (Some(e), Some(d)) => Some(e.min(d)),
            (e, d) => e.or(d),
        };

        match self.sim.wait(trigger, bound)? {
            WaitOutcome::Fired => Ok(()),
            WaitOutcome::TimedOut => {
                let cycle = self.cycle();
                let waiting_for = trigger.to_string();
                if self.deadline.is_some_and(|d| self.sim.now() >= d) {
                    Err(VerifyError::ScenarioDeadline {
                        cycle,
                        waiting_for,
                        limit: self.spec.scenario_timeout.unwrap_or_default(),
                    })
                } else {
                    Err(VerifyError::Timeout {
                        cycle,
                        waiting_for,
                        bound: self.spec.event_timeout,
                    })
                }
            }
        }
    }

    /// Lets `count` clock cycles pass without looking at anything.
    pub fn skip_cycles(&mut self, count: u64) -> Result<(), VerifyError> {
        let spec = self.spec;
        self.wait(&Trigger::ClockCycles {
            clock: &spec.clock,
            count,
        })
    }

    /// Drives a procedure to completion.
    pub fn run<P: Procedure>(&mut self, procedure: &mut P) -> Result<P::Output, VerifyError> {
        loop {
            match procedure.resume(self)? {
                Step::Wait(trigger) => self.wait(&trigger)?,
                Step::Done(output) => return Ok(output),
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use vigil_sim::{ReferenceConfig, ReferenceDesign, SimKernel};

    pub(crate) fn spec() -> HarnessSpec {
        HarnessSpec {
            clock: "clk".into(),
            period: SimTime::from_ns(40),
            reset: "ext_reset_n".into(),
            reset_cycles: 10,
            reset_settle: SimTime::from_ns(10),
            idle_drives: vec![
                ("uart_rx".into(), Logic::One),
                ("spi_sdi".into(), Logic::Zero),
                ("spi_irq".into(), Logic::Zero),
            ],
            event_timeout: SimTime::from_us(100),
            scenario_timeout: None,
        }
    }

    pub(crate) fn kernel(config: ReferenceConfig) -> SimKernel {
        SimKernel::new(Box::new(ReferenceDesign::new(config))).unwrap()
    }

    #[test]
    fn cycle_counts_from_release() {
        let spec = spec();
        let mut sim = kernel(ReferenceConfig::default());
        let mut bench = Bench::new(&mut sim, &spec);
        assert_eq!(bench.cycle(), 0);
        bench.prologue().unwrap();
        assert_eq!(bench.cycle(), 0);
        assert_eq!(bench.now(), SimTime::from_ns(20 + 9 * 40 + 10));
        bench.skip_cycles(5).unwrap();
        assert_eq!(bench.cycle(), 5);
    }

    #[test]
    fn outputs_driven_after_prologue() {
        let spec = spec();
        let mut sim = kernel(ReferenceConfig::default());
        let mut bench = Bench::new(&mut sim, &spec);
        bench.prologue().unwrap();
        bench.expect("hsync", true).unwrap();
        bench.expect("uart_tx", true).unwrap();
        assert!(!bench.read_driven("speaker").unwrap());
    }

    #[test]
    fn zero_cycle_reset_is_a_setup_error() {
        let spec = spec();
        let mut sim = kernel(ReferenceConfig::default());
        let mut bench = Bench::new(&mut sim, &spec);
        bench.start_clock().unwrap();
        assert!(matches!(bench.reset_pulse(0), Err(VerifyError::Setup(_))));
    }

    #[test]
    fn bad_clock_is_a_setup_error() {
        let spec = HarnessSpec {
            clock: "no_such_clock".into(),
            ..spec()
        };
        let mut sim = kernel(ReferenceConfig::default());
        let mut bench = Bench::new(&mut sim, &spec);
        assert!(matches!(bench.prologue(), Err(VerifyError::Setup(_))));
    }

    #[test]
    fn expect_reports_mismatch_and_undriven() {
        let spec = spec();
        let mut sim = kernel(ReferenceConfig::default());
        let mut bench = Bench::new(&mut sim, &spec);
        assert!(matches!(
            bench.expect("hsync", true),
            Err(VerifyError::Undriven { .. })
        ));
        bench.prologue().unwrap();
        let err = bench.expect_at("vsync", false, 42).unwrap_err();
        assert!(matches!(
            err,
            VerifyError::Mismatch {
                cycle: 42,
                expected: Logic::Zero,
                observed: Logic::One,
                ..
            }
        ));
    }

    #[test]
    fn edge_wait_times_out() {
        let spec = spec();
        let mut sim = kernel(ReferenceConfig::default());
        let mut bench = Bench::new(&mut sim, &spec);
        bench.prologue().unwrap();
        let err = bench.wait(&Trigger::RisingEdge("spi_sclk")).unwrap_err();
        assert!(matches!(err, VerifyError::Timeout { .. }), "{err}");
        assert_eq!(err.cycle(), Some(2500));
    }

    #[test]
    fn scenario_deadline_bounds_cycle_waits() {
        let spec = HarnessSpec {
            scenario_timeout: Some(SimTime::from_us(10)),
            ..spec()
        };
        let mut sim = kernel(ReferenceConfig::default());
        let mut bench = Bench::new(&mut sim, &spec);
        bench.prologue().unwrap();
        let err = bench.skip_cycles(1_000_000).unwrap_err();
        assert!(matches!(err, VerifyError::ScenarioDeadline { .. }), "{err}");
    }
}
