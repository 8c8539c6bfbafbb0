//! The standard scenarios: reset, first frame, and protocol traffic.

use vigil_sim::Trigger;

use crate::error::VerifyError;
use crate::frame::{FrameCheck, FramePlan, VgaSignals};
use crate::harness::Bench;
use crate::pixel::PixelChecker;
use crate::serial::{SerialChecker, SerialSignals, SerialTransaction};
use crate::timing::{FrameGeometry, RegistrationDelays, VgaTimingModel};
use crate::uart::{UartDecoder, UartTiming};

/// An ordered sequence of stimulus and assertions against a fresh circuit.
pub trait Scenario {
    /// Name shown in reports and matched by filters.
    fn name(&self) -> &str;

    /// Runs the scenario from power-up. The first failure aborts it.
    fn run(&self, bench: &mut Bench<'_>) -> Result<(), VerifyError>;
}

/// Every primary output is driven right after reset.
#[derive(Clone, Debug)]
pub struct ResetScenario {
    /// Scenario name.
    pub name: String,
    /// Reset length in cycles.
    pub reset_cycles: u64,
    /// Outputs that must be driven.
    pub outputs: Vec<String>,
}

impl Scenario for ResetScenario {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self, bench: &mut Bench<'_>) -> Result<(), VerifyError> {
        bench.start_clock()?;
        bench.drive_idle()?;
        bench.reset_pulse(self.reset_cycles)?;
        for output in &self.outputs {
            bench.read_driven(output)?;
        }
        tracing::info!(outputs = self.outputs.len(), "all outputs driven after reset");
        Ok(())
    }
}

/// Pixel-exact and counted lines of the first frame, then the frame wrap.
#[derive(Clone)]
pub struct FrameScenario {
    /// Scenario name.
    pub name: String,
    /// Frame geometry.
    pub geometry: FrameGeometry,
    /// Output registration delays.
    pub delays: RegistrationDelays,
    /// VGA output names.
    pub signals: VgaSignals,
    /// Declared content.
    pub pixels: PixelChecker,
    /// Which lines to check and how.
    pub plan: FramePlan,
}

impl Scenario for FrameScenario {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self, bench: &mut Bench<'_>) -> Result<(), VerifyError> {
        bench.prologue()?;
        let mut check = FrameCheck::new(
            bench.clock(),
            self.signals.clone(),
            VgaTimingModel::new(self.geometry, self.delays),
            self.pixels.clone(),
            self.plan.clone(),
        );
        let report = bench.run(&mut check)?;
        tracing::info!(observations = report.observations, "frame wrap verified");
        Ok(())
    }
}

/// One step of the protocol scenario.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProtocolStep {
    /// Decode one UART byte and compare it.
    Decode(u8),
    /// Wait for this many rising edges of the strobe line.
    Pulses(u32),
    /// Drive an input at the next falling edge of the primary clock.
    Drive {
        /// The input.
        signal: String,
        /// Level to drive.
        level: bool,
    },
    /// Run a shift-register exchange.
    Serial(Vec<SerialTransaction>),
    /// Let cycles pass.
    Idle(u64),
}

/// Interleaved UART, strobe and shift-register traffic.
#[derive(Clone, Debug)]
pub struct ProtocolScenario {
    /// Scenario name.
    pub name: String,
    /// UART output of the circuit.
    pub uart_line: String,
    /// UART bit timing.
    pub uart: UartTiming,
    /// Periodic strobe output.
    pub strobe: String,
    /// Shift-register lines.
    pub serial: SerialSignals,
    /// The traffic, in order.
    pub steps: Vec<ProtocolStep>,
}

impl Scenario for ProtocolScenario {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self, bench: &mut Bench<'_>) -> Result<(), VerifyError> {
        bench.prologue()?;
        for step in &self.steps {
            match step {
                ProtocolStep::Decode(byte) => {
                    let mut decoder =
                        UartDecoder::new(&self.uart_line, bench.clock(), self.uart, *byte);
                    bench.run(&mut decoder)?;
                }
                ProtocolStep::Pulses(count) => {
                    for _ in 0..*count {
                        bench.wait(&Trigger::RisingEdge(&self.strobe))?;
                    }
                    tracing::debug!(count, cycle = bench.cycle(), "strobe pulses seen");
                }
                ProtocolStep::Drive { signal, level } => {
                    bench.drive_on_falling_edge(signal, *level)?
                }
                ProtocolStep::Serial(transactions) => {
                    let mut checker =
                        SerialChecker::new(self.serial.clone(), transactions.clone());
                    bench.run(&mut checker)?;
                }
                ProtocolStep::Idle(cycles) => bench.skip_cycles(*cycles)?,
            }
        }
        Ok(())
    }
}
