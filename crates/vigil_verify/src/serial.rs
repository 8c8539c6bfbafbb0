//! Synchronous serial (shift-register) transaction checker.

use vigil_common::Logic;
use vigil_sim::Trigger;

use crate::error::VerifyError;
use crate::harness::Bench;
use crate::procedure::{Procedure, Step};

/// One bit exchanged on the subordinate clock.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SerialTransaction {
    /// Level driven into the circuit before the rising edge; the circuit
    /// latches it on the following falling edge.
    pub drive: bool,
    /// Level expected out of the circuit at the rising edge.
    pub expect: bool,
}

impl SerialTransaction {
    /// Pairs up drive and expect bits; extra bits on either side are dropped.
    pub fn zip(drive: &[bool], expect: &[bool]) -> Vec<SerialTransaction> {
        drive
            .iter()
            .zip(expect)
            .map(|(&drive, &expect)| SerialTransaction { drive, expect })
            .collect()
    }
}

/// Names of the shift-register lines.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SerialSignals {
    /// Subordinate clock, driven by the circuit.
    pub sclk: String,
    /// Data into the circuit.
    pub sdi: String,
    /// Data out of the circuit.
    pub sdo: String,
}

impl Default for SerialSignals {
    fn default() -> Self {
        Self {
            sclk: "spi_sclk".into(),
            sdi: "spi_sdi".into(),
            sdo: "spi_sdo".into(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Prime,
    Sample(usize),
    Shift(usize),
}

/// Walks a transaction list, one pair per subordinate clock period.
#[derive(Clone, Debug)]
pub struct SerialChecker {
    signals: SerialSignals,
    transactions: Vec<SerialTransaction>,
    state: State,
}

impl SerialChecker {
    /// Creates a checker for `transactions`.
    pub fn new(signals: SerialSignals, transactions: Vec<SerialTransaction>) -> Self {
        Self {
            signals,
            transactions,
            state: State::Prime,
        }
    }
}

impl Procedure for SerialChecker {
    type Output = usize;

    fn resume<'p>(&'p mut self, bench: &mut Bench<'_>) -> Result<Step<'p, usize>, VerifyError> {
        match self.state {
            State::Prime => {
                let Some(first) = self.transactions.first() else {
                    return Ok(Step::Done(0));
                };
                // No falling edge precedes the first pair.
                bench.drive(&self.signals.sdi, first.drive)?;
                self.state = State::Sample(0);
                Ok(Step::Wait(Trigger::RisingEdge(&self.signals.sclk)))
            }
            State::Sample(i) => {
                let cycle = bench.cycle();
                let expected = self.transactions[i].expect;
                let observed = bench.read_driven_at(&self.signals.sdo, cycle)?;
                if observed != expected {
                    return Err(VerifyError::Serial {
                        cycle,
                        signal: self.signals.sdo.clone(),
                        index: i,
                        expected: Logic::from(expected),
                        observed: Logic::from(observed),
                    });
                }
                tracing::trace!(index = i, level = observed, cycle, "serial sample");
                self.state = State::Shift(i);
                Ok(Step::Wait(Trigger::FallingEdge(&self.signals.sclk)))
            }
            State::Shift(i) => match self.transactions.get(i + 1) {
                Some(next) => {
                    bench.drive(&self.signals.sdi, next.drive)?;
                    self.state = State::Sample(i + 1);
                    Ok(Step::Wait(Trigger::RisingEdge(&self.signals.sclk)))
                }
                None => {
                    tracing::info!(
                        bits = self.transactions.len(),
                        cycle = bench.cycle(),
                        "serial transfer matched"
                    );
                    self.state = State::Prime;
                    Ok(Step::Done(self.transactions.len()))
                }
            },
        }
    }
}
