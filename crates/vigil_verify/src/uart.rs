//! UART line decoder.
//!
//! The decoder waits for the falling edge of a start bit, confirms the start
//! bit after a short settle, then samples each data bit and the stop bit at
//! fixed cycle offsets from that edge. Every sample is compared as soon as it
//! is taken.

use vigil_common::{Logic, SimTime};
use vigil_sim::Trigger;

use crate::error::{UartBit, VerifyError};
use crate::harness::Bench;
use crate::procedure::{Procedure, Step};

/// Bit timing of the serial line, in clock cycles.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UartTiming {
    /// Clock cycles per bit.
    pub bit_cycles: u32,
    /// Sample point within each bit, in cycles from its start.
    pub sample_offset: u32,
    /// Delay between the start edge and the start-bit check.
    pub start_settle: SimTime,
    /// Number of stop-bit samples.
    pub stop_samples: u32,
    /// Cycles between consecutive stop-bit samples.
    pub stop_spacing: u32,
}

impl Default for UartTiming {
    fn default() -> Self {
        Self {
            bit_cycles: 9,
            sample_offset: 2,
            start_settle: SimTime::from_ns(10),
            stop_samples: 2,
            stop_spacing: 4,
        }
    }
}

impl UartTiming {
    /// Cycles from the start edge to the sample of data bit `i`.
    pub fn data_sample(&self, i: u8) -> u64 {
        (1 + u64::from(i)) * u64::from(self.bit_cycles) + u64::from(self.sample_offset)
    }

    /// Cycles from the start edge to stop sample `j`.
    pub fn stop_sample(&self, j: u32) -> u64 {
        9 * u64::from(self.bit_cycles)
            + u64::from(self.sample_offset)
            + u64::from(j) * u64::from(self.stop_spacing)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Idle,
    Settling,
    StartConfirm,
    Data(u8),
    Stop(u32),
}

/// Decodes one byte and compares it with the expected value.
#[derive(Clone, Debug)]
pub struct UartDecoder {
    line: String,
    clock: String,
    timing: UartTiming,
    expected: u8,
    state: State,
    /// Cycles since the start edge at the current sample.
    elapsed: u64,
    byte: u8,
}

impl UartDecoder {
    /// A decoder for `line`, counting cycles of `clock`.
    pub fn new(line: &str, clock: &str, timing: UartTiming, expected: u8) -> Self {
        Self {
            line: line.to_string(),
            clock: clock.to_string(),
            timing,
            expected,
            state: State::Idle,
            elapsed: 0,
            byte: 0,
        }
    }

    fn sample(&self, bench: &Bench<'_>, bit: UartBit, expected: bool) -> Result<bool, VerifyError> {
        let cycle = bench.cycle();
        let observed = bench.read_driven_at(&self.line, cycle)?;
        if observed != expected {
            return Err(VerifyError::UartBit {
                cycle,
                signal: self.line.clone(),
                byte: self.expected,
                bit,
                expected: Logic::from(expected),
                observed: Logic::from(observed),
            });
        }
        tracing::trace!(%bit, level = observed, cycle, "uart sample");
        Ok(observed)
    }

    /// Moves to `state`, sampled `at` cycles after the start edge.
    fn schedule(&mut self, state: State, at: u64) -> Step<'_, u8> {
        let count = at - self.elapsed;
        self.elapsed = at;
        self.state = state;
        Step::Wait(Trigger::ClockCycles {
            clock: &self.clock,
            count,
        })
    }
}

impl Procedure for UartDecoder {
    type Output = u8;

    fn resume<'p>(&'p mut self, bench: &mut Bench<'_>) -> Result<Step<'p, u8>, VerifyError> {
        match self.state {
            State::Idle => {
                self.state = State::Settling;
                Ok(Step::Wait(Trigger::FallingEdge(&self.line)))
            }
            State::Settling => {
                tracing::debug!(line = %self.line, cycle = bench.cycle(), "start edge");
                self.state = State::StartConfirm;
                Ok(Step::Wait(Trigger::Timer(self.timing.start_settle)))
            }
            State::StartConfirm => {
                self.sample(bench, UartBit::Start, false)?;
                self.elapsed = 0;
                self.byte = 0;
                let at = self.timing.data_sample(0);
                Ok(self.schedule(State::Data(0), at))
            }
            State::Data(i) => {
                let expected = (self.expected >> i) & 1 == 1;
                if self.sample(bench, UartBit::Data(i), expected)? {
                    self.byte |= 1 << i;
                }
                if i < 7 {
                    let at = self.timing.data_sample(i + 1);
                    Ok(self.schedule(State::Data(i + 1), at))
                } else {
                    let at = self.timing.stop_sample(0);
                    Ok(self.schedule(State::Stop(0), at))
                }
            }
            State::Stop(j) => {
                self.sample(bench, UartBit::Stop(j), true)?;
                if j + 1 < self.timing.stop_samples {
                    let at = self.timing.stop_sample(j + 1);
                    Ok(self.schedule(State::Stop(j + 1), at))
                } else {
                    tracing::info!(cycle = bench.cycle(), "uart byte 0x{:02X} decoded", self.byte);
                    self.state = State::Idle;
                    Ok(Step::Done(self.byte))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::tests::{kernel, spec};
    use vigil_sim::reference::{Action, BOOT_CYCLES};
    use vigil_sim::{Fault, ReferenceConfig};

    fn decode_all(
        program: Vec<Action>,
        faults: Vec<Fault>,
        bytes: &[u8],
    ) -> Result<Vec<u8>, VerifyError> {
        let spec = spec();
        let mut sim = kernel(ReferenceConfig {
            program,
            faults,
            ..ReferenceConfig::default()
        });
        let mut bench = Bench::new(&mut sim, &spec);
        bench.prologue()?;
        bytes
            .iter()
            .map(|&b| {
                let mut decoder = UartDecoder::new("uart_tx", "clk", UartTiming::default(), b);
                bench.run(&mut decoder)
            })
            .collect()
    }

    #[test]
    fn sample_points() {
        let t = UartTiming::default();
        assert_eq!(t.data_sample(0), 11);
        assert_eq!(t.data_sample(7), 74);
        assert_eq!(t.stop_sample(0), 83);
        assert_eq!(t.stop_sample(1), 87);
    }

    #[test]
    fn back_to_back_bytes_decode() {
        let bytes = [0x57, 0x16, 0x34];
        let program = vec![Action::Delay(BOOT_CYCLES), Action::Send(bytes.to_vec())];
        assert_eq!(decode_all(program, vec![], &bytes).unwrap(), bytes.to_vec());
    }

    #[test]
    fn boundary_values_decode() {
        let bytes = [0x00, 0xFF, 0x57];
        let program = vec![Action::Delay(20), Action::Send(bytes.to_vec())];
        assert_eq!(decode_all(program, vec![], &bytes).unwrap(), bytes.to_vec());
    }

    #[test]
    fn flipped_data_bit_is_named() {
        let program = vec![Action::Delay(20), Action::Send(vec![0x57])];
        let err =
            decode_all(program, vec![Fault::UartBitFlip { bit: 3 }], &[0x57]).unwrap_err();
        match err {
            VerifyError::UartBit {
                bit,
                byte,
                expected,
                observed,
                ..
            } => {
                assert_eq!(bit, UartBit::Data(3));
                assert_eq!(byte, 0x57);
                assert_eq!(expected, Logic::Zero);
                assert_eq!(observed, Logic::One);
            }
            other => panic!("unexpected {other}"),
        }
    }

    #[test]
    fn wrong_expectation_fails_on_first_differing_bit() {
        let program = vec![Action::Delay(20), Action::Send(vec![0x57])];
        let err = decode_all(program, vec![], &[0x55]).unwrap_err();
        assert!(matches!(
            err,
            VerifyError::UartBit {
                bit: UartBit::Data(1),
                ..
            }
        ));
    }

    #[test]
    fn glitch_shorter_than_settle_fails_start_confirm() {
        let program = vec![Action::Delay(20), Action::Send(vec![0x57])];
        match decode_all(program, vec![Fault::UartIdleGlitch], &[0x57]).unwrap_err() {
            VerifyError::UartBit {
                cycle,
                bit,
                expected,
                observed,
                ..
            } => {
                // The first cycle after release already glitches.
                assert_eq!(cycle, 1);
                assert_eq!(bit, UartBit::Start);
                assert_eq!(expected, Logic::Zero);
                assert_eq!(observed, Logic::One);
            }
            other => panic!("unexpected {other}"),
        }
    }

    #[test]
    fn low_stop_bit_fails_first_stop_sample() {
        let program = || vec![Action::Delay(20), Action::Send(vec![0x57])];
        let first_data = decode_all(program(), vec![Fault::UartBitFlip { bit: 0 }], &[0x57])
            .unwrap_err();
        assert!(matches!(
            first_data,
            VerifyError::UartBit { bit: UartBit::Data(0), .. }
        ));
        match decode_all(program(), vec![Fault::UartLowStop], &[0x57]).unwrap_err() {
            VerifyError::UartBit {
                cycle,
                bit,
                byte,
                expected,
                observed,
                ..
            } => {
                let t = UartTiming::default();
                let offset = t.stop_sample(0) - t.data_sample(0);
                assert_eq!(Some(cycle - offset), first_data.cycle());
                assert_eq!(bit, UartBit::Stop(0));
                assert_eq!(byte, 0x57);
                assert_eq!(expected, Logic::One);
                assert_eq!(observed, Logic::Zero);
            }
            other => panic!("unexpected {other}"),
        }
    }

    #[test]
    fn silent_line_times_out() {
        let err = decode_all(vec![], vec![], &[0x57]).unwrap_err();
        assert!(matches!(err, VerifyError::Timeout { .. }), "{err}");
    }
}
