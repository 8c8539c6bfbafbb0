//! The firmware-like action list the reference design executes after reset.

use serde::{Deserialize, Serialize};

use super::shift::ShiftPort;
use super::uart::UartTx;

/// Cycles after reset before the first action.
pub const BOOT_CYCLES: u32 = 200;
/// Cycles between consecutive traffic phases.
pub const GAP_CYCLES: u32 = 16;

/// One step of the design's traffic program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    /// Do nothing for this many cycles.
    Delay(u32),
    /// Transmit bytes on the UART and wait until the line is idle again.
    Send(Vec<u8>),
    /// Wait for this many speaker strobes.
    AwaitStrobes(u32),
    /// Wait until the interrupt input is high.
    AwaitIrq,
    /// Exchange one byte on the shift-register port.
    Transfer(u8),
    /// Transmit the last byte received on the shift-register port.
    SendReceived,
}

impl Action {
    /// The reference traffic: greeting byte, three strobes, a two-byte
    /// burst, a shift-port exchange on request, then the exchanged byte
    /// echoed on the UART.
    pub fn default_program() -> Vec<Action> {
        vec![
            Action::Delay(BOOT_CYCLES),
            Action::Send(vec![0x57]),
            Action::AwaitStrobes(3),
            Action::Delay(GAP_CYCLES),
            Action::Send(vec![0x16, 0x34]),
            Action::AwaitIrq,
            Action::Transfer(0xA5),
            Action::Delay(GAP_CYCLES),
            Action::SendReceived,
        ]
    }
}

/// Peripherals and inputs an action may touch during one cycle.
pub struct Io<'a> {
    pub uart: &'a mut UartTx,
    pub shift: &'a mut ShiftPort,
    /// A speaker strobe started this cycle.
    pub strobe: bool,
    /// Level of the interrupt input.
    pub irq: bool,
}

/// Executes a list of [`Action`]s, one step per cycle.
#[derive(Debug, Clone, Default)]
pub struct Sequencer {
    pc: usize,
    count: u32,
    started: bool,
    received: u8,
}

impl Sequencer {
    /// Restarts from the first action.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Whether every action has completed.
    pub fn is_finished(&self, program: &[Action]) -> bool {
        self.pc >= program.len()
    }

    /// Runs the current action for one cycle.
    pub fn step(&mut self, program: &[Action], io: Io<'_>) {
        let Some(action) = program.get(self.pc) else {
            return;
        };
        let complete = match action {
            Action::Delay(cycles) => {
                self.count += 1;
                self.count >= *cycles
            }
            Action::Send(bytes) => self.send(io.uart, bytes),
            Action::SendReceived => {
                let byte = [self.received];
                self.send(io.uart, &byte)
            }
            Action::AwaitStrobes(n) => {
                self.count += u32::from(io.strobe);
                self.count >= *n
            }
            Action::AwaitIrq => io.irq,
            Action::Transfer(byte) => {
                if !self.started {
                    io.shift.start(*byte);
                    self.started = true;
                    false
                } else if io.shift.is_done() {
                    self.received = io.shift.received();
                    true
                } else {
                    false
                }
            }
        };
        if complete {
            self.pc += 1;
            self.count = 0;
            self.started = false;
        }
    }

    fn send(&mut self, uart: &mut UartTx, bytes: &[u8]) -> bool {
        if !self.started {
            uart.enqueue(bytes);
            self.started = true;
            false
        } else {
            uart.is_idle()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(seq: &mut Sequencer, program: &[Action], uart: &mut UartTx, shift: &mut ShiftPort) {
        uart.step(9);
        shift.step(4, true);
        seq.step(
            program,
            Io {
                uart,
                shift,
                strobe: false,
                irq: true,
            },
        );
    }

    #[test]
    fn delay_then_send() {
        let program = vec![Action::Delay(3), Action::Send(vec![0x41])];
        let mut seq = Sequencer::default();
        let (mut uart, mut shift) = (UartTx::default(), ShiftPort::default());
        for _ in 0..3 {
            run(&mut seq, &program, &mut uart, &mut shift);
        }
        assert!(uart.is_idle());
        run(&mut seq, &program, &mut uart, &mut shift);
        assert!(!uart.is_idle());
        for _ in 0..95 {
            run(&mut seq, &program, &mut uart, &mut shift);
        }
        assert!(seq.is_finished(&program));
    }

    #[test]
    fn transfer_then_echo() {
        let program = vec![Action::AwaitIrq, Action::Transfer(0x00), Action::SendReceived];
        let mut seq = Sequencer::default();
        let (mut uart, mut shift) = (UartTx::default(), ShiftPort::default());
        for _ in 0..70 {
            run(&mut seq, &program, &mut uart, &mut shift);
        }
        assert_eq!(seq.received, 0xFF);
        assert!(!uart.is_idle());
    }

    #[test]
    fn default_program_shape() {
        let program = Action::default_program();
        assert_eq!(program.first(), Some(&Action::Delay(BOOT_CYCLES)));
        assert_eq!(program.last(), Some(&Action::SendReceived));
    }
}
