//! Asynchronous serial transmitter.

use std::collections::VecDeque;

/// Start bit, eight data bits, one stop bit.
const FRAME_BITS: u32 = 10;

/// 8N1 transmitter with a byte queue. The next queued byte starts in the
/// same cycle the previous stop bit ends.
#[derive(Debug, Clone, Default)]
pub struct UartTx {
    queue: VecDeque<u8>,
    /// `(byte, bit index, cycles into the bit)` of the frame in flight.
    current: Option<(u8, u32, u32)>,
}

impl UartTx {
    /// Drops queued bytes and returns the line to idle.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Queues bytes for transmission.
    pub fn enqueue(&mut self, bytes: &[u8]) {
        self.queue.extend(bytes.iter().copied());
    }

    /// Nothing queued and nothing in flight.
    pub fn is_idle(&self) -> bool {
        self.current.is_none() && self.queue.is_empty()
    }

    /// Advances one cycle of a `bit_cycles`-long bit period.
    pub fn step(&mut self, bit_cycles: u32) {
        if let Some((byte, bit, count)) = self.current {
            let count = count + 1;
            self.current = if count < bit_cycles {
                Some((byte, bit, count))
            } else if bit + 1 < FRAME_BITS {
                Some((byte, bit + 1, 0))
            } else {
                None
            };
        }
        if self.current.is_none() {
            self.current = self.queue.pop_front().map(|byte| (byte, 0, 0));
        }
    }

    /// The line level; `flip` inverts one data bit position and
    /// `low_stop` sends the stop bit as 0.
    pub fn line(&self, flip: Option<u8>, low_stop: bool) -> bool {
        match self.current {
            None => true,
            Some((_, 0, _)) => false,
            Some((byte, bit, _)) if bit <= 8 => {
                let index = (bit - 1) as u8;
                let level = (byte >> index) & 1 == 1;
                level ^ (flip == Some(index))
            }
            Some(_) => !low_stop,
        }
    }
}
