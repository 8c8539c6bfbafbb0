//! Shift-register port driving the `spi_*` lines.

/// Byte exchange on a subordinate clock, MSB first. The output bit is valid
/// from the rising edge; the input bit is latched on the falling edge, after
/// which the output moves to the next bit.
#[derive(Debug, Clone, Default)]
pub struct ShiftPort {
    active: bool,
    tx: u8,
    rx: u8,
    bit: u8,
    count: u32,
    sclk: bool,
    done: bool,
}

impl ShiftPort {
    /// Returns the port to idle.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Starts exchanging `byte`; the first bit is presented immediately.
    pub fn start(&mut self, byte: u8) {
        *self = Self {
            active: true,
            tx: byte,
            ..Self::default()
        };
    }

    /// Advances one cycle of the main clock.
    pub fn step(&mut self, half_period: u32, sdi: bool) {
        if !self.active {
            return;
        }
        self.count += 1;
        if self.count == half_period {
            self.sclk = true;
        } else if self.count >= 2 * half_period {
            self.sclk = false;
            self.rx = (self.rx << 1) | u8::from(sdi);
            self.count = 0;
            self.bit += 1;
            if self.bit == 8 {
                self.active = false;
                self.done = true;
            }
        }
    }

    /// Whether a full byte has been exchanged since the last start.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// The byte shifted in.
    pub fn received(&self) -> u8 {
        self.rx
    }

    /// Subordinate clock level.
    pub fn sclk(&self) -> bool {
        self.sclk
    }

    /// Output data level; `flip` inverts the bit with that transfer index.
    pub fn sdo(&self, flip: Option<u8>) -> bool {
        if !self.active {
            return false;
        }
        let level = (self.tx >> (7 - self.bit)) & 1 == 1;
        level ^ (flip == Some(self.bit))
    }
}
