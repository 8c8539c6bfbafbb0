//! Periodic speaker strobe.

/// A free-running counter that raises the speaker for the last few counts
/// of every period.
#[derive(Debug, Clone, Default)]
pub struct Tone {
    count: u32,
    rose: bool,
}

impl Tone {
    /// Returns the counter to zero.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Advances one cycle.
    pub fn step(&mut self, period: u32, width: u32) {
        let was_high = self.is_high(period, width);
        self.count = (self.count + 1) % period.max(1);
        self.rose = !was_high && self.is_high(period, width);
    }

    /// Whether the strobe is high.
    pub fn is_high(&self, period: u32, width: u32) -> bool {
        self.count >= period.saturating_sub(width)
    }

    /// Whether the last step started a pulse.
    pub fn rose(&self) -> bool {
        self.rose
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pulse_position_and_width() {
        let mut tone = Tone::default();
        let mut rises = Vec::new();
        let mut high = 0;
        for cycle in 1..=3000 {
            tone.step(1500, 4);
            if tone.rose() {
                rises.push(cycle);
            }
            if tone.is_high(1500, 4) {
                high += 1;
            }
        }
        assert_eq!(rises, vec![1496, 2996]);
        assert_eq!(high, 8);
    }
}
