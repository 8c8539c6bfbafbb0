//! First-frame check: pixel-exact lines, counted lines, then frame wrap.
//!
//! Observation `n` is the output state during raster cycle `n`, i.e. after
//! the circuit has processed `n` clock edges since the reset edge. It is
//! read on the following rising edge, before that edge takes effect.
//! Failures report `n`.

use std::collections::BTreeMap;

use vigil_sim::Trigger;

use crate::error::VerifyError;
use crate::harness::Bench;
use crate::pixel::{Color, ColorCounter, PixelChecker};
use crate::procedure::{Procedure, Step};
use crate::timing::VgaTimingModel;

/// Names of the VGA outputs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VgaSignals {
    /// Horizontal sync.
    pub hsync: String,
    /// Vertical sync.
    pub vsync: String,
    /// Red.
    pub red: String,
    /// Green.
    pub green: String,
    /// Blue.
    pub blue: String,
}

impl Default for VgaSignals {
    fn default() -> Self {
        Self {
            hsync: "hsync".into(),
            vsync: "vsync".into(),
            red: "red".into(),
            green: "green".into(),
            blue: "blue".into(),
        }
    }
}

/// How much of the first frame to look at.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FramePlan {
    /// Lines checked pixel by pixel from the top of the frame.
    pub full_lines: u32,
    /// Lines after those whose colours are only counted.
    pub count_lines: u32,
    /// Colour classes for counting.
    pub classes: Vec<(String, Color)>,
    /// Declared per-class totals over the counted lines.
    pub expected_counts: BTreeMap<String, u64>,
}

/// What happens at one observation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    /// Sync and colour, first columns exempt from colour.
    Full,
    /// Sync, colour tallied.
    Count,
    /// Sync and colour, nothing exempt.
    Wrap,
}

/// Result of a passing frame check.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameReport {
    /// Observations compared or counted.
    pub observations: u64,
    /// Final colour tallies of the counted lines.
    pub counts: BTreeMap<String, u64>,
}

/// The first-frame procedure.
pub struct FrameCheck {
    signals: VgaSignals,
    clock: String,
    model: VgaTimingModel,
    checker: PixelChecker,
    counter: ColorCounter,
    plan: FramePlan,
    started: bool,
    observations: u64,
}

impl FrameCheck {
    /// Creates the procedure; `clock` is the primary clock port.
    pub fn new(
        clock: &str,
        signals: VgaSignals,
        model: VgaTimingModel,
        checker: PixelChecker,
        plan: FramePlan,
    ) -> Self {
        let counter = ColorCounter::new(plan.classes.clone());
        Self {
            signals,
            clock: clock.to_string(),
            model,
            checker,
            counter,
            plan,
            started: false,
            observations: 0,
        }
    }

    fn full_end(&self) -> u64 {
        u64::from(self.plan.full_lines) * u64::from(self.model.geometry().h_total())
    }

    fn count_end(&self) -> u64 {
        self.full_end()
            + u64::from(self.plan.count_lines) * u64::from(self.model.geometry().h_total())
    }

    fn wrap_range(&self) -> std::ops::Range<u64> {
        let frame = self.model.geometry().frame_cycles();
        frame..frame + 2
    }

    fn mode(&self, n: u64) -> Option<Mode> {
        if n < self.full_end() {
            Some(Mode::Full)
        } else if n < self.count_end() {
            Some(Mode::Count)
        } else if self.wrap_range().contains(&n) {
            Some(Mode::Wrap)
        } else {
            None
        }
    }

    /// The first observation after `n` (or the very first one).
    fn next_observation(&self, n: Option<u64>) -> Option<u64> {
        let candidate = n.map_or(0, |n| n + 1);
        if self.mode(candidate).is_some() {
            Some(candidate)
        } else {
            let wrap = self.wrap_range();
            (candidate < wrap.start).then_some(wrap.start)
        }
    }

    fn read_color(&self, bench: &Bench<'_>, n: u64) -> Result<Color, VerifyError> {
        Ok(Color::rgb(
            bench.read_driven_at(&self.signals.red, n)?,
            bench.read_driven_at(&self.signals.green, n)?,
            bench.read_driven_at(&self.signals.blue, n)?,
        ))
    }

    /// Fails on a counted pixel that belongs to no class. The first channel
    /// differing from the declared colour is reported, or from the closest
    /// class where nothing is declared.
    fn reject_unclassified(
        &self,
        bench: &Bench<'_>,
        observed: Color,
        n: u64,
    ) -> Result<(), VerifyError> {
        let declared = self
            .model
            .color_position()
            .and_then(|pos| self.checker.expected_color(pos))
            .filter(|c| *c != observed);
        let Some(reference) = declared.or_else(|| self.counter.nearest(observed)) else {
            return Ok(());
        };
        bench.expect_at(&self.signals.red, reference.red, n)?;
        bench.expect_at(&self.signals.green, reference.green, n)?;
        bench.expect_at(&self.signals.blue, reference.blue, n)
    }

    fn observe(&mut self, bench: &Bench<'_>, mode: Mode) -> Result<(), VerifyError> {
        let n = self.model.elapsed();
        if let Some((hsync, vsync)) = self.model.expected_sync() {
            bench.expect_at(&self.signals.hsync, hsync, n)?;
            bench.expect_at(&self.signals.vsync, vsync, n)?;
        }

        match mode {
            Mode::Full | Mode::Wrap => {
                if mode == Mode::Full && self.model.in_color_shadow() {
                    return Ok(());
                }
                let expected = self
                    .model
                    .color_position()
                    .and_then(|pos| self.checker.expected_color(pos));
                if let Some(color) = expected {
                    bench.expect_at(&self.signals.red, color.red, n)?;
                    bench.expect_at(&self.signals.green, color.green, n)?;
                    bench.expect_at(&self.signals.blue, color.blue, n)?;
                }
            }
            Mode::Count => {
                let pos = self.model.position();
                let geometry = self.model.geometry();
                if !self.model.in_color_shadow() && geometry.is_visible(pos) {
                    let observed = self.read_color(bench, n)?;
                    if !self.counter.classify(observed) {
                        self.reject_unclassified(bench, observed, n)?;
                    }
                }
            }
        }
        Ok(())
    }
}

impl Procedure for FrameCheck {
    type Output = FrameReport;

    fn resume<'p>(
        &'p mut self,
        bench: &mut Bench<'_>,
    ) -> Result<Step<'p, FrameReport>, VerifyError> {
        let current = if self.started {
            let n = self.model.elapsed();
            if let Some(mode) = self.mode(n) {
                self.observe(bench, mode)?;
                self.observations += 1;
            }
            if n + 1 == self.count_end() && self.plan.count_lines > 0 {
                self.counter.verify(&self.plan.expected_counts, n)?;
                tracing::info!(counts = ?self.counter.counts(), "counted lines match");
            }
            if self.model.position().h == 0 {
                tracing::debug!(line = self.model.position().v, cycle = n, "frame line");
            }
            Some(n)
        } else {
            None
        };

        let Some(next) = self.next_observation(current) else {
            return Ok(Step::Done(FrameReport {
                observations: self.observations,
                counts: self.counter.counts().clone(),
            }));
        };

        // The first observation needs one edge; later ones need the gap.
        let edges = match current {
            Some(n) => next - n,
            None => next + 1,
        };
        if edges > 1 {
            tracing::info!(from = next - edges + 1, to = next, "skipping to frame wrap");
        }
        self.model.advance(next - self.model.elapsed());
        self.started = true;
        Ok(Step::Wait(Trigger::ClockCycles {
            clock: &self.clock,
            count: edges,
        }))
    }
}
