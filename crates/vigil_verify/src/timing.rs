//! VGA frame timing model.
//!
//! The model owns a single elapsed-cycle counter. The raster position, the
//! horizontal and vertical phases, and the expected sync levels are all
//! derived from that counter on demand, so they can never drift apart.

use std::fmt;

/// Phase of a horizontal line or of a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Pixels (or lines) being displayed.
    Visible,
    /// Blanking before the sync pulse.
    FrontPorch,
    /// The sync pulse; the sync line is driven low.
    Sync,
    /// Blanking after the sync pulse.
    BackPorch,
}

/// Frame dimensions and porch/sync widths.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameGeometry {
    /// Visible pixels per line.
    pub width: u32,
    /// Visible lines per frame.
    pub height: u32,
    /// Horizontal front porch, cycles.
    pub h_front: u32,
    /// Horizontal sync, cycles.
    pub h_sync: u32,
    /// Horizontal back porch, cycles.
    pub h_back: u32,
    /// Vertical front porch, lines.
    pub v_front: u32,
    /// Vertical sync, lines.
    pub v_sync: u32,
    /// Vertical back porch, lines.
    pub v_back: u32,
}

impl FrameGeometry {
    /// 640x480 at 60 Hz on a 25 MHz pixel clock.
    pub const VGA_640X480: FrameGeometry = FrameGeometry {
        width: 640,
        height: 480,
        h_front: 16,
        h_sync: 96,
        h_back: 48,
        v_front: 10,
        v_sync: 2,
        v_back: 33,
    };

    /// Cycles per line.
    pub fn h_total(&self) -> u32 {
        self.width
            .saturating_add(self.h_front)
            .saturating_add(self.h_sync)
            .saturating_add(self.h_back)
    }

    /// Lines per frame.
    pub fn v_total(&self) -> u32 {
        self.height
            .saturating_add(self.v_front)
            .saturating_add(self.v_sync)
            .saturating_add(self.v_back)
    }

    /// Cycles per frame.
    pub fn frame_cycles(&self) -> u64 {
        u64::from(self.h_total()) * u64::from(self.v_total())
    }

    /// Raster position `n` cycles after the start of a frame.
    pub fn position(&self, n: u64) -> RasterPosition {
        let h_total = u64::from(self.h_total().max(1));
        let v_total = u64::from(self.v_total().max(1));
        RasterPosition {
            h: (n % h_total) as u32,
            v: ((n / h_total) % v_total) as u32,
        }
    }

    /// Horizontal phase of column `h`.
    pub fn h_phase(&self, h: u32) -> Phase {
        phase(h, self.width, self.h_front, self.h_sync)
    }

    /// Vertical phase of line `v`.
    pub fn v_phase(&self, v: u32) -> Phase {
        phase(v, self.height, self.v_front, self.v_sync)
    }

    /// Whether both phases are visible at `pos`.
    pub fn is_visible(&self, pos: RasterPosition) -> bool {
        self.h_phase(pos.h) == Phase::Visible && self.v_phase(pos.v) == Phase::Visible
    }

    /// Expected (hsync, vsync) levels at `pos`; low only during sync.
    pub fn sync_levels(&self, pos: RasterPosition) -> (bool, bool) {
        (
            self.h_phase(pos.h) != Phase::Sync,
            self.v_phase(pos.v) != Phase::Sync,
        )
    }
}

fn phase(x: u32, visible: u32, front: u32, sync: u32) -> Phase {
    if x < visible {
        Phase::Visible
    } else if x < visible.saturating_add(front) {
        Phase::FrontPorch
    } else if x < visible.saturating_add(front).saturating_add(sync) {
        Phase::Sync
    } else {
        Phase::BackPorch
    }
}

/// A (column, line) coordinate within the full raster, blanking included.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct RasterPosition {
    /// Column, `0..h_total`.
    pub h: u32,
    /// Line, `0..v_total`.
    pub v: u32,
}

impl fmt::Display for RasterPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.h, self.v)
    }
}

/// Output register depth, in cycles, of each signal group.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RegistrationDelays {
    /// Delay of the colour outputs.
    pub color: u32,
    /// Delay of the sync outputs.
    pub sync: u32,
}

impl Default for RegistrationDelays {
    /// Registered colour, combinational sync.
    fn default() -> Self {
        Self { color: 1, sync: 0 }
    }
}

/// Expected frame outputs as a function of elapsed cycles.
#[derive(Clone, Debug)]
pub struct VgaTimingModel {
    geometry: FrameGeometry,
    delays: RegistrationDelays,
    elapsed: u64,
}

impl VgaTimingModel {
    /// A model positioned at cycle zero.
    pub fn new(geometry: FrameGeometry, delays: RegistrationDelays) -> Self {
        Self {
            geometry,
            delays,
            elapsed: 0,
        }
    }

    /// The frame geometry.
    pub fn geometry(&self) -> &FrameGeometry {
        &self.geometry
    }

    /// The registration delays.
    pub fn delays(&self) -> RegistrationDelays {
        self.delays
    }

    /// Cycles since the first raster position.
    pub fn elapsed(&self) -> u64 {
        self.elapsed
    }

    /// Advances the counter by `cycles`.
    pub fn advance(&mut self, cycles: u64) {
        self.elapsed += cycles;
    }

    /// Raster position of the current cycle.
    pub fn position(&self) -> RasterPosition {
        self.geometry.position(self.elapsed)
    }

    /// Expected (hsync, vsync) at the current cycle, `None` while the sync
    /// pipeline has not filled yet.
    pub fn expected_sync(&self) -> Option<(bool, bool)> {
        let n = self.elapsed.checked_sub(u64::from(self.delays.sync))?;
        Some(self.geometry.sync_levels(self.geometry.position(n)))
    }

    /// The raster position whose colour is visible on the outputs at the
    /// current cycle, `None` while the colour pipeline has not filled yet.
    pub fn color_position(&self) -> Option<RasterPosition> {
        let n = self.elapsed.checked_sub(u64::from(self.delays.color))?;
        Some(self.geometry.position(n))
    }

    /// Whether the current column lies in the colour pipeline's shadow at
    /// the start of a line.
    pub fn in_color_shadow(&self) -> bool {
        self.position().h < self.delays.color
    }
}
