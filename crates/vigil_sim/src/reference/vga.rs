//! Raster scan generator with registered colour and combinational sync.

use super::{Fault, ReferenceConfig};

/// Lines of solid yellow above and below the brick wall.
const BORDER_LINES: u32 = 2;
/// Height of the brick wall in lines.
const WALL_LINES: u32 = 32;

/// Picture `(column, line)` lit blue by [`Fault::StrayBlue`].
pub const STRAY_PIXEL: (u32, u32) = (100, 2);

/// Red, green and blue levels.
pub type Rgb = (bool, bool, bool);

const BLACK: Rgb = (false, false, false);
const YELLOW: Rgb = (true, true, false);
const GREEN: Rgb = (false, true, false);

/// Horizontal/vertical counters plus the colour register.
#[derive(Debug, Clone, Default)]
pub struct VgaGenerator {
    h: u32,
    v: u32,
    rgb: Rgb,
}

impl VgaGenerator {
    /// Returns counters and colour to their reset state.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Advances one pixel clock.
    pub fn step(&mut self, cfg: &ReferenceConfig) {
        let lines = cfg.v_total() + u32::from(cfg.has_long_frame());
        self.rgb = picture(cfg, self.h, self.v);
        if (self.h, self.v) == STRAY_PIXEL && cfg.has(Fault::StrayBlue) {
            self.rgb.2 = true;
        }
        self.h += 1;
        if self.h == cfg.h_total() {
            self.h = 0;
            self.v = (self.v + 1) % lines;
        }
    }

    /// The colour outputs: the register, or the raw picture when the
    /// register is bypassed.
    pub fn rgb(&self, cfg: &ReferenceConfig, bypass_register: bool) -> Rgb {
        if bypass_register {
            picture(cfg, self.h, self.v)
        } else {
            self.rgb
        }
    }

    /// Active-low horizontal sync decoded from the current counter.
    pub fn hsync(&self, cfg: &ReferenceConfig) -> bool {
        let start = cfg.h_visible + cfg.h_front;
        !(start..start + cfg.h_sync).contains(&self.h)
    }

    /// Active-low vertical sync decoded from the current counter.
    pub fn vsync(&self, cfg: &ReferenceConfig) -> bool {
        let start = cfg.v_visible + cfg.v_front;
        !(start..start + cfg.v_sync).contains(&self.v)
    }
}

/// The picture the game draws before any ball or paddle moves.
pub fn picture(cfg: &ReferenceConfig, h: u32, v: u32) -> Rgb {
    if h >= cfg.h_visible || v >= cfg.v_visible {
        return BLACK;
    }
    let wall_end = BORDER_LINES + WALL_LINES;
    if v < BORDER_LINES || (wall_end..wall_end + BORDER_LINES).contains(&v) {
        YELLOW
    } else if v < wall_end {
        let x = h % cfg.brick_pitch;
        if x < cfg.edge_mortar || x >= cfg.brick_pitch - cfg.edge_mortar {
            YELLOW
        } else {
            GREEN
        }
    } else {
        BLACK
    }
}
