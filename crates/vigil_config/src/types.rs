//! Configuration types deserialized from `vigil.toml`.
//!
//! Every section has defaults matching the reference bench (640x480 VGA at
//! 25 MHz, 9-cycle UART bits), so an empty file is a complete configuration.

use serde::Deserialize;
use std::collections::BTreeMap;

/// The top-level bench configuration parsed from `vigil.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BenchConfig {
    /// Bench metadata.
    pub bench: BenchMeta,
    /// Primary clock definition.
    pub clock: ClockConfig,
    /// External reset definition.
    pub reset: ResetConfig,
    /// Names of the circuit's signals.
    pub signals: SignalMap,
    /// VGA frame geometry and pixel content.
    pub vga: VgaConfig,
    /// UART bit timing.
    pub uart: UartConfig,
    /// Expected traffic of the protocol scenario.
    pub protocol: ProtocolConfig,
    /// Wait bounds.
    pub limits: LimitsConfig,
}

/// Bench metadata.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BenchMeta {
    /// Bench name, used in reports.
    pub name: String,
    /// Free-form description.
    pub description: String,
}

impl Default for BenchMeta {
    fn default() -> Self {
        Self {
            name: "solo_squash".to_string(),
            description: String::new(),
        }
    }
}

/// The primary clock: which port to toggle and how fast.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    /// The clock input port.
    pub port: String,
    /// Clock frequency as a string (e.g. `"25MHz"`), parsed to
    /// [`Frequency`](vigil_common::Frequency).
    pub frequency: String,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            port: "clk".to_string(),
            frequency: "25MHz".to_string(),
        }
    }
}

/// The active-low external reset.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ResetConfig {
    /// The reset input port (active low).
    pub port: String,
    /// Number of clock cycles the reset is held asserted.
    pub cycles: u64,
    /// Settle delay after release, e.g. `"10ns"`.
    pub settle: String,
}

impl Default for ResetConfig {
    fn default() -> Self {
        Self {
            port: "ext_reset_n".to_string(),
            cycles: 10,
            settle: "10ns".to_string(),
        }
    }
}

/// Signal names of the circuit under test.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SignalMap {
    /// Horizontal sync (active low).
    pub hsync: String,
    /// Vertical sync (active low).
    pub vsync: String,
    /// Red colour bit.
    pub red: String,
    /// Green colour bit.
    pub green: String,
    /// Blue colour bit.
    pub blue: String,
    /// Audio strobe output.
    pub speaker: String,
    /// Asynchronous serial output of the circuit.
    pub uart_tx: String,
    /// Asynchronous serial input of the circuit.
    pub uart_rx: String,
    /// Shift-register data into the circuit.
    pub spi_sdi: String,
    /// Shift-register data out of the circuit.
    pub spi_sdo: String,
    /// Subordinate clock of the shift-register interface.
    pub spi_sclk: String,
    /// Interrupt / transfer request line into the circuit.
    pub spi_irq: String,
    /// Button and control inputs, driven low while idle.
    pub buttons: Vec<String>,
}

impl Default for SignalMap {
    fn default() -> Self {
        Self {
            hsync: "hsync".to_string(),
            vsync: "vsync".to_string(),
            red: "red".to_string(),
            green: "green".to_string(),
            blue: "blue".to_string(),
            speaker: "speaker".to_string(),
            uart_tx: "uart_tx".to_string(),
            uart_rx: "uart_rx".to_string(),
            spi_sdi: "spi_sdi".to_string(),
            spi_sdo: "spi_sdo".to_string(),
            spi_sclk: "spi_sclk".to_string(),
            spi_irq: "spi_irq".to_string(),
            buttons: ["up_key", "down_key", "new_game", "pause"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// VGA geometry, registration delays, and declared content.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VgaConfig {
    /// Visible pixels per line.
    pub width: u32,
    /// Visible lines per frame.
    pub height: u32,
    /// Horizontal front porch, in cycles.
    pub h_front: u32,
    /// Horizontal sync pulse, in cycles.
    pub h_sync: u32,
    /// Horizontal back porch, in cycles.
    pub h_back: u32,
    /// Vertical front porch, in lines.
    pub v_front: u32,
    /// Vertical sync pulse, in lines.
    pub v_sync: u32,
    /// Vertical back porch, in lines.
    pub v_back: u32,
    /// Cycles between raster position and observed colour outputs.
    pub color_delay: u32,
    /// Cycles between raster position and observed sync outputs.
    pub sync_delay: u32,
    /// Lines checked pixel by pixel at the start of the first frame.
    pub full_check_lines: u32,
    /// Lines after the fully checked ones that are classified and counted.
    pub count_lines: u32,
    /// Declared pixel content, by line band.
    pub bands: Vec<BandConfig>,
    /// Colour categories for the counted lines.
    pub classes: Vec<NamedColor>,
    /// Expected per-category totals over the counted lines, keyed by colour
    /// name.
    pub expected_counts: BTreeMap<String, u64>,
}

impl Default for VgaConfig {
    fn default() -> Self {
        let mut expected_counts = BTreeMap::new();
        expected_counts.insert("yellow".to_string(), 158);
        expected_counts.insert("green".to_string(), 1120);
        Self {
            width: 640,
            height: 480,
            h_front: 16,
            h_sync: 96,
            h_back: 48,
            v_front: 10,
            v_sync: 2,
            v_back: 33,
            color_delay: 1,
            sync_delay: 0,
            full_check_lines: 2,
            count_lines: 2,
            bands: vec![
                BandConfig {
                    lines: [0, 2],
                    pattern: PatternConfig::Solid {
                        color: NamedColor::Yellow,
                    },
                },
                BandConfig {
                    lines: [2, 4],
                    pattern: PatternConfig::Bricks {
                        pitch: 32,
                        edge_mortar: 2,
                        brick: NamedColor::Green,
                        mortar: NamedColor::Yellow,
                    },
                },
            ],
            classes: vec![NamedColor::Yellow, NamedColor::Green],
            expected_counts,
        }
    }
}

/// A horizontal band of lines `[lines[0], lines[1])` sharing one pattern.
#[derive(Debug, Clone, Deserialize)]
pub struct BandConfig {
    /// Half-open line range.
    pub lines: [u32; 2],
    /// Content of the band.
    pub pattern: PatternConfig,
}

/// Declared content of a band.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PatternConfig {
    /// One colour across the whole visible width.
    Solid {
        /// The colour.
        color: NamedColor,
    },
    /// Vertical brick/mortar stripes.
    ///
    /// Each `pitch`-wide cell has `edge_mortar` mortar pixels on both edges,
    /// so mortar between two bricks is `2 * edge_mortar` wide.
    Bricks {
        /// Width of one brick cell including its mortar.
        pitch: u32,
        /// Mortar pixels on each edge of a cell.
        edge_mortar: u32,
        /// Brick colour.
        brick: NamedColor,
        /// Mortar colour.
        mortar: NamedColor,
    },
}

/// The eight colours expressible with one bit per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NamedColor {
    /// 000
    Black,
    /// 100
    Red,
    /// 010
    Green,
    /// 110
    Yellow,
    /// 001
    Blue,
    /// 101
    Magenta,
    /// 011
    Cyan,
    /// 111
    White,
}

impl NamedColor {
    /// Returns the `(red, green, blue)` channel levels.
    pub fn rgb(self) -> (bool, bool, bool) {
        match self {
            NamedColor::Black => (false, false, false),
            NamedColor::Red => (true, false, false),
            NamedColor::Green => (false, true, false),
            NamedColor::Yellow => (true, true, false),
            NamedColor::Blue => (false, false, true),
            NamedColor::Magenta => (true, false, true),
            NamedColor::Cyan => (false, true, true),
            NamedColor::White => (true, true, true),
        }
    }

    /// Looks a colour up by its lowercase name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }

    /// All eight colours.
    pub const ALL: [NamedColor; 8] = [
        NamedColor::Black,
        NamedColor::Red,
        NamedColor::Green,
        NamedColor::Yellow,
        NamedColor::Blue,
        NamedColor::Magenta,
        NamedColor::Cyan,
        NamedColor::White,
    ];

    /// Lowercase name as written in `vigil.toml`.
    pub fn name(self) -> &'static str {
        match self {
            NamedColor::Black => "black",
            NamedColor::Red => "red",
            NamedColor::Green => "green",
            NamedColor::Yellow => "yellow",
            NamedColor::Blue => "blue",
            NamedColor::Magenta => "magenta",
            NamedColor::Cyan => "cyan",
            NamedColor::White => "white",
        }
    }
}

/// UART bit timing, all in primary clock cycles.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UartConfig {
    /// Clock cycles per serial bit (the baud-to-clock ratio).
    pub bit_cycles: u32,
    /// Cycle within each bit window at which the line is sampled (1-based).
    pub sample_offset: u32,
    /// Settle delay after the start edge before confirming the start bit.
    pub start_settle: String,
    /// Number of samples taken inside the stop bit.
    pub stop_samples: u32,
    /// Cycles between consecutive stop-bit samples.
    pub stop_spacing: u32,
}

impl Default for UartConfig {
    fn default() -> Self {
        Self {
            bit_cycles: 9,
            sample_offset: 2,
            start_settle: "10ns".to_string(),
            stop_samples: 2,
            stop_spacing: 4,
        }
    }
}

/// Traffic expected during the protocol scenario.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProtocolConfig {
    /// First UART byte after reset.
    pub first_byte: u8,
    /// Strobe pulses awaited after the first byte.
    pub strobe_pulses: u32,
    /// UART bytes sent back to back after the pulses.
    pub burst: Vec<u8>,
    /// Bits driven into the shift-register port, one per subordinate clock.
    pub serial_drive: Vec<u8>,
    /// Bits expected out of the shift-register port, one per subordinate clock.
    pub serial_expect: Vec<u8>,
    /// UART byte expected after the serial transaction.
    pub final_byte: u8,
    /// Strobe pulses awaited at the end.
    pub final_pulses: u32,
    /// Stimulus-free cycles run at the very end.
    pub idle_cycles: u64,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            first_byte: 0x57,
            strobe_pulses: 3,
            burst: vec![0x16, 0x34],
            serial_drive: vec![1, 1, 0, 0, 0, 0, 1, 1],
            serial_expect: vec![1, 0, 1, 0, 0, 1, 0, 1],
            final_byte: 0xC3,
            final_pulses: 1,
            idle_cycles: 1000,
        }
    }
}

/// Wait bounds.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Longest wait for an expected edge on a non-clock signal.
    pub event_timeout: String,
    /// Optional overall bound per scenario, in simulation time.
    pub scenario_timeout: Option<String>,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            event_timeout: "2ms".to_string(),
            scenario_timeout: None,
        }
    }
}
