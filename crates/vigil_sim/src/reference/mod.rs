//! Behavioral model of the reference circuit: a single-player squash game
//! with VGA output, a speaker, a UART transmitter and a shift-register port.
//!
//! [`ReferenceDesign`] is the default device under test for the scenario
//! suite. Each [`Fault`] breaks one property so that failing runs can be
//! demonstrated and tested.

mod program;
mod shift;
mod tone;
mod uart;
mod vga;

use std::fmt;
use std::str::FromStr;

use vigil_common::Logic;

use crate::device::{Device, PortDecl, Pins};
use program::{Io, Sequencer};
use shift::ShiftPort;
use tone::Tone;
use uart::UartTx;
use vga::VgaGenerator;

pub use program::{Action, BOOT_CYCLES, GAP_CYCLES};
pub use vga::{picture, Rgb, STRAY_PIXEL};

/// Port names of the reference circuit.
pub mod port {
    /// Main clock.
    pub const CLK: &str = "clk";
    /// Active-low external reset.
    pub const EXT_RESET_N: &str = "ext_reset_n";
    /// Paddle up button.
    pub const UP_KEY: &str = "up_key";
    /// Paddle down button.
    pub const DOWN_KEY: &str = "down_key";
    /// New game button.
    pub const NEW_GAME: &str = "new_game";
    /// Pause switch.
    pub const PAUSE: &str = "pause";
    /// UART receive line.
    pub const UART_RX: &str = "uart_rx";
    /// Shift-register data in.
    pub const SPI_SDI: &str = "spi_sdi";
    /// Shift-register transfer request.
    pub const SPI_IRQ: &str = "spi_irq";
    /// Horizontal sync.
    pub const HSYNC: &str = "hsync";
    /// Vertical sync.
    pub const VSYNC: &str = "vsync";
    /// Red colour bit.
    pub const RED: &str = "red";
    /// Green colour bit.
    pub const GREEN: &str = "green";
    /// Blue colour bit.
    pub const BLUE: &str = "blue";
    /// Speaker strobe.
    pub const SPEAKER: &str = "speaker";
    /// UART transmit line.
    pub const UART_TX: &str = "uart_tx";
    /// Shift-register data out.
    pub const SPI_SDO: &str = "spi_sdo";
    /// Shift-register subordinate clock.
    pub const SPI_SCLK: &str = "spi_sclk";

    /// Inputs, clock and reset included.
    pub const INPUTS: [&str; 9] = [
        CLK,
        EXT_RESET_N,
        UP_KEY,
        DOWN_KEY,
        NEW_GAME,
        PAUSE,
        UART_RX,
        SPI_SDI,
        SPI_IRQ,
    ];

    /// Outputs, all unknown until the first reset.
    pub const OUTPUTS: [&str; 9] = [
        HSYNC, VSYNC, RED, GREEN, BLUE, SPEAKER, UART_TX, SPI_SDO, SPI_SCLK,
    ];
}

/// A deliberate defect injected into the reference design.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// HSYNC never asserts.
    HsyncStuckHigh,
    /// Colour outputs bypass their output register.
    UnregisteredColor,
    /// The speaker output is never driven.
    UndrivenSpeaker,
    /// One data bit of every UART frame is inverted.
    UartBitFlip {
        /// Data bit index, 0 = LSB.
        bit: u8,
    },
    /// One bit of the shift-port output is inverted.
    SerialBitFlip {
        /// Transfer index, 0 = first bit shifted out.
        index: u8,
    },
    /// The speaker output stays low.
    SilentStrobe,
    /// Every frame has one extra blank line.
    LongFrame,
    /// Blue lights up at [`STRAY_PIXEL`] in every frame.
    StrayBlue,
    /// The blue output is never driven.
    UndrivenBlue,
    /// The idle UART line dips low for zero time on every cycle.
    UartIdleGlitch,
    /// The UART stop bit is sent low.
    UartLowStop,
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fault::HsyncStuckHigh => write!(f, "hsync-stuck-high"),
            Fault::UnregisteredColor => write!(f, "unregistered-color"),
            Fault::UndrivenSpeaker => write!(f, "undriven-speaker"),
            Fault::UartBitFlip { bit } => write!(f, "uart-bit-flip:{bit}"),
            Fault::SerialBitFlip { index } => write!(f, "serial-bit-flip:{index}"),
            Fault::SilentStrobe => write!(f, "silent-strobe"),
            Fault::LongFrame => write!(f, "long-frame"),
            Fault::StrayBlue => write!(f, "stray-blue"),
            Fault::UndrivenBlue => write!(f, "undriven-blue"),
            Fault::UartIdleGlitch => write!(f, "uart-idle-glitch"),
            Fault::UartLowStop => write!(f, "uart-low-stop"),
        }
    }
}

/// Error returned for an unrecognized fault name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown fault '{input}' (expected one of: hsync-stuck-high, unregistered-color, undriven-speaker, uart-bit-flip:<0-7>, serial-bit-flip:<0-7>, silent-strobe, long-frame, stray-blue, undriven-blue, uart-idle-glitch, uart-low-stop)")]
pub struct ParseFaultError {
    /// The rejected input.
    pub input: String,
}

impl FromStr for Fault {
    type Err = ParseFaultError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseFaultError {
            input: s.to_string(),
        };
        let (name, arg) = match s.trim().split_once(':') {
            Some((name, arg)) => (name, Some(arg)),
            None => (s.trim(), None),
        };
        let bit = || -> Result<u8, ParseFaultError> {
            arg.and_then(|a| a.parse::<u8>().ok())
                .filter(|b| *b < 8)
                .ok_or_else(err)
        };
        match (name, arg) {
            ("hsync-stuck-high", None) => Ok(Fault::HsyncStuckHigh),
            ("unregistered-color", None) => Ok(Fault::UnregisteredColor),
            ("undriven-speaker", None) => Ok(Fault::UndrivenSpeaker),
            ("silent-strobe", None) => Ok(Fault::SilentStrobe),
            ("long-frame", None) => Ok(Fault::LongFrame),
            ("stray-blue", None) => Ok(Fault::StrayBlue),
            ("undriven-blue", None) => Ok(Fault::UndrivenBlue),
            ("uart-idle-glitch", None) => Ok(Fault::UartIdleGlitch),
            ("uart-low-stop", None) => Ok(Fault::UartLowStop),
            ("uart-bit-flip", Some(_)) => Ok(Fault::UartBitFlip { bit: bit()? }),
            ("serial-bit-flip", Some(_)) => Ok(Fault::SerialBitFlip { index: bit()? }),
            _ => Err(err()),
        }
    }
}

/// Parameters of the reference design.
#[derive(Debug, Clone)]
pub struct ReferenceConfig {
    /// Visible pixels per line.
    pub h_visible: u32,
    /// Horizontal front porch in cycles.
    pub h_front: u32,
    /// Horizontal sync pulse in cycles.
    pub h_sync: u32,
    /// Horizontal back porch in cycles.
    pub h_back: u32,
    /// Visible lines per frame.
    pub v_visible: u32,
    /// Vertical front porch in lines.
    pub v_front: u32,
    /// Vertical sync pulse in lines.
    pub v_sync: u32,
    /// Vertical back porch in lines.
    pub v_back: u32,
    /// Brick pitch of the wall, in pixels.
    pub brick_pitch: u32,
    /// Mortar on each side of a brick, in pixels.
    pub edge_mortar: u32,
    /// Speaker strobe period in cycles.
    pub tone_period: u32,
    /// Speaker strobe width in cycles.
    pub tone_width: u32,
    /// UART bit period in cycles.
    pub uart_bit_cycles: u32,
    /// Half period of the shift-port clock, in cycles.
    pub shift_half_period: u32,
    /// Traffic executed after reset.
    pub program: Vec<Action>,
    /// Injected defects.
    pub faults: Vec<Fault>,
}

impl Default for ReferenceConfig {
    fn default() -> Self {
        Self {
            h_visible: 640,
            h_front: 16,
            h_sync: 96,
            h_back: 48,
            v_visible: 480,
            v_front: 10,
            v_sync: 2,
            v_back: 33,
            brick_pitch: 32,
            edge_mortar: 2,
            tone_period: 1500,
            tone_width: 4,
            uart_bit_cycles: 9,
            shift_half_period: 4,
            program: Action::default_program(),
            faults: Vec::new(),
        }
    }
}

impl ReferenceConfig {
    /// Cycles per line.
    pub fn h_total(&self) -> u32 {
        self.h_visible + self.h_front + self.h_sync + self.h_back
    }

    /// Lines per frame.
    pub fn v_total(&self) -> u32 {
        self.v_visible + self.v_front + self.v_sync + self.v_back
    }

    /// Whether `fault` is injected.
    pub fn has(&self, fault: Fault) -> bool {
        self.faults.contains(&fault)
    }

    fn has_long_frame(&self) -> bool {
        self.has(Fault::LongFrame)
    }

    fn uart_flip(&self) -> Option<u8> {
        self.faults.iter().find_map(|f| match f {
            Fault::UartBitFlip { bit } => Some(*bit),
            _ => None,
        })
    }

    fn serial_flip(&self) -> Option<u8> {
        self.faults.iter().find_map(|f| match f {
            Fault::SerialBitFlip { index } => Some(*index),
            _ => None,
        })
    }
}

/// The reference circuit as a [`Device`].
#[derive(Debug, Clone, Default)]
pub struct ReferenceDesign {
    config: ReferenceConfig,
    vga: VgaGenerator,
    tone: Tone,
    uart: UartTx,
    shift: ShiftPort,
    sequencer: Sequencer,
}

impl ReferenceDesign {
    /// Creates the design in its power-up state.
    pub fn new(config: ReferenceConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// The design parameters.
    pub fn config(&self) -> &ReferenceConfig {
        &self.config
    }

    fn write_outputs(&self, pins: &mut Pins<'_>) {
        let cfg = &self.config;
        let hsync = self.vga.hsync(cfg) || cfg.has(Fault::HsyncStuckHigh);
        let (r, g, b) = self.vga.rgb(cfg, cfg.has(Fault::UnregisteredColor));
        pins.write(port::HSYNC, Logic::from(hsync));
        pins.write(port::VSYNC, Logic::from(self.vga.vsync(cfg)));
        pins.write(port::RED, Logic::from(r));
        pins.write(port::GREEN, Logic::from(g));
        if !cfg.has(Fault::UndrivenBlue) {
            pins.write(port::BLUE, Logic::from(b));
        }
        if !cfg.has(Fault::UndrivenSpeaker) {
            let high = self.tone.is_high(cfg.tone_period, cfg.tone_width)
                && !cfg.has(Fault::SilentStrobe);
            pins.write(port::SPEAKER, Logic::from(high));
        }
        let tx = self.uart.line(cfg.uart_flip(), cfg.has(Fault::UartLowStop));
        if tx && self.uart.is_idle() && cfg.has(Fault::UartIdleGlitch) {
            pins.write(port::UART_TX, Logic::Zero);
        }
        pins.write(port::UART_TX, Logic::from(tx));
        pins.write(port::SPI_SDO, Logic::from(self.shift.sdo(cfg.serial_flip())));
        pins.write(port::SPI_SCLK, Logic::from(self.shift.sclk()));
    }
}

impl Device for ReferenceDesign {
    fn name(&self) -> &str {
        "solo_squash"
    }

    fn ports(&self) -> Vec<PortDecl> {
        port::INPUTS
            .iter()
            .map(|name| PortDecl::input(name))
            .chain(
                port::OUTPUTS
                    .iter()
                    .map(|name| PortDecl::output(name, Logic::X)),
            )
            .collect()
    }

    fn clock_port(&self) -> &str {
        port::CLK
    }

    fn on_rising_edge(&mut self, pins: &mut Pins<'_>) {
        if pins.read(port::EXT_RESET_N) != Logic::One {
            self.vga.reset();
            self.tone.reset();
            self.uart.reset();
            self.shift.reset();
            self.sequencer.reset();
        } else {
            let cfg = &self.config;
            self.vga.step(cfg);
            self.tone.step(cfg.tone_period, cfg.tone_width);
            self.uart.step(cfg.uart_bit_cycles);
            self.shift
                .step(cfg.shift_half_period, pins.read(port::SPI_SDI) == Logic::One);
            self.sequencer.step(
                &cfg.program,
                Io {
                    uart: &mut self.uart,
                    shift: &mut self.shift,
                    strobe: self.tone.rose(),
                    irq: pins.read(port::SPI_IRQ) == Logic::One,
                },
            );
        }
        self.write_outputs(pins);
    }
}
