//! Builds the standard suite from a [`BenchConfig`].
//!
//! Three scenarios, run in this order: `reset` (every output driven after
//! reset), `first_frame` (VGA raster of the first frame and the wrap into
//! the second) and `protocol` (UART, strobe and shift-register traffic).

use std::rc::Rc;

use vigil_common::Logic;
use vigil_config::{BenchConfig, ConfigError, NamedColor, PatternConfig, VgaConfig};

use crate::frame::{FramePlan, VgaSignals};
use crate::harness::HarnessSpec;
use crate::pixel::{Bands, Bricks, Color, PixelChecker, Solid};
use crate::scenario::{FrameScenario, ProtocolScenario, ProtocolStep, ResetScenario, Scenario};
use crate::serial::{SerialSignals, SerialTransaction};
use crate::suite::Suite;
use crate::timing::{FrameGeometry, RegistrationDelays};
use crate::uart::UartTiming;

/// Name of the reset scenario.
pub const RESET: &str = "reset";
/// Name of the first-frame scenario.
pub const FIRST_FRAME: &str = "first_frame";
/// Name of the protocol scenario.
pub const PROTOCOL: &str = "protocol";

/// Clock, reset, idle levels and wait bounds.
pub fn harness_from_config(config: &BenchConfig) -> Result<HarnessSpec, ConfigError> {
    let timing = vigil_config::resolve_timing(config)?;
    let s = &config.signals;

    let mut idle_drives: Vec<(String, Logic)> = s
        .buttons
        .iter()
        .map(|b| (b.clone(), Logic::Zero))
        .collect();
    idle_drives.push((s.uart_rx.clone(), Logic::One));
    idle_drives.push((s.spi_sdi.clone(), Logic::Zero));
    idle_drives.push((s.spi_irq.clone(), Logic::Zero));

    Ok(HarnessSpec {
        clock: config.clock.port.clone(),
        period: timing.clock_period,
        reset: config.reset.port.clone(),
        reset_cycles: config.reset.cycles,
        reset_settle: timing.reset_settle,
        idle_drives,
        event_timeout: timing.event_timeout,
        scenario_timeout: timing.scenario_timeout,
    })
}

/// The frame dimensions declared in `vga`.
pub fn geometry_from_config(vga: &VgaConfig) -> FrameGeometry {
    FrameGeometry {
        width: vga.width,
        height: vga.height,
        h_front: vga.h_front,
        h_sync: vga.h_sync,
        h_back: vga.h_back,
        v_front: vga.v_front,
        v_sync: vga.v_sync,
        v_back: vga.v_back,
    }
}

fn color(named: NamedColor) -> Color {
    Color::from(named.rgb())
}

/// The declared picture: one pattern per configured band.
pub fn bands_from_config(vga: &VgaConfig) -> Bands {
    vga.bands.iter().fold(Bands::new(), |bands, band| {
        let [start, end] = band.lines;
        match band.pattern {
            PatternConfig::Solid { color: c } => bands.with(start..end, Solid(color(c))),
            PatternConfig::Bricks {
                pitch,
                edge_mortar,
                brick,
                mortar,
            } => bands.with(
                start..end,
                Bricks {
                    pitch,
                    edge_mortar,
                    brick: color(brick),
                    mortar: color(mortar),
                },
            ),
        }
    })
}

fn frame_scenario(config: &BenchConfig) -> FrameScenario {
    let vga = &config.vga;
    let s = &config.signals;
    let geometry = geometry_from_config(vga);
    FrameScenario {
        name: FIRST_FRAME.to_string(),
        geometry,
        delays: RegistrationDelays {
            color: vga.color_delay,
            sync: vga.sync_delay,
        },
        signals: VgaSignals {
            hsync: s.hsync.clone(),
            vsync: s.vsync.clone(),
            red: s.red.clone(),
            green: s.green.clone(),
            blue: s.blue.clone(),
        },
        pixels: PixelChecker::new(geometry, Rc::new(bands_from_config(vga))),
        plan: FramePlan {
            full_lines: vga.full_check_lines,
            count_lines: vga.count_lines,
            classes: vga
                .classes
                .iter()
                .map(|c| (c.name().to_string(), color(*c)))
                .collect(),
            expected_counts: vga.expected_counts.clone(),
        },
    }
}

fn bits(values: &[u8]) -> Vec<bool> {
    values.iter().map(|&b| b != 0).collect()
}

/// The protocol traffic as an ordered step list.
pub fn protocol_steps(config: &BenchConfig) -> Vec<ProtocolStep> {
    let p = &config.protocol;
    let irq = |level| ProtocolStep::Drive {
        signal: config.signals.spi_irq.clone(),
        level,
    };

    let mut steps = vec![
        ProtocolStep::Decode(p.first_byte),
        ProtocolStep::Pulses(p.strobe_pulses),
    ];
    steps.extend(p.burst.iter().map(|&b| ProtocolStep::Decode(b)));
    steps.push(irq(true));
    steps.push(ProtocolStep::Serial(SerialTransaction::zip(
        &bits(&p.serial_drive),
        &bits(&p.serial_expect),
    )));
    steps.push(irq(false));
    steps.push(ProtocolStep::Decode(p.final_byte));
    steps.push(ProtocolStep::Pulses(p.final_pulses));
    steps.push(ProtocolStep::Idle(p.idle_cycles));
    steps
}

/// The three standard scenarios.
pub fn scenarios_from_config(config: &BenchConfig) -> Result<Vec<Box<dyn Scenario>>, ConfigError> {
    let timing = vigil_config::resolve_timing(config)?;
    let s = &config.signals;
    let u = &config.uart;

    let reset = ResetScenario {
        name: RESET.to_string(),
        reset_cycles: config.reset.cycles,
        outputs: [
            &s.hsync, &s.vsync, &s.red, &s.green, &s.blue, &s.speaker, &s.uart_tx, &s.spi_sdo,
            &s.spi_sclk,
        ]
        .into_iter()
        .cloned()
        .collect(),
    };

    let protocol = ProtocolScenario {
        name: PROTOCOL.to_string(),
        uart_line: s.uart_tx.clone(),
        uart: UartTiming {
            bit_cycles: u.bit_cycles,
            sample_offset: u.sample_offset,
            start_settle: timing.uart_start_settle,
            stop_samples: u.stop_samples,
            stop_spacing: u.stop_spacing,
        },
        strobe: s.speaker.clone(),
        serial: SerialSignals {
            sclk: s.spi_sclk.clone(),
            sdi: s.spi_sdi.clone(),
            sdo: s.spi_sdo.clone(),
        },
        steps: protocol_steps(config),
    };

    Ok(vec![
        Box::new(reset),
        Box::new(frame_scenario(config)),
        Box::new(protocol),
    ])
}

/// The standard suite for `config`.
pub fn suite_from_config(config: &BenchConfig) -> Result<Suite, ConfigError> {
    let mut suite = Suite::new(harness_from_config(config)?);
    for scenario in scenarios_from_config(config)? {
        suite.push(scenario);
    }
    Ok(suite)
}
