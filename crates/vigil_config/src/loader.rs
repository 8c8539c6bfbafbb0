//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::resolve::resolve_timing;
use crate::types::{BenchConfig, NamedColor, PatternConfig};
use std::path::Path;

/// The smallest reset window, in clock cycles, the harness accepts.
pub const MIN_RESET_CYCLES: u64 = 1;

/// File name looked up by [`load_config`].
pub const CONFIG_FILE_NAME: &str = "vigil.toml";

/// Loads and validates `vigil.toml` from a bench directory.
pub fn load_config(bench_dir: &Path) -> Result<BenchConfig, ConfigError> {
    load_config_file(&bench_dir.join(CONFIG_FILE_NAME))
}

/// Loads and validates a configuration file at an explicit path.
pub fn load_config_file(path: &Path) -> Result<BenchConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    load_config_from_str(&content)
}

/// Parses and validates a configuration from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn load_config_from_str(content: &str) -> Result<BenchConfig, ConfigError> {
    let config: BenchConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Validates that names are present and timing values are mutually consistent.
pub fn validate_config(config: &BenchConfig) -> Result<(), ConfigError> {
    validate_names(config)?;

    let timing = resolve_timing(config)?;
    if timing.reset_settle >= timing.clock_period {
        return Err(invalid("reset.settle must be shorter than one clock period"));
    }
    if timing.uart_start_settle >= timing.clock_period {
        return Err(invalid(
            "uart.start_settle must be shorter than one clock period",
        ));
    }
    if config.reset.cycles < MIN_RESET_CYCLES {
        return Err(invalid(format!(
            "reset.cycles must be at least {MIN_RESET_CYCLES}"
        )));
    }

    validate_vga(config)?;
    validate_uart(config)?;
    validate_protocol(config)
}

fn validate_names(config: &BenchConfig) -> Result<(), ConfigError> {
    let s = &config.signals;
    let required = [
        ("clock.port", &config.clock.port),
        ("reset.port", &config.reset.port),
        ("signals.hsync", &s.hsync),
        ("signals.vsync", &s.vsync),
        ("signals.red", &s.red),
        ("signals.green", &s.green),
        ("signals.blue", &s.blue),
        ("signals.speaker", &s.speaker),
        ("signals.uart_tx", &s.uart_tx),
        ("signals.uart_rx", &s.uart_rx),
        ("signals.spi_sdi", &s.spi_sdi),
        ("signals.spi_sdo", &s.spi_sdo),
        ("signals.spi_sclk", &s.spi_sclk),
        ("signals.spi_irq", &s.spi_irq),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            return Err(ConfigError::MissingField(field.to_string()));
        }
    }
    Ok(())
}

fn validate_vga(config: &BenchConfig) -> Result<(), ConfigError> {
    let vga = &config.vga;
    if vga.width == 0 || vga.height == 0 || vga.h_sync == 0 || vga.v_sync == 0 {
        return Err(invalid(
            "vga.width, vga.height, vga.h_sync and vga.v_sync must be non-zero",
        ));
    }
    let h_total = [vga.width, vga.h_front, vga.h_sync, vga.h_back]
        .into_iter()
        .try_fold(0u32, u32::checked_add)
        .ok_or_else(|| invalid("vga line length overflows 32 bits"))?;
    [vga.height, vga.v_front, vga.v_sync, vga.v_back]
        .into_iter()
        .try_fold(0u32, u32::checked_add)
        .ok_or_else(|| invalid("vga frame height overflows 32 bits"))?;
    if vga.color_delay >= vga.width || vga.sync_delay >= h_total {
        return Err(invalid("vga registration delays must be shorter than a line"));
    }
    if u64::from(vga.full_check_lines) + u64::from(vga.count_lines) > u64::from(vga.height) {
        return Err(invalid(
            "vga.full_check_lines + vga.count_lines exceeds vga.height",
        ));
    }

    for band in &vga.bands {
        let [start, end] = band.lines;
        if start >= end || end > vga.height {
            return Err(invalid(format!(
                "vga band [{start}, {end}) is empty or outside the visible area"
            )));
        }
        if let PatternConfig::Bricks {
            pitch, edge_mortar, ..
        } = band.pattern
        {
            if pitch == 0 || 2 * u64::from(edge_mortar) > u64::from(pitch) {
                return Err(invalid(format!(
                    "vga band [{start}, {end}): brick pitch {pitch} cannot hold mortar {edge_mortar}"
                )));
            }
        }
    }
    // Lines checked pixel by pixel, plus line 0 for the frame-wrap check,
    // need a declared pattern.
    for line in 0..vga.full_check_lines.max(1) {
        if !vga
            .bands
            .iter()
            .any(|b| b.lines[0] <= line && line < b.lines[1])
        {
            return Err(invalid(format!("vga line {line} has no declared pattern")));
        }
    }

    if vga.count_lines > 0 && vga.classes.is_empty() {
        return Err(invalid("vga.count_lines needs at least one colour class"));
    }
    for name in vga.expected_counts.keys() {
        match NamedColor::from_name(name) {
            Some(color) if vga.classes.contains(&color) => {}
            Some(_) => {
                return Err(invalid(format!(
                    "vga.expected_counts.{name} is not one of vga.classes"
                )))
            }
            None => return Err(invalid(format!("unknown colour '{name}'"))),
        }
    }
    if vga.count_lines > 0 {
        if let Some(missing) = vga
            .classes
            .iter()
            .find(|c| !vga.expected_counts.contains_key(c.name()))
        {
            return Err(invalid(format!(
                "vga class '{}' has no entry in vga.expected_counts",
                missing.name()
            )));
        }
    }
    Ok(())
}

fn validate_uart(config: &BenchConfig) -> Result<(), ConfigError> {
    let uart = &config.uart;
    if uart.bit_cycles < 2 {
        return Err(invalid("uart.bit_cycles must be at least 2"));
    }
    if uart.sample_offset == 0 || uart.sample_offset > uart.bit_cycles {
        return Err(invalid(format!(
            "uart.sample_offset must be within 1..={}",
            uart.bit_cycles
        )));
    }
    if uart.stop_samples == 0 {
        return Err(invalid("uart.stop_samples must be at least 1"));
    }
    if uart.stop_samples > 1 && uart.stop_spacing == 0 {
        return Err(invalid("uart.stop_spacing must be non-zero"));
    }
    let last = u64::from(uart.sample_offset)
        + u64::from(uart.stop_samples - 1) * u64::from(uart.stop_spacing);
    if last > u64::from(uart.bit_cycles) {
        return Err(invalid(format!(
            "uart stop samples reach cycle {last}, past the {}-cycle stop bit",
            uart.bit_cycles
        )));
    }
    Ok(())
}

fn validate_protocol(config: &BenchConfig) -> Result<(), ConfigError> {
    let p = &config.protocol;
    if p.serial_drive.len() != p.serial_expect.len() {
        return Err(invalid(format!(
            "protocol.serial_drive has {} bits but protocol.serial_expect has {}",
            p.serial_drive.len(),
            p.serial_expect.len()
        )));
    }
    if p.serial_drive.is_empty() {
        return Err(invalid("protocol serial transaction is empty"));
    }
    if p.serial_drive
        .iter()
        .chain(&p.serial_expect)
        .any(|&b| b > 1)
    {
        return Err(invalid("protocol serial bits must be 0 or 1"));
    }
    Ok(())
}

fn invalid(msg: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError(msg.into())
}
