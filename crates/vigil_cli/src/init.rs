//! `vigil init`: writes a `vigil.toml` describing the reference bench.

use std::fs;
use std::path::{Path, PathBuf};

use vigil_config::CONFIG_FILE_NAME;

/// Default bench configuration, every value spelled out.
const TEMPLATE: &str = r#"[bench]
name = "solo_squash"
description = "VGA raster, speaker strobe, UART and shift-register traffic"

[clock]
port = "clk"
frequency = "25MHz"

[reset]
port = "ext_reset_n"
cycles = 10
settle = "10ns"

[signals]
hsync = "hsync"
vsync = "vsync"
red = "red"
green = "green"
blue = "blue"
speaker = "speaker"
uart_tx = "uart_tx"
uart_rx = "uart_rx"
spi_sdi = "spi_sdi"
spi_sdo = "spi_sdo"
spi_sclk = "spi_sclk"
spi_irq = "spi_irq"
buttons = ["up_key", "down_key", "new_game", "pause"]

[vga]
width = 640
height = 480
h_front = 16
h_sync = 96
h_back = 48
v_front = 10
v_sync = 2
v_back = 33
color_delay = 1
sync_delay = 0
full_check_lines = 2
count_lines = 2
classes = ["yellow", "green"]

# Column 0 of each counted line is not classified.
[vga.expected_counts]
yellow = 158
green = 1120

[[vga.bands]]
lines = [0, 2]
pattern = { kind = "solid", color = "yellow" }

[[vga.bands]]
lines = [2, 4]
pattern = { kind = "bricks", pitch = 32, edge_mortar = 2, brick = "green", mortar = "yellow" }

[uart]
bit_cycles = 9
sample_offset = 2
start_settle = "10ns"
stop_samples = 2
stop_spacing = 4

[protocol]
first_byte = 0x57
strobe_pulses = 3
burst = [0x16, 0x34]
serial_drive = [1, 1, 0, 0, 0, 0, 1, 1]
serial_expect = [1, 0, 1, 0, 0, 1, 0, 1]
final_byte = 0xC3
final_pulses = 1
idle_cycles = 1000

[limits]
event_timeout = "2ms"
# scenario_timeout = "50ms"
"#;

/// Runs the `vigil init` command.
///
/// Writes `vigil.toml` into `dir` (the current directory if `None`),
/// creating the directory if needed. Refuses to overwrite an existing file
/// unless `force` is set. Returns exit code 0 on success.
pub fn run(dir: Option<PathBuf>, force: bool) -> Result<i32, Box<dyn std::error::Error>> {
    let dir = match dir {
        Some(d) => d,
        None => std::env::current_dir()?,
    };
    let path = write_template(&dir, force)?;
    eprintln!("     Created {}", path.display());
    Ok(0)
}

/// Writes the template and returns its path.
fn write_template(dir: &Path, force: bool) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let path = dir.join(CONFIG_FILE_NAME);
    if path.exists() && !force {
        return Err(format!("'{}' already exists (use --force)", path.display()).into());
    }
    fs::create_dir_all(dir)?;
    fs::write(&path, TEMPLATE)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn template_is_a_valid_config() {
        let config = vigil_config::load_config_from_str(TEMPLATE).unwrap();
        assert_eq!(config.bench.name, "solo_squash");
        assert_eq!(config.protocol.first_byte, 0x57);
        assert_eq!(config.vga.bands.len(), 2);
        assert_eq!(config.vga.expected_counts["green"], 1120);
        assert_eq!(config.limits.scenario_timeout, None);
    }

    #[test]
    fn writes_into_new_directory() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("bench");
        let code = run(Some(dir.clone()), false).unwrap();
        assert_eq!(code, 0);
        let written = vigil_config::load_config(&dir).unwrap();
        assert_eq!(written.clock.frequency, "25MHz");
    }

    #[test]
    fn refuses_to_overwrite() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILE_NAME), "# mine\n").unwrap();
        let err = run(Some(tmp.path().to_path_buf()), false).unwrap_err();
        assert!(err.to_string().contains("already exists"));
        let kept = fs::read_to_string(tmp.path().join(CONFIG_FILE_NAME)).unwrap();
        assert_eq!(kept, "# mine\n");
    }

    #[test]
    fn force_overwrites() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILE_NAME), "# mine\n").unwrap();
        run(Some(tmp.path().to_path_buf()), true).unwrap();
        assert!(vigil_config::load_config(tmp.path()).is_ok());
    }
}
