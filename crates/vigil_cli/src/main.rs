//! The vigil CLI. Runs the cycle-accurate verification suite.
//!
//! Provides `vigil init` to scaffold a `vigil.toml` and `vigil test` to run
//! the reset, first-frame and protocol scenarios against the reference
//! design, optionally with injected faults and VCD capture.

#![warn(missing_docs)]

mod init;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{fmt, EnvFilter};
use vigil_sim::Fault;

/// vigil: cycle-accurate verification of a VGA/UART circuit.
#[derive(Parser, Debug)]
#[command(name = "vigil", version, about = "Cycle-accurate circuit verification")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Control colored output.
    #[arg(long, global = true, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// Path to a custom `vigil.toml` configuration file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write a default `vigil.toml`.
    Init {
        /// Directory to create the file in. Defaults to the current one.
        dir: Option<PathBuf>,

        /// Overwrite an existing `vigil.toml`.
        #[arg(long)]
        force: bool,
    },
    /// Run the scenario suite.
    Test(TestArgs),
}

/// Arguments for the `vigil test` subcommand.
#[derive(Parser, Debug)]
pub struct TestArgs {
    /// Specific scenario name to run (optional).
    pub name: Option<String>,

    /// Substring filter for scenario names.
    #[arg(long)]
    pub filter: Option<String>,

    /// Defect to inject into the reference design (repeatable), e.g.
    /// `hsync-stuck-high` or `uart-bit-flip:3`.
    #[arg(long = "fault")]
    pub faults: Vec<Fault>,

    /// Directory to write one VCD file per scenario into.
    #[arg(long)]
    pub waveform: Option<PathBuf>,
}

/// Controls whether colored output is produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    /// Detect from terminal capabilities.
    Auto,
    /// Always produce colored output.
    Always,
    /// Never produce colored output.
    Never,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print verbose/debug information.
    pub verbose: bool,
    /// Whether to use colored output.
    pub color: bool,
    /// Optional path to a custom config file.
    pub config: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();

    let color = match cli.color {
        ColorChoice::Auto => std::env::var_os("TERM").is_some(),
        ColorChoice::Always => true,
        ColorChoice::Never => false,
    };

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        color,
        config: cli.config,
    };
    init_tracing(&global);

    let result = match cli.command {
        Command::Init { dir, force } => init::run(dir, force),
        Command::Test(ref args) => test::run(args, &global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

/// Log level implied by the global flags.
fn default_filter(global: &GlobalArgs) -> &'static str {
    if global.quiet {
        "warn"
    } else if global.verbose {
        "debug"
    } else {
        "info"
    }
}

/// Installs the log subscriber; `RUST_LOG` overrides the flags.
fn init_tracing(global: &GlobalArgs) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(global)));
    let _ = fmt()
        .with_env_filter(filter)
        .with_ansi(global.color)
        .with_writer(std::io::stderr)
        .try_init();
}
