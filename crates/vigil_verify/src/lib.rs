//! Cycle-accurate verification of a VGA/UART/shift-register circuit.
//!
//! Scenarios drive a simulated circuit through the [`SignalAccess`]
//! boundary of `vigil_sim` and compare its outputs, cycle by cycle, against
//! reference models:
//!
//! - [`harness`] owns the clock, the reset pulse and the wait bounds
//! - [`timing`] predicts sync levels and raster positions per cycle
//! - [`pixel`] holds the declared picture and the colour tallies
//! - [`frame`], [`uart`] and [`serial`] are the checkers, each an explicit
//!   [`Procedure`] state machine
//! - [`scenario`], [`suite`] and [`plan`] sequence them into a suite
//!
//! Every failure aborts its scenario and carries the cycle count since
//! reset release.
//!
//! [`SignalAccess`]: vigil_sim::SignalAccess

#![warn(missing_docs)]

pub mod error;
pub mod frame;
pub mod harness;
pub mod pixel;
pub mod plan;
pub mod procedure;
pub mod scenario;
pub mod serial;
pub mod suite;
pub mod timing;
pub mod uart;

pub use error::{UartBit, VerifyError};
pub use frame::{FrameCheck, FramePlan, FrameReport, VgaSignals};
pub use harness::{Bench, HarnessSpec};
pub use pixel::{Bands, Bricks, Color, ColorCounter, PixelChecker, RegionPattern, Solid};
pub use plan::{harness_from_config, scenarios_from_config, suite_from_config};
pub use procedure::{Procedure, Step};
pub use scenario::{FrameScenario, ProtocolScenario, ProtocolStep, ResetScenario, Scenario};
pub use serial::{SerialChecker, SerialSignals, SerialTransaction};
pub use suite::{ScenarioReport, Selection, Suite, SuiteReport};
pub use timing::{FrameGeometry, Phase, RasterPosition, RegistrationDelays, VgaTimingModel};
pub use uart::{UartDecoder, UartTiming};
