//! The standard suite against the behavioral reference design, clean and
//! with each injected fault.

use vigil_common::Logic;
use vigil_config::BenchConfig;
use vigil_sim::{Fault, ReferenceConfig, ReferenceDesign, SignalAccess, SimKernel};
use vigil_verify::plan::{FIRST_FRAME, PROTOCOL, RESET};
use vigil_verify::{suite_from_config, Selection, SuiteReport, UartBit, VerifyError};

fn run(config: &BenchConfig, only: Option<&str>, faults: &[Fault]) -> SuiteReport {
    let suite = suite_from_config(config).unwrap();
    let selection = Selection {
        name: only.map(str::to_string),
        filter: None,
    };
    suite.run(&selection, |_| {
        let design = ReferenceDesign::new(ReferenceConfig {
            faults: faults.to_vec(),
            ..ReferenceConfig::default()
        });
        Ok(Box::new(SimKernel::new(Box::new(design))?) as Box<dyn SignalAccess>)
    })
}

fn failure(name: &str, faults: &[Fault]) -> VerifyError {
    let mut report = run(&BenchConfig::default(), Some(name), faults);
    assert_eq!(report.reports.len(), 1);
    match report.reports.remove(0).outcome {
        Ok(()) => panic!("{name} passed with {faults:?}"),
        Err(e) => e,
    }
}

#[test]
fn reference_design_passes_every_scenario() {
    let report = run(&BenchConfig::default(), None, &[]);
    for r in &report.reports {
        assert!(r.passed(), "{}: {:?}", r.name, r.outcome);
    }
    assert_eq!(report.passed(), 3);
    assert!(report.all_passed());

    let frame = report.get(FIRST_FRAME).unwrap();
    assert!(frame.cycles > 420_000, "stopped at {}", frame.cycles);
}

#[test]
fn reset_of_any_valid_length() {
    for cycles in [1, 2, 5, 10] {
        let mut config = BenchConfig::default();
        config.reset.cycles = cycles;
        let report = run(&config, Some(RESET), &[]);
        assert!(report.all_passed(), "reset of {cycles} cycles failed");
    }
}

#[test]
fn zero_cycle_reset_is_a_setup_error() {
    let mut config = BenchConfig::default();
    config.reset.cycles = 0;
    let report = run(&config, Some(RESET), &[]);
    assert!(matches!(
        report.reports[0].outcome,
        Err(VerifyError::Setup(_))
    ));
}

#[test]
fn stuck_hsync_fails_at_sync_start() {
    match failure(FIRST_FRAME, &[Fault::HsyncStuckHigh]) {
        VerifyError::Mismatch {
            cycle,
            signal,
            expected,
            observed,
        } => {
            assert_eq!(cycle, 656);
            assert_eq!(signal, "hsync");
            assert_eq!(expected, Logic::Zero);
            assert_eq!(observed, Logic::One);
        }
        other => panic!("unexpected {other}"),
    }
}

#[test]
fn unregistered_colour_fails_at_blanking() {
    match failure(FIRST_FRAME, &[Fault::UnregisteredColor]) {
        VerifyError::Mismatch { cycle, signal, .. } => {
            assert_eq!(cycle, 640);
            assert_eq!(signal, "red");
        }
        other => panic!("unexpected {other}"),
    }
}

#[test]
fn long_frame_fails_after_wrap() {
    match failure(FIRST_FRAME, &[Fault::LongFrame]) {
        VerifyError::Mismatch { cycle, signal, .. } => {
            assert_eq!(cycle, 420_001);
            assert_eq!(signal, "red");
        }
        other => panic!("unexpected {other}"),
    }
}

#[test]
fn stray_pixel_fails_in_counted_lines() {
    let (h, v) = vigil_sim::reference::STRAY_PIXEL;
    for counts in [true, false] {
        let mut config = BenchConfig::default();
        if !counts {
            config.vga.expected_counts.clear();
        }
        let mut report = run(&config, Some(FIRST_FRAME), &[Fault::StrayBlue]);
        match report.reports.remove(0).outcome {
            Err(VerifyError::Mismatch {
                cycle,
                signal,
                expected,
                observed,
            }) => {
                assert_eq!(cycle, u64::from(v * 800 + h + 1));
                assert_eq!(signal, "blue");
                assert_eq!(expected, Logic::Zero);
                assert_eq!(observed, Logic::One);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}

#[test]
fn undriven_blue_fails_first_frame() {
    match failure(FIRST_FRAME, &[Fault::UndrivenBlue]) {
        VerifyError::Undriven {
            cycle,
            signal,
            observed,
        } => {
            assert_eq!(cycle, 1);
            assert_eq!(signal, "blue");
            assert!(!observed.is_driven());
        }
        other => panic!("unexpected {other}"),
    }
}

#[test]
fn undriven_speaker_fails_reset() {
    match failure(RESET, &[Fault::UndrivenSpeaker]) {
        VerifyError::Undriven {
            signal, observed, ..
        } => {
            assert_eq!(signal, "speaker");
            assert!(!observed.is_driven());
        }
        other => panic!("unexpected {other}"),
    }
}

#[test]
fn flipped_uart_bit_is_located() {
    match failure(PROTOCOL, &[Fault::UartBitFlip { bit: 3 }]) {
        VerifyError::UartBit {
            byte,
            bit,
            expected,
            observed,
            ..
        } => {
            assert_eq!(byte, 0x57);
            assert_eq!(bit, UartBit::Data(3));
            assert_eq!(expected, Logic::Zero);
            assert_eq!(observed, Logic::One);
        }
        other => panic!("unexpected {other}"),
    }
}

#[test]
fn uart_glitch_fails_start_confirm() {
    match failure(PROTOCOL, &[Fault::UartIdleGlitch]) {
        VerifyError::UartBit {
            cycle,
            bit,
            expected,
            observed,
            ..
        } => {
            assert_eq!(cycle, 1);
            assert_eq!(bit, UartBit::Start);
            assert_eq!(expected, Logic::Zero);
            assert_eq!(observed, Logic::One);
        }
        other => panic!("unexpected {other}"),
    }
}

#[test]
fn low_stop_bit_fails_first_stop_sample() {
    let data = failure(PROTOCOL, &[Fault::UartBitFlip { bit: 0 }]);
    match failure(PROTOCOL, &[Fault::UartLowStop]) {
        VerifyError::UartBit {
            cycle,
            byte,
            bit,
            expected,
            observed,
            ..
        } => {
            // Data sample 0 is 11 cycles after the start edge, stop sample 0 is 83.
            assert_eq!(Some(cycle - 72), data.cycle());
            assert_eq!(byte, 0x57);
            assert_eq!(bit, UartBit::Stop(0));
            assert_eq!(expected, Logic::One);
            assert_eq!(observed, Logic::Zero);
        }
        other => panic!("unexpected {other}"),
    }
}

#[test]
fn flipped_serial_bit_reports_transaction() {
    match failure(PROTOCOL, &[Fault::SerialBitFlip { index: 2 }]) {
        VerifyError::Serial { index, signal, .. } => {
            assert_eq!(index, 2);
            assert_eq!(signal, "spi_sdo");
        }
        other => panic!("unexpected {other}"),
    }
}

#[test]
fn silent_strobe_times_out() {
    let err = failure(PROTOCOL, &[Fault::SilentStrobe]);
    assert!(matches!(err, VerifyError::Timeout { .. }), "{err}");
}

#[test]
fn scenario_deadline_is_distinct_from_timeout() {
    let mut config = BenchConfig::default();
    config.limits.scenario_timeout = Some("20us".into());
    let report = run(&config, Some(PROTOCOL), &[]);
    assert!(matches!(
        report.reports[0].outcome,
        Err(VerifyError::ScenarioDeadline { .. })
    ));
}

#[test]
fn a_failing_scenario_does_not_stop_the_suite() {
    let report = run(&BenchConfig::default(), None, &[Fault::UartBitFlip { bit: 0 }]);
    assert_eq!(report.reports.len(), 3);
    assert!(report.get(RESET).unwrap().passed());
    assert!(report.get(FIRST_FRAME).unwrap().passed());
    assert!(!report.get(PROTOCOL).unwrap().passed());
}
