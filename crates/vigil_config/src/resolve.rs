//! Resolution of textual durations and frequencies into simulation time.

use crate::error::ConfigError;
use crate::types::BenchConfig;
use vigil_common::{Frequency, SimTime};

/// Timing values of a [`BenchConfig`] with every string parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedTiming {
    /// Period of the primary clock.
    pub clock_period: SimTime,
    /// Settle delay after reset release.
    pub reset_settle: SimTime,
    /// Settle delay before confirming a UART start bit.
    pub uart_start_settle: SimTime,
    /// Longest wait for an edge on a non-clock signal.
    pub event_timeout: SimTime,
    /// Optional overall bound per scenario.
    pub scenario_timeout: Option<SimTime>,
}

/// Parses the clock frequency and all durations of `config`.
pub fn resolve_timing(config: &BenchConfig) -> Result<ResolvedTiming, ConfigError> {
    let frequency: Frequency = config
        .clock
        .frequency
        .parse()
        .map_err(|e| ConfigError::ValidationError(format!("clock.frequency: {e}")))?;
    let clock_period = frequency.period().ok_or_else(|| {
        ConfigError::ValidationError(format!(
            "clock.frequency: {frequency} has no representable period"
        ))
    })?;
    if clock_period.fs % 2 != 0 {
        return Err(ConfigError::ValidationError(format!(
            "clock.frequency: period {clock_period} is not an even number of femtoseconds"
        )));
    }

    let scenario_timeout = match &config.limits.scenario_timeout {
        Some(s) => Some(parse_time("limits.scenario_timeout", s)?),
        None => None,
    };

    Ok(ResolvedTiming {
        clock_period,
        reset_settle: parse_time("reset.settle", &config.reset.settle)?,
        uart_start_settle: parse_time("uart.start_settle", &config.uart.start_settle)?,
        event_timeout: parse_time("limits.event_timeout", &config.limits.event_timeout)?,
        scenario_timeout,
    })
}

fn parse_time(field: &str, s: &str) -> Result<SimTime, ConfigError> {
    s.parse()
        .map_err(|e| ConfigError::ValidationError(format!("{field}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_defaults() {
        let t = resolve_timing(&BenchConfig::default()).unwrap();
        assert_eq!(t.clock_period, SimTime::from_ns(40));
        assert_eq!(t.reset_settle, SimTime::from_ns(10));
        assert_eq!(t.uart_start_settle, SimTime::from_ns(10));
        assert_eq!(t.event_timeout, "2ms".parse().unwrap());
        assert_eq!(t.scenario_timeout, None);
    }

    #[test]
    fn bad_frequency_names_field() {
        let mut cfg = BenchConfig::default();
        cfg.clock.frequency = "fast".to_string();
        let err = resolve_timing(&cfg).unwrap_err();
        assert!(err.to_string().contains("clock.frequency"));
    }

    #[test]
    fn zero_frequency_rejected() {
        let mut cfg = BenchConfig::default();
        cfg.clock.frequency = "0Hz".to_string();
        assert!(matches!(
            resolve_timing(&cfg),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn bad_duration_names_field() {
        let mut cfg = BenchConfig::default();
        cfg.limits.scenario_timeout = Some("soon".to_string());
        let err = resolve_timing(&cfg).unwrap_err();
        assert!(err.to_string().contains("limits.scenario_timeout"));
    }
}
