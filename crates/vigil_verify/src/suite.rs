//! Ordered scenario suites and their reports.

use std::time::{Duration, Instant};

use vigil_common::SimTime;
use vigil_sim::SignalAccess;

use crate::error::VerifyError;
use crate::harness::{Bench, HarnessSpec};
use crate::scenario::Scenario;

/// Which scenarios of a suite to run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Selection {
    /// Exact scenario name.
    pub name: Option<String>,
    /// Substring of scenario names.
    pub filter: Option<String>,
}

impl Selection {
    /// Every scenario.
    pub fn all() -> Self {
        Self::default()
    }

    /// Whether the scenario called `name` is selected.
    ///
    /// An exact name takes precedence over the substring filter.
    pub fn matches(&self, name: &str) -> bool {
        if let Some(n) = &self.name {
            return n == name;
        }
        if let Some(f) = &self.filter {
            return name.contains(f.as_str());
        }
        true
    }
}

/// Outcome of one scenario.
#[derive(Debug)]
pub struct ScenarioReport {
    /// Scenario name.
    pub name: String,
    /// `Ok` if every assertion held.
    pub outcome: Result<(), VerifyError>,
    /// Cycles since reset release when the scenario stopped.
    pub cycles: u64,
    /// Simulation time when the scenario stopped.
    pub sim_time: SimTime,
    /// Wall-clock time spent.
    pub elapsed: Duration,
}

impl ScenarioReport {
    /// Whether the scenario passed.
    pub fn passed(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Outcomes of every selected scenario, in suite order.
#[derive(Debug, Default)]
pub struct SuiteReport {
    /// One entry per scenario run.
    pub reports: Vec<ScenarioReport>,
}

impl SuiteReport {
    /// Number of passing scenarios.
    pub fn passed(&self) -> usize {
        self.reports.iter().filter(|r| r.passed()).count()
    }

    /// Number of failing scenarios.
    pub fn failed(&self) -> usize {
        self.reports.len() - self.passed()
    }

    /// Whether every scenario that ran passed.
    pub fn all_passed(&self) -> bool {
        self.failed() == 0
    }

    /// Looks a report up by scenario name.
    pub fn get(&self, name: &str) -> Option<&ScenarioReport> {
        self.reports.iter().find(|r| r.name == name)
    }
}

/// Scenarios sharing one harness configuration.
pub struct Suite {
    harness: HarnessSpec,
    scenarios: Vec<Box<dyn Scenario>>,
}

impl Suite {
    /// Creates an empty suite.
    pub fn new(harness: HarnessSpec) -> Self {
        Self {
            harness,
            scenarios: Vec::new(),
        }
    }

    /// Appends a scenario.
    pub fn push(&mut self, scenario: Box<dyn Scenario>) {
        self.scenarios.push(scenario);
    }

    /// Appends a scenario, builder style.
    pub fn with(mut self, scenario: impl Scenario + 'static) -> Self {
        self.push(Box::new(scenario));
        self
    }

    /// The harness parameters.
    pub fn harness(&self) -> &HarnessSpec {
        &self.harness
    }

    /// Scenario names in run order.
    pub fn names(&self) -> Vec<&str> {
        self.scenarios.iter().map(|s| s.name()).collect()
    }

    /// Runs the selected scenarios in order, each against a fresh
    /// simulation from `factory`.
    ///
    /// A failing scenario does not stop the suite. A factory error is
    /// reported as that scenario's failure.
    pub fn run<F>(&self, selection: &Selection, mut factory: F) -> SuiteReport
    where
        F: FnMut(&str) -> Result<Box<dyn SignalAccess>, VerifyError>,
    {
        let mut report = SuiteReport::default();
        for scenario in &self.scenarios {
            let name = scenario.name();
            if !selection.matches(name) {
                tracing::debug!(scenario = name, "skipped by selection");
                continue;
            }
            tracing::info!(scenario = name, "scenario started");
            let started = Instant::now();
            let entry = match factory(name) {
                Ok(mut sim) => self.run_one(scenario.as_ref(), sim.as_mut(), started),
                Err(e) => ScenarioReport {
                    name: name.to_string(),
                    outcome: Err(e),
                    cycles: 0,
                    sim_time: SimTime::zero(),
                    elapsed: started.elapsed(),
                },
            };
            match &entry.outcome {
                Ok(()) => tracing::info!(
                    scenario = name,
                    cycles = entry.cycles,
                    time = %entry.sim_time,
                    "scenario passed"
                ),
                Err(e) => tracing::warn!(
                    scenario = name,
                    kind = e.kind(),
                    "scenario failed: {e}"
                ),
            }
            report.reports.push(entry);
        }
        report
    }

    fn run_one(
        &self,
        scenario: &dyn Scenario,
        sim: &mut dyn SignalAccess,
        started: Instant,
    ) -> ScenarioReport {
        let (outcome, cycles, sim_time) = {
            let mut bench = Bench::new(sim, &self.harness);
            let outcome = scenario.run(&mut bench);
            (outcome, bench.cycle(), bench.now())
        };
        let outcome = match (outcome, sim.finish()) {
            (Ok(()), Err(e)) => Err(VerifyError::Sim(e)),
            (outcome, _) => outcome,
        };
        ScenarioReport {
            name: scenario.name().to_string(),
            outcome,
            cycles,
            sim_time,
            elapsed: started.elapsed(),
        }
    }
}
