//! Result aggregation - per-test outcomes and weighted totals

use serde::{Serialize, Serializer};
use std::time::Duration;

/// How a test ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Passed,
    Failed,
    /// A critical test failed; nothing after it ran
    CriticalFailure,
}

impl OutcomeStatus {
    /// Short label for report tables
    pub fn label(&self) -> &'static str {
        match self {
            OutcomeStatus::Passed => "PASS",
            OutcomeStatus::Failed => "FAIL",
            OutcomeStatus::CriticalFailure => "CRITICAL",
        }
    }
}

/// Outcome of one executed test
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestOutcome {
    pub name: String,
    pub status: OutcomeStatus,
    /// Error text for failures; empty on pass
    pub detail: String,
    pub weight: u32,
    #[serde(rename = "duration_ms", serialize_with = "duration_as_millis")]
    pub duration: Duration,
}

impl TestOutcome {
    pub fn is_pass(&self) -> bool {
        self.status == OutcomeStatus::Passed
    }
}

pub(crate) fn duration_as_millis<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64() * 1000.0)
}

/// Aggregate counts for a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Totals {
    pub passed: usize,
    pub total: usize,
    pub weighted_score: u64,
    pub max_weighted_score: u64,
}

/// Accumulates outcomes in execution order
#[derive(Debug, Clone, Default)]
pub struct Aggregator {
    outcomes: Vec<TestOutcome>,
    totals: Totals,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an outcome and fold it into the totals
    pub fn record(&mut self, outcome: TestOutcome) {
        let weight = u64::from(outcome.weight);
        self.totals.total += 1;
        self.totals.max_weighted_score += weight;
        if outcome.is_pass() {
            self.totals.passed += 1;
            self.totals.weighted_score += weight;
        }
        self.outcomes.push(outcome);
    }

    pub fn totals(&self) -> Totals {
        self.totals
    }

    pub fn outcomes(&self) -> &[TestOutcome] {
        &self.outcomes
    }

    pub fn into_outcomes(self) -> Vec<TestOutcome> {
        self.outcomes
    }

    /// Whether the run was stopped by a critical failure
    pub fn aborted(&self) -> bool {
        self.outcomes
            .last()
            .is_some_and(|o| o.status == OutcomeStatus::CriticalFailure)
    }
}
