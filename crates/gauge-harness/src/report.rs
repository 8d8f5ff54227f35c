//! Run report and its text rendering
//!
//! Rendering is a pure function of the report: tests appear in execution
//! order and metrics in first-recorded order, so output can be diffed.

use crate::aggregate::{duration_as_millis, Aggregator, OutcomeStatus, TestOutcome};
use crate::bench::{BenchmarkEngine, PerformanceMetric, Throughput};
use crate::memory::{LeakVerdict, MemorySample};
use crate::rating::{percentage, Tier};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use std::time::Duration;

/// Rendering options
#[derive(Debug, Clone, PartialEq)]
pub struct ReportOptions {
    /// Absolute memory delta above which the memory section warns
    pub drift_warning: f64,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self { drift_warning: 1.0 }
    }
}

/// First/last memory readings and their difference
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MemorySummary {
    pub initial: f64,
    #[serde(rename = "final")]
    pub final_usage: f64,
    pub delta: f64,
}

/// Everything one run produced
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    #[serde(rename = "elapsed_ms", serialize_with = "duration_as_millis")]
    pub elapsed: Duration,
    pub passed: usize,
    pub total: usize,
    pub weighted_score: u64,
    pub max_weighted_score: u64,
    pub percentage: f64,
    pub tier: Tier,
    pub outcomes: Vec<TestOutcome>,
    pub metrics: Vec<PerformanceMetric>,
    pub throughput: Vec<Throughput>,
    pub memory: Vec<MemorySample>,
    pub memory_unit: String,
    pub leaks: Vec<LeakVerdict>,
}

const NAME_WIDTH: usize = 32;

impl RunReport {
    /// Build the report from the run's collaborators
    pub fn assemble(
        aggregator: Aggregator,
        bench: BenchmarkEngine,
        memory: Vec<MemorySample>,
        leaks: Vec<LeakVerdict>,
        memory_unit: &str,
        started_at: DateTime<Utc>,
        elapsed: Duration,
    ) -> Self {
        let totals = aggregator.totals();
        let pct = percentage(totals.weighted_score, totals.max_weighted_score);
        let (metrics, throughput) = bench.into_parts();
        Self {
            started_at,
            elapsed,
            passed: totals.passed,
            total: totals.total,
            weighted_score: totals.weighted_score,
            max_weighted_score: totals.max_weighted_score,
            percentage: pct,
            tier: Tier::classify(pct),
            outcomes: aggregator.into_outcomes(),
            metrics,
            throughput,
            memory,
            memory_unit: memory_unit.to_string(),
            leaks,
        }
    }

    /// The critical test that stopped the run, if any
    pub fn aborted_by(&self) -> Option<&TestOutcome> {
        self.outcomes
            .last()
            .filter(|o| o.status == OutcomeStatus::CriticalFailure)
    }

    pub fn memory_summary(&self) -> Option<MemorySummary> {
        let first = self.memory.first()?;
        let last = self.memory.last()?;
        Some(MemorySummary {
            initial: first.usage,
            final_usage: last.usage,
            delta: last.usage - first.usage,
        })
    }

    /// Whether the memory delta exceeds `threshold` in magnitude
    pub fn memory_drifted(&self, threshold: f64) -> bool {
        self.memory_summary()
            .is_some_and(|m| m.delta.abs() > threshold)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Full text report
    pub fn render(&self, options: &ReportOptions) -> String {
        let mut out = String::new();
        out.push_str("=== Gauge Compatibility Report ===\n\n");

        // --- Summary ---
        out.push_str("[ Summary ]\n");
        out.push_str(&format!(
            "  Started        : {}\n",
            self.started_at.to_rfc3339_opts(SecondsFormat::Secs, true)
        ));
        out.push_str(&format!(
            "  Elapsed        : {:.3}s\n",
            self.elapsed.as_secs_f64()
        ));
        out.push_str(&format!(
            "  Tests passed   : {}/{}\n",
            self.passed, self.total
        ));
        out.push_str(&format!(
            "  Weighted score : {}/{} ({:.1}%)\n",
            self.weighted_score, self.max_weighted_score, self.percentage
        ));
        if let Some(critical) = self.aborted_by() {
            out.push_str(&format!(
                "  Run aborted    : critical test '{}' failed\n",
                critical.name
            ));
        }
        out.push('\n');

        // --- Tests ---
        out.push_str("[ Tests ]\n");
        if self.outcomes.is_empty() {
            out.push_str("  No tests executed.\n");
        } else {
            out.push_str(&format!(
                "  {:<8}  {:>6}  {:<width$}  {}\n",
                "Status",
                "Weight",
                "Name",
                "Detail",
                width = NAME_WIDTH
            ));
            out.push_str("  ");
            out.push_str(&"-".repeat(8 + 2 + 6 + 2 + NAME_WIDTH + 2 + 6));
            out.push('\n');
            for o in &self.outcomes {
                let line = format!(
                    "  {:<8}  {:>6}  {:<width$}  {}",
                    o.status.label(),
                    o.weight,
                    o.name,
                    o.detail,
                    width = NAME_WIDTH
                );
                out.push_str(line.trim_end());
                out.push('\n');
            }
        }
        out.push('\n');

        // --- Performance ---
        out.push_str("[ Performance ]\n");
        if self.metrics.is_empty() {
            out.push_str("  No benchmarks recorded.\n");
        } else {
            out.push_str(&format!(
                "  {:<width$}  {:>14}  {:>10}\n",
                "Label",
                "Mean (ns)",
                "Samples",
                width = NAME_WIDTH
            ));
            out.push_str("  ");
            out.push_str(&"-".repeat(NAME_WIDTH + 2 + 14 + 2 + 10));
            out.push('\n');
            for m in &self.metrics {
                out.push_str(&format!(
                    "  {:<width$}  {:>14.1}  {:>10}\n",
                    m.label,
                    m.mean_duration_nanos,
                    m.sample_count,
                    width = NAME_WIDTH
                ));
            }
        }
        out.push('\n');

        if !self.throughput.is_empty() {
            out.push_str("[ Throughput ]\n");
            for t in &self.throughput {
                out.push_str(&format!(
                    "  {:<width$}  {} ops in {:.2}s ({:.0} ops/s)\n",
                    t.label,
                    t.operations,
                    t.elapsed_secs,
                    t.ops_per_sec,
                    width = NAME_WIDTH
                ));
            }
            out.push('\n');
        }

        // --- Memory ---
        out.push_str("[ Memory ]\n");
        match self.memory_summary() {
            None => out.push_str("  No memory samples recorded.\n"),
            Some(summary) => {
                let unit = &self.memory_unit;
                out.push_str(&format!("  Samples : {}\n", self.memory.len()));
                out.push_str(&format!("  Initial : {:.2} {}\n", summary.initial, unit));
                out.push_str(&format!("  Final   : {:.2} {}\n", summary.final_usage, unit));
                out.push_str(&format!("  Delta   : {:+.2} {}\n", summary.delta, unit));
                if summary.delta.abs() > options.drift_warning {
                    out.push_str(&format!(
                        "  WARNING : memory drift of {:.2} {} exceeds threshold {:.2}\n",
                        summary.delta.abs(),
                        unit,
                        options.drift_warning
                    ));
                }
            }
        }
        out.push('\n');

        if !self.leaks.is_empty() {
            out.push_str("[ Leak Checks ]\n");
            for leak in &self.leaks {
                out.push_str(&format!(
                    "  {:<width$}  {:.2} -> {:.2} {} over {} cycles  {}\n",
                    leak.label,
                    leak.before,
                    leak.after,
                    self.memory_unit,
                    leak.cycles,
                    if leak.leaked { "LEAK" } else { "ok" },
                    width = NAME_WIDTH
                ));
            }
            out.push('\n');
        }

        // --- Rating ---
        out.push_str("[ Rating ]\n");
        out.push_str(&format!("  {} ({:.1}%)\n", self.tier.label(), self.percentage));

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn outcome(name: &str, status: OutcomeStatus, detail: &str, weight: u32) -> TestOutcome {
        TestOutcome {
            name: name.to_string(),
            status,
            detail: detail.to_string(),
            weight,
            duration: Duration::from_millis(2),
        }
    }

    fn weighted_partial_pass() -> RunReport {
        let mut agg = Aggregator::new();
        agg.record(outcome("x", OutcomeStatus::Failed, "assertion failed: bad", 5));
        agg.record(outcome("y", OutcomeStatus::Passed, "", 3));
        RunReport::assemble(
            agg,
            BenchmarkEngine::new(),
            vec![
                MemorySample {
                    sequence: 0,
                    usage: 10.0,
                },
                MemorySample {
                    sequence: 1,
                    usage: 12.5,
                },
            ],
            Vec::new(),
            "units",
            Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap(),
            Duration::from_millis(1500),
        )
    }

    #[test]
    fn test_weighted_partial_pass_scores() {
        let report = weighted_partial_pass();
        assert_eq!(report.weighted_score, 3);
        assert_eq!(report.max_weighted_score, 8);
        assert_eq!(report.percentage, 37.5);
        assert_eq!(report.tier, Tier::Limited);
        assert!(report.aborted_by().is_none());
    }

    #[test]
    fn test_render_is_exact() {
        let expected = "\
=== Gauge Compatibility Report ===

[ Summary ]
  Started        : 2026-01-02T03:04:05Z
  Elapsed        : 1.500s
  Tests passed   : 1/2
  Weighted score : 3/8 (37.5%)

[ Tests ]
  Status    Weight  Name                              Detail
  ----------------------------------------------------------
  FAIL           5  x                                 assertion failed: bad
  PASS           3  y

[ Performance ]
  No benchmarks recorded.

[ Memory ]
  Samples : 2
  Initial : 10.00 units
  Final   : 12.50 units
  Delta   : +2.50 units
  WARNING : memory drift of 2.50 units exceeds threshold 1.00

[ Rating ]
  Limited — simple use cases only (37.5%)
";
        assert_eq!(weighted_partial_pass().render(&ReportOptions::default()), expected);
    }

    #[test]
    fn test_render_is_deterministic() {
        let report = weighted_partial_pass();
        let options = ReportOptions::default();
        assert_eq!(report.render(&options), report.render(&options));
    }

    #[test]
    fn test_drift_threshold_is_configurable() {
        let report = weighted_partial_pass();
        let text = report.render(&ReportOptions { drift_warning: 5.0 });
        assert!(!text.contains("WARNING"));
        assert!(report.memory_drifted(1.0));
        assert!(!report.memory_drifted(5.0));
    }

    #[test]
    fn test_render_critical_abort() {
        let mut agg = Aggregator::new();
        agg.record(outcome(
            "x",
            OutcomeStatus::CriticalFailure,
            "assertion failed: fatal",
            5,
        ));
        let report = RunReport::assemble(
            agg,
            BenchmarkEngine::new(),
            Vec::new(),
            Vec::new(),
            "units",
            Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap(),
            Duration::ZERO,
        );
        let text = report.render(&ReportOptions::default());
        assert!(text.contains("Run aborted    : critical test 'x' failed"));
        assert!(text.contains("CRITICAL"));
        assert!(text.contains("No memory samples recorded."));
        assert!(text.contains("Poor — basic functionality only (0.0%)"));
    }

    #[test]
    fn test_render_metrics_in_insertion_order() {
        let mut bench = BenchmarkEngine::new();
        for label in ["zeta", "alpha", "mid"] {
            bench
                .benchmark(label, 10, || Ok::<(), std::convert::Infallible>(()))
                .unwrap();
        }
        let report = RunReport::assemble(
            Aggregator::new(),
            bench,
            Vec::new(),
            Vec::new(),
            "units",
            Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap(),
            Duration::ZERO,
        );
        let text = report.render(&ReportOptions::default());
        let zeta = text.find("zeta").unwrap();
        let alpha = text.find("alpha").unwrap();
        let mid = text.find("mid").unwrap();
        assert!(zeta < alpha && alpha < mid);
        assert!(text.contains("No tests executed."));
    }

    #[test]
    fn test_json_shape() {
        let json: serde_json::Value = serde_json::from_str(&weighted_partial_pass().to_json().unwrap()).unwrap();
        assert_eq!(json["weighted_score"], 3);
        assert_eq!(json["max_weighted_score"], 8);
        assert_eq!(json["tier"], "limited");
        assert_eq!(json["elapsed_ms"], 1500.0);
        assert_eq!(json["outcomes"][0]["status"], "failed");
        assert_eq!(json["memory"][1]["usage"], 12.5);
        assert_eq!(json["started_at"], "2026-01-02T03:04:05Z");
    }
}
