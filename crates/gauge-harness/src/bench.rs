//! Benchmark engine - fixed-iteration timing and fixed-budget throughput
//!
//! Timing is taken once before and once after the loop so the clock read
//! does not dominate cheap operations. Faults inside the measured function
//! propagate to the caller unchanged.

use serde::Serialize;
use std::hint::black_box;
use std::time::{Duration, Instant};
use tracing::debug;

/// Default iteration count for [`BenchmarkEngine::benchmark`]
pub const DEFAULT_ITERATIONS: u32 = 1000;

/// Mean cost of one invocation, keyed by label
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceMetric {
    pub label: String,
    pub mean_duration_nanos: f64,
    pub sample_count: u64,
}

/// Result of a fixed wall-clock budget run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Throughput {
    pub label: String,
    pub operations: u64,
    pub elapsed_secs: f64,
    pub ops_per_sec: f64,
}

/// Records benchmark metrics in first-insertion order; reusing a label
/// overwrites the earlier metric in place.
#[derive(Debug, Clone, Default)]
pub struct BenchmarkEngine {
    metrics: Vec<PerformanceMetric>,
    throughput: Vec<Throughput>,
}

impl BenchmarkEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Invoke `func` `iterations` times back to back and record the mean.
    ///
    /// An iteration count of zero is treated as one. Returns the mean
    /// duration in nanoseconds; the first error from `func` aborts the loop
    /// and is returned without recording a metric.
    pub fn benchmark<F, E>(&mut self, label: &str, iterations: u32, mut func: F) -> Result<f64, E>
    where
        F: FnMut() -> Result<(), E>,
    {
        let iterations = iterations.max(1);

        let start = Instant::now();
        for _ in 0..iterations {
            black_box(func()?);
        }
        let elapsed = start.elapsed();

        // A zero reading only means the clock is coarser than the loop.
        let total_nanos = (elapsed.as_nanos() as f64).max(1.0);
        let mean = total_nanos / f64::from(iterations);

        debug!(label, iterations, mean_ns = mean, "benchmark recorded");
        self.upsert(PerformanceMetric {
            label: label.to_string(),
            mean_duration_nanos: mean,
            sample_count: u64::from(iterations),
        });
        Ok(mean)
    }

    /// Run `func` repeatedly until `budget` has elapsed and report
    /// operations per second.
    ///
    /// The completed-operation count and elapsed time are also recorded as a
    /// performance metric under the same label.
    pub fn throughput<F, E>(
        &mut self,
        label: &str,
        budget: Duration,
        mut func: F,
    ) -> Result<Throughput, E>
    where
        F: FnMut() -> Result<(), E>,
    {
        let start = Instant::now();
        let mut operations: u64 = 0;
        loop {
            black_box(func()?);
            operations += 1;
            if start.elapsed() >= budget {
                break;
            }
        }
        let elapsed = start.elapsed().as_secs_f64();
        let ops_per_sec = if elapsed > 0.0 {
            operations as f64 / elapsed
        } else {
            operations as f64
        };

        let result = Throughput {
            label: label.to_string(),
            operations,
            elapsed_secs: elapsed,
            ops_per_sec,
        };
        debug!(label, operations, ops_per_sec, "throughput recorded");

        self.upsert(PerformanceMetric {
            label: label.to_string(),
            mean_duration_nanos: (elapsed * 1e9) / operations as f64,
            sample_count: operations,
        });
        match self.throughput.iter_mut().find(|t| t.label == label) {
            Some(slot) => *slot = result.clone(),
            None => self.throughput.push(result.clone()),
        }
        Ok(result)
    }

    fn upsert(&mut self, metric: PerformanceMetric) {
        match self.metrics.iter_mut().find(|m| m.label == metric.label) {
            Some(slot) => *slot = metric,
            None => self.metrics.push(metric),
        }
    }

    pub fn metric(&self, label: &str) -> Option<&PerformanceMetric> {
        self.metrics.iter().find(|m| m.label == label)
    }

    pub fn metrics(&self) -> &[PerformanceMetric] {
        &self.metrics
    }

    pub fn throughput_results(&self) -> &[Throughput] {
        &self.throughput
    }

    /// Hand the recorded metrics and throughput results to the report
    pub fn into_parts(self) -> (Vec<PerformanceMetric>, Vec<Throughput>) {
        (self.metrics, self.throughput)
    }
}
