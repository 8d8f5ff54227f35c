//! Memory sampling and leak checks
//!
//! Usage figures come from a pluggable [`MemoryProbe`]. When the host has
//! no probe the sampler still produces a series, filled with zeros.

use serde::Serialize;
use std::fs;
use std::time::Duration;
use tracing::{debug, warn};

/// Default leak tolerance: 20% growth over the baseline
pub const DEFAULT_LEAK_TOLERANCE: f64 = 0.20;

/// Default number of create/dispose cycles in a leak check
pub const DEFAULT_LEAK_CYCLES: u32 = 100;

/// Source of memory-usage readings
pub trait MemoryProbe {
    /// Current usage in probe-defined units, or `None` if unavailable
    fn current_usage(&self) -> Option<f64>;

    /// Force a collection pass, if the host has one
    fn collect(&self) {}

    /// Unit name for reports
    fn unit(&self) -> &'static str {
        "units"
    }
}

/// Probe for hosts without a usage primitive; always unavailable
#[derive(Debug, Clone, Copy, Default)]
pub struct NullProbe;

impl MemoryProbe for NullProbe {
    fn current_usage(&self) -> Option<f64> {
        None
    }
}

/// Resident set size of the current process in KiB (Linux `/proc`)
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessProbe;

impl MemoryProbe for ProcessProbe {
    fn current_usage(&self) -> Option<f64> {
        let status = fs::read_to_string("/proc/self/status").ok()?;
        status
            .lines()
            .find_map(|line| line.strip_prefix("VmRSS:"))
            .and_then(|rest| rest.split_whitespace().next())
            .and_then(|kb| kb.parse::<f64>().ok())
    }

    fn unit(&self) -> &'static str {
        "KiB"
    }
}

/// Read a probe, defaulting to zero when it has nothing to report
pub fn read_usage(probe: &dyn MemoryProbe) -> f64 {
    probe.current_usage().unwrap_or(0.0)
}

/// Cooperatively suspend the current task.
///
/// A zero duration still yields once so other work on the runtime can run.
pub async fn pause(duration: Duration) {
    if duration.is_zero() {
        tokio::task::yield_now().await;
    } else {
        tokio::time::sleep(duration).await;
    }
}

/// One memory reading
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MemorySample {
    pub sequence: u64,
    pub usage: f64,
}

/// Append-only series of memory readings
#[derive(Debug, Clone, Default)]
pub struct MemorySampler {
    samples: Vec<MemorySample>,
}

impl MemorySampler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take a single reading immediately
    pub fn record(&mut self, probe: &dyn MemoryProbe) -> MemorySample {
        let sample = MemorySample {
            sequence: self.samples.len() as u64,
            usage: read_usage(probe),
        };
        self.samples.push(sample);
        sample
    }

    /// Take `count` readings, pausing `interval` between consecutive ones.
    ///
    /// Returns just the readings taken by this call, in sequence order.
    pub async fn sample(
        &mut self,
        probe: &dyn MemoryProbe,
        count: usize,
        interval: Duration,
    ) -> Vec<MemorySample> {
        let first = self.samples.len();
        for i in 0..count {
            if i > 0 {
                pause(interval).await;
            }
            let sample = self.record(probe);
            debug!(sequence = sample.sequence, usage = sample.usage, "memory sample");
        }
        self.samples[first..].to_vec()
    }

    pub fn samples(&self) -> &[MemorySample] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<MemorySample> {
        self.samples
    }
}

/// Outcome of a leak check
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeakVerdict {
    pub label: String,
    pub cycles: u32,
    pub before: f64,
    pub after: f64,
    pub tolerance: f64,
    pub leaked: bool,
}

impl LeakVerdict {
    /// Growth relative to the baseline; `None` when the baseline is zero
    pub fn growth(&self) -> Option<f64> {
        if self.before > 0.0 {
            Some((self.after - self.before) / self.before)
        } else {
            None
        }
    }
}

/// Ad hoc leak check: measure, cycle, collect, measure again
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LeakCheck {
    pub cycles: u32,
    pub tolerance: f64,
}

impl Default for LeakCheck {
    fn default() -> Self {
        Self {
            cycles: DEFAULT_LEAK_CYCLES,
            tolerance: DEFAULT_LEAK_TOLERANCE,
        }
    }
}

impl LeakCheck {
    pub fn new(cycles: u32, tolerance: f64) -> Self {
        Self { cycles, tolerance }
    }

    /// Run `cycle` the configured number of times between two readings.
    ///
    /// A leak is flagged when the second reading exceeds the first by more
    /// than the tolerance fraction. Errors from `cycle` abort the check.
    pub fn run<F, E>(
        &self,
        label: &str,
        probe: &dyn MemoryProbe,
        mut cycle: F,
    ) -> Result<LeakVerdict, E>
    where
        F: FnMut() -> Result<(), E>,
    {
        probe.collect();
        let before = read_usage(probe);
        for _ in 0..self.cycles {
            cycle()?;
        }
        probe.collect();
        let after = read_usage(probe);

        let leaked = after > before * (1.0 + self.tolerance);
        if leaked {
            warn!(label, before, after, tolerance = self.tolerance, "possible leak");
        } else {
            debug!(label, before, after, "leak check clean");
        }

        Ok(LeakVerdict {
            label: label.to_string(),
            cycles: self.cycles,
            before,
            after,
            tolerance: self.tolerance,
            leaked,
        })
    }
}
