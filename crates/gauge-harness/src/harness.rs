//! Harness driver - one complete run from registration to report
//!
//! `execute` guarantees that the resource tracker's cleanup runs exactly
//! once, including when the run itself faults outside a test boundary.

use crate::adapter::SutAdapter;
use crate::aggregate::Aggregator;
use crate::bench::{BenchmarkEngine, DEFAULT_ITERATIONS};
use crate::error::{panic_message, HarnessError, HarnessResult, TestError};
use crate::memory::{
    MemoryProbe, MemorySampler, NullProbe, DEFAULT_LEAK_CYCLES, DEFAULT_LEAK_TOLERANCE,
};
use crate::registry::{Registry, TestCase};
use crate::report::RunReport;
use crate::runner::{Runner, SutScope};
use crate::tracker::ResourceTracker;
use crate::weights::WeightTable;
use chrono::Utc;
use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Suite-level setup run before the first test, outside any test boundary
pub type SetupHook = Box<dyn FnOnce(&mut SutScope<'_>) -> Result<(), TestError>>;

/// Tunables for a run
#[derive(Debug, Clone, PartialEq)]
pub struct HarnessSettings {
    /// Iterations per benchmark
    pub iterations: u32,
    /// Wall-clock budget of each stress run
    pub stress_budget: Duration,
    /// Memory samples taken after the suite
    pub samples: usize,
    /// Pause between memory samples
    pub sample_interval: Duration,
    /// Allowed growth fraction in leak checks
    pub leak_tolerance: f64,
    /// Create/dispose cycles per leak check
    pub leak_cycles: u32,
    /// Absolute memory delta above which the report warns
    pub drift_warning: f64,
}

impl Default for HarnessSettings {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            stress_budget: Duration::from_secs(3),
            samples: 5,
            sample_interval: Duration::from_secs(1),
            leak_tolerance: DEFAULT_LEAK_TOLERANCE,
            leak_cycles: DEFAULT_LEAK_CYCLES,
            drift_warning: 1.0,
        }
    }
}

/// A configured suite, ready to execute against an adapter
pub struct Harness {
    registry: Registry,
    weights: WeightTable,
    settings: HarnessSettings,
    probe: Box<dyn MemoryProbe>,
    setup: Option<SetupHook>,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
            weights: WeightTable::new(),
            settings: HarnessSettings::default(),
            probe: Box::new(NullProbe),
            setup: None,
        }
    }

    pub fn with_settings(mut self, settings: HarnessSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_weights(mut self, weights: WeightTable) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_probe(mut self, probe: impl MemoryProbe + 'static) -> Self {
        self.probe = Box::new(probe);
        self
    }

    /// Run `setup` before the first test. Objects it creates are tracked;
    /// an error or panic in it is a driver fault.
    pub fn with_setup<F>(mut self, setup: F) -> Self
    where
        F: FnOnce(&mut SutScope<'_>) -> Result<(), TestError> + 'static,
    {
        self.setup = Some(Box::new(setup));
        self
    }

    pub fn register(&mut self, case: TestCase) -> HarnessResult<()> {
        self.registry.register(case)
    }

    /// Keep only tests whose name contains `pattern`
    pub fn filter(&mut self, pattern: &str) {
        self.registry.filter(pattern);
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn weights(&self) -> &WeightTable {
        &self.weights
    }

    pub fn settings(&self) -> &HarnessSettings {
        &self.settings
    }

    /// Run the suite, clean up, sample memory and build the report.
    ///
    /// Returns `DriverFault` if setup or the run loop itself failed; cleanup
    /// has already happened by then.
    pub async fn execute(self, adapter: &mut dyn SutAdapter) -> HarnessResult<RunReport> {
        let Harness {
            mut registry,
            weights,
            settings,
            probe,
            setup,
        } = self;

        let started_at = Utc::now();
        let clock = Instant::now();
        info!(tests = registry.len(), "starting run");

        let mut tracker = ResourceTracker::new();
        let mut bench = BenchmarkEngine::new();
        let mut leaks = Vec::new();
        let mut aggregator = Aggregator::new();
        let mut sampler = MemorySampler::new();
        sampler.record(probe.as_ref());

        let driven = panic::catch_unwind(AssertUnwindSafe(|| -> HarnessResult<()> {
            if let Some(setup) = setup {
                let mut scope = SutScope::new(&mut *adapter, &mut tracker);
                setup(&mut scope)
                    .map_err(|e| HarnessError::DriverFault(format!("suite setup failed: {}", e)))?;
            }
            let mut runner = Runner {
                adapter: &mut *adapter,
                tracker: &mut tracker,
                bench: &mut bench,
                probe: probe.as_ref(),
                leaks: &mut leaks,
                weights: &weights,
                settings: &settings,
            };
            runner.run_all(&mut registry, &mut aggregator);
            Ok(())
        }));

        let disposed = tracker.cleanup(adapter);
        info!(disposed, "tracked resources released");

        let driven = match driven {
            Ok(result) => result,
            Err(payload) => Err(HarnessError::DriverFault(panic_message(payload.as_ref()))),
        };
        if let Err(e) = driven {
            warn!(error = %e, "run aborted by driver fault");
            return Err(e);
        }

        sampler
            .sample(probe.as_ref(), settings.samples, settings.sample_interval)
            .await;

        let report = RunReport::assemble(
            aggregator,
            bench,
            sampler.into_samples(),
            leaks,
            probe.unit(),
            started_at,
            clock.elapsed(),
        );
        info!(
            passed = report.passed,
            total = report.total,
            percentage = report.percentage,
            tier = %report.tier,
            "run finished"
        );
        Ok(report)
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}
