//! Test runner - execute registered tests in order
//!
//! Each body runs inside a failure boundary that turns both returned errors
//! and panics into outcomes. A failing critical test stops the run; the
//! tests after it are never executed and never scored.

use crate::adapter::{PropertyValue, ResourceHandle, SutAdapter};
use crate::aggregate::{Aggregator, OutcomeStatus, TestOutcome};
use crate::bench::{BenchmarkEngine, Throughput};
use crate::error::{panic_message, TestError};
use crate::harness::HarnessSettings;
use crate::memory::{LeakCheck, LeakVerdict, MemoryProbe};
use crate::registry::Registry;
use crate::tracker::ResourceTracker;
use crate::weights::WeightTable;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Access to the SUT with automatic tracking of created objects
pub struct SutScope<'a> {
    adapter: &'a mut dyn SutAdapter,
    tracker: &'a mut ResourceTracker,
}

impl<'a> SutScope<'a> {
    pub fn new(adapter: &'a mut dyn SutAdapter, tracker: &'a mut ResourceTracker) -> Self {
        Self { adapter, tracker }
    }

    /// Create an object and hand it to the tracker
    pub fn create(&mut self, kind: &str) -> Result<ResourceHandle, TestError> {
        let handle = self.adapter.create(kind)?;
        Ok(self.tracker.track(handle))
    }

    pub fn set(
        &mut self,
        handle: ResourceHandle,
        name: &str,
        value: impl Into<PropertyValue>,
    ) -> Result<(), TestError> {
        Ok(self.adapter.set_property(handle, name, value.into())?)
    }

    pub fn get(&self, handle: ResourceHandle, name: &str) -> Result<PropertyValue, TestError> {
        Ok(self.adapter.get_property(handle, name)?)
    }

    /// Dispose of a tracked object before the run ends
    pub fn release(&mut self, handle: ResourceHandle) -> bool {
        self.tracker.release(handle, &mut *self.adapter)
    }

    /// Register a handle obtained directly from the adapter
    pub fn track(&mut self, handle: ResourceHandle) -> ResourceHandle {
        self.tracker.track(handle)
    }

    /// Raw adapter access. Objects created here must be passed to
    /// [`SutScope::track`].
    pub fn adapter(&mut self) -> &mut dyn SutAdapter {
        &mut *self.adapter
    }

    pub fn tracked(&self) -> usize {
        self.tracker.len()
    }
}

/// Everything a test body can reach during its run
pub struct TestContext<'a> {
    pub sut: SutScope<'a>,
    bench: &'a mut BenchmarkEngine,
    probe: &'a dyn MemoryProbe,
    leaks: &'a mut Vec<LeakVerdict>,
    settings: &'a HarnessSettings,
}

impl<'a> TestContext<'a> {
    /// Benchmark with the configured iteration count
    pub fn benchmark<F>(&mut self, label: &str, func: F) -> Result<f64, TestError>
    where
        F: FnMut(&mut SutScope<'a>) -> Result<(), TestError>,
    {
        let iterations = self.settings.iterations;
        self.benchmark_n(label, iterations, func)
    }

    pub fn benchmark_n<F>(
        &mut self,
        label: &str,
        iterations: u32,
        mut func: F,
    ) -> Result<f64, TestError>
    where
        F: FnMut(&mut SutScope<'a>) -> Result<(), TestError>,
    {
        let sut = &mut self.sut;
        self.bench.benchmark(label, iterations, || func(sut))
    }

    /// Throughput run bounded by the configured stress budget
    pub fn stress<F>(&mut self, label: &str, mut func: F) -> Result<Throughput, TestError>
    where
        F: FnMut(&mut SutScope<'a>) -> Result<(), TestError>,
    {
        let budget = self.settings.stress_budget;
        let sut = &mut self.sut;
        self.bench.throughput(label, budget, || func(sut))
    }

    /// Leak check with the configured cycle count and tolerance.
    ///
    /// The verdict is kept for the report; deciding whether a leak fails
    /// the test is up to the body.
    pub fn leak_check<F>(&mut self, label: &str, mut cycle: F) -> Result<LeakVerdict, TestError>
    where
        F: FnMut(&mut SutScope<'a>) -> Result<(), TestError>,
    {
        let check = LeakCheck::new(self.settings.leak_cycles, self.settings.leak_tolerance);
        let sut = &mut self.sut;
        let verdict = check.run(label, self.probe, || cycle(sut))?;
        self.leaks.push(verdict.clone());
        Ok(verdict)
    }

    pub fn probe(&self) -> &dyn MemoryProbe {
        self.probe
    }

    pub fn settings(&self) -> &HarnessSettings {
        self.settings
    }
}

/// Executes a registry against one SUT adapter
pub struct Runner<'a> {
    pub adapter: &'a mut dyn SutAdapter,
    pub tracker: &'a mut ResourceTracker,
    pub bench: &'a mut BenchmarkEngine,
    pub probe: &'a dyn MemoryProbe,
    pub leaks: &'a mut Vec<LeakVerdict>,
    pub weights: &'a WeightTable,
    pub settings: &'a HarnessSettings,
}

impl Runner<'_> {
    /// Run every case in registration order, recording into `aggregator`.
    ///
    /// Stops after the first critical failure.
    pub fn run_all(&mut self, registry: &mut Registry, aggregator: &mut Aggregator) {
        info!(tests = registry.len(), "running suite");

        for case in registry.iter_mut() {
            let weight = case.resolved_weight(self.weights);
            let critical = case.is_critical();

            let mut ctx = TestContext {
                sut: SutScope::new(&mut *self.adapter, &mut *self.tracker),
                bench: &mut *self.bench,
                probe: self.probe,
                leaks: &mut *self.leaks,
                settings: self.settings,
            };

            let start = Instant::now();
            let result = match panic::catch_unwind(AssertUnwindSafe(|| case.call(&mut ctx))) {
                Ok(result) => result,
                Err(payload) => Err(TestError::Panicked(panic_message(payload.as_ref()))),
            };
            let duration = start.elapsed();

            let (status, detail) = match result {
                Ok(()) => (OutcomeStatus::Passed, String::new()),
                Err(e) if critical => (OutcomeStatus::CriticalFailure, e.to_string()),
                Err(e) => (OutcomeStatus::Failed, e.to_string()),
            };
            debug!(test = case.name(), ?status, weight, ?duration, "test finished");

            aggregator.record(TestOutcome {
                name: case.name().to_string(),
                status,
                detail,
                weight,
                duration,
            });

            if status == OutcomeStatus::CriticalFailure {
                warn!(test = case.name(), "critical test failed; stopping run");
                break;
            }
        }
    }
}
