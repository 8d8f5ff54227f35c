//! Gauge Harness - weighted test orchestration and benchmarking
//!
//! This library runs an ordered suite of named checks against a pluggable
//! subject under test (SUT) and turns the outcomes into a weighted
//! compatibility score:
//! - Registration and in-order execution with critical-abort semantics
//! - Per-test weights with a default for unlisted names
//! - Scoped ownership of SUT objects with guaranteed disposal
//! - Fixed-iteration benchmarks and fixed-budget throughput runs
//! - Memory sampling and ad hoc leak checks
//! - Tiered rating and a deterministic text report
//!
//! # Example
//!
//! ```no_run
//! use gauge_harness::{ensure, Harness, TestCase};
//! # async fn demo(adapter: &mut dyn gauge_harness::SutAdapter) -> Result<(), gauge_harness::HarnessError> {
//! let mut harness = Harness::new();
//! harness.register(TestCase::new("create", |ctx| {
//!     let part = ctx.sut.create("Part")?;
//!     ensure(part.id() > 0, "handle ids start at 1")
//! }).critical())?;
//! let report = harness.execute(adapter).await?;
//! println!("{}", report.render(&Default::default()));
//! # Ok(())
//! # }
//! ```

/// Harness version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod adapter;
pub mod aggregate;
pub mod bench;
pub mod error;
pub mod harness;
pub mod memory;
pub mod rating;
pub mod registry;
pub mod report;
pub mod runner;
pub mod tracker;
pub mod weights;

pub use adapter::{PropertyValue, ResourceHandle, SutAdapter};
pub use aggregate::{Aggregator, OutcomeStatus, TestOutcome, Totals};
pub use bench::{BenchmarkEngine, PerformanceMetric, Throughput};
pub use error::{ensure, ensure_eq, AdapterError, HarnessError, HarnessResult, TestError};
pub use harness::{Harness, HarnessSettings};
pub use memory::{
    pause, LeakCheck, LeakVerdict, MemoryProbe, MemorySample, MemorySampler, NullProbe,
    ProcessProbe,
};
pub use rating::{percentage, tier_table, Tier};
pub use registry::{Registry, TestBody, TestCase};
pub use report::{ReportOptions, RunReport};
pub use runner::{Runner, SutScope, TestContext};
pub use tracker::ResourceTracker;
pub use weights::WeightTable;
