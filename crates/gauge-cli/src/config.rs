//! CLI configuration
//!
//! Combines the environment, gauge.toml and command-line flags into the
//! harness settings and weight table for one run.

use crate::suite;
use anyhow::{Context, Result};
use gauge_config::{ConfigLoader, ProjectConfig};
use gauge_harness::{HarnessSettings, WeightTable};
use std::env;
use std::path::Path;
use std::time::Duration;

/// CLI configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Disable colored output (GAUGE_NO_COLOR=1 or NO_COLOR=1)
    pub no_color: bool,
    /// Default to JSON report output (GAUGE_JSON=1)
    pub default_json: bool,
}

impl CliConfig {
    pub fn from_env() -> Self {
        Self {
            no_color: env::var_os("GAUGE_NO_COLOR").is_some() || env::var_os("NO_COLOR").is_some(),
            default_json: env::var("GAUGE_JSON")
                .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
        }
    }
}

/// Setting overrides given on the command line
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    pub iterations: Option<u32>,
    pub samples: Option<usize>,
    pub interval_secs: Option<f64>,
    pub stress_budget_secs: Option<f64>,
    pub leak_tolerance: Option<f64>,
}

/// Load gauge.toml (plus global config and GAUGE_* overrides)
///
/// With no explicit path the file is searched for from the current
/// directory upwards; none found means defaults.
pub fn load_project(explicit: Option<&Path>) -> Result<ProjectConfig> {
    let mut loader = ConfigLoader::new();
    let config = match explicit {
        Some(path) => loader.load_from_file(path)?,
        None => loader.load_from_directory(&env::current_dir()?)?,
    };
    if let Some(root) = config.project_root() {
        tracing::debug!(root = %root.display(), "loaded gauge.toml");
    }
    Ok(config.project)
}

/// Harness settings: defaults, then the project file, then flags
pub fn resolve_settings(project: &ProjectConfig, flags: &Overrides) -> Result<HarnessSettings> {
    let mut settings = HarnessSettings::default();

    if let Some(n) = flags.iterations.or(project.iterations()) {
        settings.iterations = n;
    }
    if let Some(secs) = flags.stress_budget_secs.or(project.stress_budget_secs()) {
        settings.stress_budget = seconds("stress budget", secs)?;
    }
    if let Some(n) = flags.samples.or(project.samples()) {
        settings.samples = n;
    }
    if let Some(secs) = flags.interval_secs.or(project.interval_secs()) {
        settings.sample_interval = seconds("sample interval", secs)?;
    }
    if let Some(tolerance) = flags.leak_tolerance.or(project.leak_tolerance()) {
        settings.leak_tolerance = tolerance;
    }
    if let Some(cycles) = project.leak_cycles() {
        settings.leak_cycles = cycles;
    }
    if let Some(drift) = project.drift_warning() {
        settings.drift_warning = drift;
    }

    Ok(settings)
}

fn seconds(what: &str, secs: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(secs)
        .with_context(|| format!("{} of {} seconds is not a valid duration", what, secs))
}

/// Built-in weights with `[weights]` entries layered on top
pub fn resolve_weights(project: &ProjectConfig) -> WeightTable {
    let mut weights = suite::default_weights();
    if let Some(default) = project.default_weight() {
        weights = weights.with_default(default);
    }
    for (name, weight) in project.test_weights() {
        weights.set(name, weight);
    }
    weights
}

/// clap parser for second-valued flags
pub fn parse_seconds(raw: &str) -> Result<f64, String> {
    let secs: f64 = raw
        .parse()
        .map_err(|_| format!("'{}' is not a number", raw))?;
    if !secs.is_finite() || secs < 0.0 {
        return Err("must be a non-negative number of seconds".to_string());
    }
    Duration::try_from_secs_f64(secs).map_err(|_| "too large for a duration".to_string())?;
    Ok(secs)
}

/// clap parser for the leak tolerance fraction
pub fn parse_fraction(raw: &str) -> Result<f64, String> {
    let value: f64 = raw
        .parse()
        .map_err(|_| format!("'{}' is not a number", raw))?;
    if !value.is_finite() || value < 0.0 {
        return Err("must be a non-negative fraction, e.g. 0.2".to_string());
    }
    Ok(value)
}
