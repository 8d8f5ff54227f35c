//! Project Configuration (gauge.toml)
//!
//! Handles run configuration stored in `gauge.toml` at the project root, or
//! in the global `~/.gauge/config.toml` which shares the same schema.
//!
//! ```toml
//! [run]
//! iterations = 500
//! stress_budget_secs = 2.0
//! filter = "property"
//!
//! [memory]
//! samples = 3
//! interval_secs = 0.5
//! leak_tolerance = 0.25
//!
//! [weights]
//! default = 1
//! create_part = 10
//! ```

use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

/// Key in `[weights]` that sets the fallback weight
pub const DEFAULT_WEIGHT_KEY: &str = "default";

/// Configuration from gauge.toml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Test execution settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run: Option<RunConfig>,

    /// Memory sampling and leak detection settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory: Option<MemoryConfig>,

    /// Per-test weights, keyed by test name
    #[serde(default)]
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub weights: BTreeMap<String, u32>,
}

/// `[run]` section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    /// Benchmark iterations per measurement
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iterations: Option<u32>,

    /// Wall-clock budget for stress measurements, in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stress_budget_secs: Option<f64>,

    /// Only run tests whose name contains this substring
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
}

/// `[memory]` section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct MemoryConfig {
    /// Number of samples taken after the run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub samples: Option<usize>,

    /// Pause between samples, in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval_secs: Option<f64>,

    /// Growth fraction above which a leak check fails
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leak_tolerance: Option<f64>,

    /// Cycles per leak check
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leak_cycles: Option<u32>,

    /// Absolute first-to-last drift that triggers the report warning
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drift_warning: Option<f64>,
}

impl ProjectConfig {
    /// Load project configuration from a file
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::IoError(e)
            }
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::TomlParseError {
            file: path.to_path_buf(),
            error: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(run) = &self.run {
            if run.iterations == Some(0) {
                return Err(invalid("run.iterations", "must be at least 1"));
            }
            if let Some(secs) = run.stress_budget_secs {
                check_seconds("run.stress_budget_secs", secs)?;
            }
        }

        if let Some(memory) = &self.memory {
            if let Some(secs) = memory.interval_secs {
                check_seconds("memory.interval_secs", secs)?;
            }
            if let Some(tolerance) = memory.leak_tolerance {
                check_non_negative("memory.leak_tolerance", tolerance)?;
            }
            if let Some(drift) = memory.drift_warning {
                check_non_negative("memory.drift_warning", drift)?;
            }
            if memory.leak_cycles == Some(0) {
                return Err(invalid("memory.leak_cycles", "must be at least 1"));
            }
        }

        if let Some((name, _)) = self.weights.iter().find(|(_, w)| **w == 0) {
            return Err(ConfigError::ValidationError(format!(
                "weight for '{}' must be a positive integer",
                name
            )));
        }

        Ok(())
    }

    pub fn iterations(&self) -> Option<u32> {
        self.run.as_ref().and_then(|r| r.iterations)
    }

    pub fn stress_budget_secs(&self) -> Option<f64> {
        self.run.as_ref().and_then(|r| r.stress_budget_secs)
    }

    pub fn filter(&self) -> Option<&str> {
        self.run.as_ref().and_then(|r| r.filter.as_deref())
    }

    pub fn samples(&self) -> Option<usize> {
        self.memory.as_ref().and_then(|m| m.samples)
    }

    pub fn interval_secs(&self) -> Option<f64> {
        self.memory.as_ref().and_then(|m| m.interval_secs)
    }

    pub fn leak_tolerance(&self) -> Option<f64> {
        self.memory.as_ref().and_then(|m| m.leak_tolerance)
    }

    pub fn leak_cycles(&self) -> Option<u32> {
        self.memory.as_ref().and_then(|m| m.leak_cycles)
    }

    pub fn drift_warning(&self) -> Option<f64> {
        self.memory.as_ref().and_then(|m| m.drift_warning)
    }

    /// The `default` entry of `[weights]`, if set
    pub fn default_weight(&self) -> Option<u32> {
        self.weights.get(DEFAULT_WEIGHT_KEY).copied()
    }

    /// Per-test weights, excluding the `default` entry
    pub fn test_weights(&self) -> impl Iterator<Item = (&str, u32)> {
        self.weights
            .iter()
            .filter(|(name, _)| name.as_str() != DEFAULT_WEIGHT_KEY)
            .map(|(name, weight)| (name.as_str(), *weight))
    }

    /// Merge another config into this one
    ///
    /// Fields set in `other` take precedence; weights are merged per key.
    pub fn merge(&mut self, other: &ProjectConfig) {
        if let Some(theirs) = &other.run {
            let ours = self.run.get_or_insert_with(RunConfig::default);
            overlay(&mut ours.iterations, theirs.iterations);
            overlay(&mut ours.stress_budget_secs, theirs.stress_budget_secs);
            overlay(&mut ours.filter, theirs.filter.clone());
        }
        if let Some(theirs) = &other.memory {
            let ours = self.memory.get_or_insert_with(MemoryConfig::default);
            overlay(&mut ours.samples, theirs.samples);
            overlay(&mut ours.interval_secs, theirs.interval_secs);
            overlay(&mut ours.leak_tolerance, theirs.leak_tolerance);
            overlay(&mut ours.leak_cycles, theirs.leak_cycles);
            overlay(&mut ours.drift_warning, theirs.drift_warning);
        }
        self.weights.extend(other.weights.clone());
    }
}

fn overlay<T>(target: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *target = value;
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

fn check_seconds(field: &str, secs: f64) -> ConfigResult<()> {
    if !secs.is_finite() || secs < 0.0 {
        return Err(invalid(field, "must be a non-negative number of seconds"));
    }
    if Duration::try_from_secs_f64(secs).is_err() {
        return Err(invalid(field, "too large for a duration"));
    }
    Ok(())
}

fn check_non_negative(field: &str, value: f64) -> ConfigResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(invalid(field, "must be a non-negative number"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_config() {
        let config: ProjectConfig = toml::from_str("").unwrap();
        assert_eq!(config, ProjectConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
            [run]
            iterations = 250
            stress_budget_secs = 1.5
            filter = "bench"

            [memory]
            samples = 3
            interval_secs = 0.25
            leak_tolerance = 0.1
            leak_cycles = 40
            drift_warning = 2.0

            [weights]
            default = 2
            create_part = 10
        "#;

        let config: ProjectConfig = toml::from_str(toml).unwrap();
        config.validate().unwrap();

        assert_eq!(config.iterations(), Some(250));
        assert_eq!(config.stress_budget_secs(), Some(1.5));
        assert_eq!(config.filter(), Some("bench"));
        assert_eq!(config.samples(), Some(3));
        assert_eq!(config.interval_secs(), Some(0.25));
        assert_eq!(config.leak_tolerance(), Some(0.1));
        assert_eq!(config.leak_cycles(), Some(40));
        assert_eq!(config.drift_warning(), Some(2.0));
        assert_eq!(config.default_weight(), Some(2));
        let weights: Vec<_> = config.test_weights().collect();
        assert_eq!(weights, vec![("create_part", 10)]);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result: Result<ProjectConfig, _> = toml::from_str("[run]\nthreads = 4\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_weight_rejected() {
        let config: ProjectConfig = toml::from_str("[weights]\nslow_path = 0\n").unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("slow_path"));
    }

    #[test]
    fn test_zero_iterations_rejected() {
        let config: ProjectConfig = toml::from_str("[run]\niterations = 0\n").unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "run.iterations"
        ));
    }

    #[test]
    fn test_negative_interval_rejected() {
        let config: ProjectConfig = toml::from_str("[memory]\ninterval_secs = -1.0\n").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_oversized_seconds_rejected() {
        let config: ProjectConfig = toml::from_str("[memory]\ninterval_secs = 1e30\n").unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "memory.interval_secs"
        ));

        let config: ProjectConfig =
            toml::from_str("[run]\nstress_budget_secs = 1e300\n").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_merge_configs() {
        let mut base: ProjectConfig = toml::from_str(
            "[run]\niterations = 100\nfilter = \"a\"\n[weights]\nx = 1\ny = 2\n",
        )
        .unwrap();
        let other: ProjectConfig =
            toml::from_str("[run]\niterations = 7\n[memory]\nsamples = 2\n[weights]\ny = 9\n")
                .unwrap();

        base.merge(&other);

        assert_eq!(base.iterations(), Some(7));
        assert_eq!(base.filter(), Some("a"));
        assert_eq!(base.samples(), Some(2));
        assert_eq!(base.weights.get("x"), Some(&1));
        assert_eq!(base.weights.get("y"), Some(&9));
    }
}
