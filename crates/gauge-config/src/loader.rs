//! Configuration Loader
//!
//! Handles loading and merging configuration from multiple sources with proper precedence.

use crate::project::ProjectConfig;
use crate::{ConfigError, ConfigResult, CONFIG_FILE_NAME};
use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Configuration loader
///
/// Loads configuration from multiple sources and merges them with proper precedence:
/// 1. Global config (~/.gauge/config.toml) - lowest priority
/// 2. Project config (./gauge.toml) - overrides global
/// 3. Environment variables (GAUGE_*) - overrides project
/// 4. CLI flags - highest priority (handled by caller)
pub struct ConfigLoader {
    /// Cached global config path
    global_config_path: Option<PathBuf>,
}

/// Merged configuration result
#[derive(Debug, Clone)]
pub struct Config {
    /// Effective configuration after merging every source
    pub project: ProjectConfig,

    /// Project root directory (where gauge.toml was found)
    pub project_root: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self {
            global_config_path: None,
        }
    }

    /// Use `path` instead of ~/.gauge/config.toml as the global config
    pub fn with_global_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.global_config_path = Some(path.into());
        self
    }

    /// Load configuration starting from the given directory
    ///
    /// Walks up the directory tree to find gauge.toml, layers it over the
    /// global config, then applies environment overrides.
    pub fn load_from_directory(&mut self, start_dir: &Path) -> ConfigResult<Config> {
        let (project_root, project_config) = self.find_project_config(start_dir)?;
        let merged = self.layer(project_config)?;

        Ok(Config {
            project: merged,
            project_root,
        })
    }

    /// Load configuration from a specific project config file
    pub fn load_from_file(&mut self, config_path: &Path) -> ConfigResult<Config> {
        let project_config = ProjectConfig::load_from_file(config_path)?;
        let merged = self.layer(project_config)?;

        let project_root = config_path.parent().map(|p| p.to_path_buf());

        Ok(Config {
            project: merged,
            project_root,
        })
    }

    fn layer(&mut self, project_config: ProjectConfig) -> ConfigResult<ProjectConfig> {
        let mut merged = self.load_global_config()?;
        merged.merge(&project_config);
        let merged = self.apply_env_overrides(merged)?;
        merged.validate()?;
        Ok(merged)
    }

    /// Find project configuration by walking up directory tree
    ///
    /// Returns (project_root, project_config); defaults when no file is found.
    fn find_project_config(
        &self,
        start_dir: &Path,
    ) -> ConfigResult<(Option<PathBuf>, ProjectConfig)> {
        let mut current = start_dir.to_path_buf();

        loop {
            let config_path = current.join(CONFIG_FILE_NAME);

            if config_path.exists() {
                let project_config = ProjectConfig::load_from_file(&config_path)?;
                return Ok((Some(current), project_config));
            }

            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => return Ok((None, ProjectConfig::default())),
            }
        }
    }

    /// Load global configuration from ~/.gauge/config.toml
    ///
    /// A missing file or home directory yields the defaults.
    fn load_global_config(&mut self) -> ConfigResult<ProjectConfig> {
        let path = match &self.global_config_path {
            Some(path) => path.clone(),
            None => match Self::global_config_path() {
                Ok(path) => {
                    self.global_config_path = Some(path.clone());
                    path
                }
                Err(ConfigError::HomeNotFound) => return Ok(ProjectConfig::default()),
                Err(e) => return Err(e),
            },
        };

        if !path.exists() {
            return Ok(ProjectConfig::default());
        }

        ProjectConfig::load_from_file(&path)
    }

    /// Apply environment variable overrides
    ///
    /// Recognized: GAUGE_ITERATIONS, GAUGE_STRESS_BUDGET_SECS, GAUGE_FILTER,
    /// GAUGE_SAMPLES, GAUGE_SAMPLE_INTERVAL_SECS, GAUGE_LEAK_TOLERANCE.
    fn apply_env_overrides(&self, mut config: ProjectConfig) -> ConfigResult<ProjectConfig> {
        if let Some(iterations) = parse_env("GAUGE_ITERATIONS")? {
            config.run.get_or_insert_with(Default::default).iterations = Some(iterations);
        }
        if let Some(secs) = parse_env("GAUGE_STRESS_BUDGET_SECS")? {
            config
                .run
                .get_or_insert_with(Default::default)
                .stress_budget_secs = Some(secs);
        }
        if let Ok(filter) = env::var("GAUGE_FILTER") {
            config.run.get_or_insert_with(Default::default).filter = Some(filter);
        }
        if let Some(samples) = parse_env("GAUGE_SAMPLES")? {
            config.memory.get_or_insert_with(Default::default).samples = Some(samples);
        }
        if let Some(secs) = parse_env("GAUGE_SAMPLE_INTERVAL_SECS")? {
            config.memory.get_or_insert_with(Default::default).interval_secs = Some(secs);
        }
        if let Some(tolerance) = parse_env("GAUGE_LEAK_TOLERANCE")? {
            config
                .memory
                .get_or_insert_with(Default::default)
                .leak_tolerance = Some(tolerance);
        }

        Ok(config)
    }

    /// Get the global configuration file path (~/.gauge/config.toml)
    pub fn global_config_path() -> ConfigResult<PathBuf> {
        let home = dirs::home_dir().ok_or(ConfigError::HomeNotFound)?;
        Ok(home.join(".gauge").join("config.toml"))
    }
}

fn parse_env<T: FromStr>(var: &str) -> ConfigResult<Option<T>> {
    match env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                field: var.to_string(),
                reason: format!("cannot parse '{}'", raw),
            }),
        Err(_) => Ok(None),
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    /// Get the project root directory
    pub fn project_root(&self) -> Option<&Path> {
        self.project_root.as_deref()
    }

    /// Check if this is a project (has gauge.toml)
    pub fn is_project(&self) -> bool {
        self.project_root.is_some()
    }
}
