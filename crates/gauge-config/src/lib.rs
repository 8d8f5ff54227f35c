//! Gauge Configuration System
//!
//! Provides run configuration for the gauge harness:
//! - Project configuration (gauge.toml)
//! - Global user configuration (~/.gauge/config.toml)
//! - Environment variable overrides (GAUGE_*)
//!
//! # Configuration Hierarchy
//!
//! Configuration is loaded and merged in the following order (later overrides earlier):
//! 1. Global config (~/.gauge/config.toml)
//! 2. Project config (./gauge.toml, searched upwards)
//! 3. Environment variables (GAUGE_*)
//! 4. CLI flags (applied by the caller)
//!
//! # Example
//!
//! ```no_run
//! use gauge_config::ConfigLoader;
//! use std::path::Path;
//!
//! let mut loader = ConfigLoader::new();
//! let config = loader.load_from_directory(Path::new(".")).unwrap();
//! println!("iterations: {:?}", config.project.iterations());
//! ```

pub mod loader;
pub mod project;

use std::path::PathBuf;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid TOML syntax in {file}: {error}")]
    TomlParseError {
        file: PathBuf,
        error: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    ValidationError(String),

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Home directory not found")]
    HomeNotFound,
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Project configuration file name
pub const CONFIG_FILE_NAME: &str = "gauge.toml";

// Re-export main types
pub use loader::{Config, ConfigLoader};
pub use project::{MemoryConfig, ProjectConfig, RunConfig};
