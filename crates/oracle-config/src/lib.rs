//! Oracle Configuration System
//!
//! Provides configuration for the golden-output oracle:
//! - Corpus location and source extension
//! - Golden artifact naming (stdout/stderr suffixes)
//! - Reference and under-test tool invocations (`oracle.toml`)
//!
//! # Configuration Precedence
//!
//! Later sources override earlier ones:
//! 1. Built-in defaults (the fixed `test_source/*.fs` conventions)
//! 2. Project config (`oracle.toml`, found by walking up from the working directory)
//! 3. CLI flags (handled by the caller)
//!
//! # Example
//!
//! ```no_run
//! use oracle_config::ConfigLoader;
//! use std::path::Path;
//!
//! let loader = ConfigLoader::new();
//! let config = loader.load_from_directory(Path::new(".")).unwrap();
//! println!("corpus root: {}", config.corpus_root().display());
//! ```

pub mod loader;
pub mod settings;

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

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

pub use loader::{Config, ConfigLoader, CONFIG_FILE_NAME};
pub use settings::{OracleConfig, ToolSettings};
