//! Configuration for pipeline runs.
//!
//! This module provides the run-facing configuration surface:
//!
//! - [`PipelineConfig`] – the full configuration: run parameters plus the
//!   per-content-kind step table
//! - [`ConfigBuilder`] – builder loading from files, env vars, and
//!   overrides
//! - [`InputHandlerKind`] – which input source a run enumerates
//!
//! ## Configuration Hierarchy
//!
//! Settings are resolved in the following order (later wins):
//!
//! 1. Compiled defaults
//! 2. Config file (`lexmill.toml`, `.yaml`, or `.json`)
//! 3. Environment variables (`LEXMILL_*`)
//!
//! ## Example
//!
//! ```rust,ignore
//! use lexmill::config::ConfigBuilder;
//!
//! let config = ConfigBuilder::new()
//!     .with_file("lexmill.toml")?
//!     .with_env()
//!     .build()?;
//!
//! assert_eq!(config.run.limit, 20);
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use validator::Validate;

use crate::pipeline::controller::ALL_STEPS;

/// Errors that can occur while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file
    #[error("Failed to read config file at {path}: {source}")]
    FileRead {
        /// Path that failed to read
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Failed to parse configuration
    #[error("Failed to parse {format} config: {source}")]
    ParseError {
        /// Format that failed to parse (YAML, TOML, JSON)
        format: String,
        /// Underlying parse error
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Unsupported or unrecognised configuration file extension
    #[error("Unsupported config file format: {message}")]
    UnsupportedFormat {
        /// Description of the problem
        message: String,
    },

    /// Configuration validation failed
    #[error("Config validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    /// Environment variable parsing error
    #[error("Failed to parse environment variable {key}: {message}")]
    EnvParse {
        /// Environment variable key
        key: String,
        /// Error message
        message: String,
    },
}

/// Which input source a run enumerates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputHandlerKind {
    /// Filesystem input (JSON files and directories)
    Fs,
    /// Database input (document store records)
    Database,
}

impl Default for InputHandlerKind {
    fn default() -> Self {
        Self::Fs
    }
}

fn default_limit() -> i64 {
    20
}

fn default_steps() -> Vec<String> {
    vec![ALL_STEPS.to_owned()]
}

/// Parameters for one pipeline run
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RunConfig {
    /// Input source for the run
    #[serde(default)]
    pub input_handler: InputHandlerKind,

    /// Input selector paths (files or directories; filesystem input only)
    #[serde(default)]
    pub input: Vec<PathBuf>,

    /// Maximum number of inputs to take after `start` (≤ 0 means unbounded)
    #[serde(default = "default_limit")]
    pub limit: i64,

    /// Number of enumerated inputs to skip before applying `limit`
    #[serde(default)]
    pub start: usize,

    /// Requested step names; the `all` sentinel selects every configured
    /// step for the content kind
    #[serde(default = "default_steps")]
    #[validate(length(min = 1))]
    pub steps: Vec<String>,

    /// Destructively reset sink-owned state before processing
    #[serde(default)]
    pub empty: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            input_handler: InputHandlerKind::default(),
            input: Vec::new(),
            limit: default_limit(),
            start: 0,
            steps: default_steps(),
            empty: false,
        }
    }
}

fn default_step_table() -> HashMap<String, Vec<String>> {
    let mut table = HashMap::new();
    table.insert(
        "case".to_owned(),
        vec![
            "normalize".to_owned(),
            "assign_court".to_owned(),
            "extract_refs".to_owned(),
            "set_private_false".to_owned(),
        ],
    );
    table
}

/// Full pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PipelineConfig {
    /// Run parameters
    #[serde(default)]
    #[validate(nested)]
    pub run: RunConfig,

    /// Step table: content kind to ordered step names
    #[serde(default = "default_step_table")]
    pub steps: HashMap<String, Vec<String>>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            run: RunConfig::default(),
            steps: default_step_table(),
        }
    }
}

/// Builder for constructing pipeline configuration from multiple sources
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    base: PipelineConfig,
    use_env: bool,
}

impl ConfigBuilder {
    /// Create a new config builder with compiled defaults
    #[must_use]
    pub fn new() -> Self {
        Self {
            base: PipelineConfig::default(),
            use_env: false,
        }
    }

    /// Load configuration from a file (YAML, TOML, or JSON)
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;

        let config: PipelineConfig = match path.extension().and_then(|e| e.to_str()) {
            Some("yaml" | "yml") => {
                serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
                    format: "YAML".to_string(),
                    source: Box::new(e),
                })?
            }
            Some("toml") => toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                format: "TOML".to_string(),
                source: Box::new(e),
            })?,
            Some("json") => {
                serde_json::from_str(&content).map_err(|e| ConfigError::ParseError {
                    format: "JSON".to_string(),
                    source: Box::new(e),
                })?
            }
            _ => {
                return Err(ConfigError::UnsupportedFormat {
                    message: "file extension must be .yaml, .yml, .toml, or .json".to_string(),
                });
            }
        };

        self.base = config;
        Ok(self)
    }

    /// Enable loading overrides from environment variables
    ///
    /// Looks for variables prefixed with `LEXMILL_`, e.g.:
    /// - `LEXMILL_LIMIT=50`
    /// - `LEXMILL_START=10`
    /// - `LEXMILL_INPUT_HANDLER=database`
    /// - `LEXMILL_STEPS=normalize,extract_refs`
    /// - `LEXMILL_EMPTY=true`
    #[must_use]
    pub fn with_env(mut self) -> Self {
        self.use_env = true;
        self
    }

    /// Build the final configuration
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if validation fails or environment
    /// variables are invalid
    pub fn build(mut self) -> Result<PipelineConfig, ConfigError> {
        if self.use_env {
            dotenvy::dotenv().ok(); // Load .env file if present

            if let Ok(limit) = std::env::var("LEXMILL_LIMIT") {
                self.base.run.limit = limit.parse().map_err(|_| ConfigError::EnvParse {
                    key: "LEXMILL_LIMIT".to_string(),
                    message: "Must be an integer".to_string(),
                })?;
            }

            if let Ok(start) = std::env::var("LEXMILL_START") {
                self.base.run.start = start.parse().map_err(|_| ConfigError::EnvParse {
                    key: "LEXMILL_START".to_string(),
                    message: "Must be a non-negative integer".to_string(),
                })?;
            }

            if let Ok(empty) = std::env::var("LEXMILL_EMPTY") {
                self.base.run.empty = empty.parse().map_err(|_| ConfigError::EnvParse {
                    key: "LEXMILL_EMPTY".to_string(),
                    message: "Must be 'true' or 'false'".to_string(),
                })?;
            }

            if let Ok(handler) = std::env::var("LEXMILL_INPUT_HANDLER") {
                self.base.run.input_handler = match handler.to_lowercase().as_str() {
                    "fs" => InputHandlerKind::Fs,
                    "database" | "db" => InputHandlerKind::Database,
                    _ => {
                        return Err(ConfigError::EnvParse {
                            key: "LEXMILL_INPUT_HANDLER".to_string(),
                            message: "Must be 'fs' or 'database'".to_string(),
                        });
                    }
                };
            }

            if let Ok(steps) = std::env::var("LEXMILL_STEPS") {
                let steps: Vec<String> = steps
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_owned)
                    .collect();
                if steps.is_empty() {
                    return Err(ConfigError::EnvParse {
                        key: "LEXMILL_STEPS".to_string(),
                        message: "Must name at least one step".to_string(),
                    });
                }
                self.base.run.steps = steps;
            }
        }

        self.base.validate()?;

        Ok(self.base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.run.limit, 20);
        assert_eq!(config.run.start, 0);
        assert_eq!(config.run.steps, vec!["all"]);
        assert_eq!(config.run.input_handler, InputHandlerKind::Fs);
        assert!(!config.run.empty);
        assert!(config.steps.contains_key("case"));
    }

    #[test]
    fn test_config_builder() {
        let config = ConfigBuilder::new().build().unwrap();
        assert_eq!(config.run.limit, 20);
    }

    #[test]
    fn test_toml_round_trip() {
        let config = PipelineConfig::default();
        let toml = toml::to_string(&config).unwrap();
        let parsed: PipelineConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.run.limit, config.run.limit);
        assert_eq!(parsed.steps, config.steps);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let parsed: PipelineConfig = toml::from_str("[run]\nlimit = 5\n").unwrap();
        assert_eq!(parsed.run.limit, 5);
        assert_eq!(parsed.run.steps, vec!["all"]);
        assert!(parsed.steps.contains_key("case"));
    }

    #[test]
    fn test_input_handler_kind_serialization() {
        let json = serde_json::to_string(&InputHandlerKind::Database).unwrap();
        assert_eq!(json, r#""database""#);

        let parsed: InputHandlerKind = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, InputHandlerKind::Database);
    }

    #[test]
    fn test_empty_steps_fail_validation() {
        let mut config = PipelineConfig::default();
        config.run.steps.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_with_file_toml() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("lexmill.toml");
        std::fs::write(
            &path,
            "[run]\n\
             input_handler = \"database\"\n\
             limit = 7\n\
             steps = [\"normalize\", \"extract_refs\"]\n\
             \n\
             [steps]\n\
             case = [\"normalize\", \"extract_refs\"]\n",
        )
        .unwrap();

        let config = ConfigBuilder::new().with_file(&path).unwrap().build().unwrap();
        assert_eq!(config.run.input_handler, InputHandlerKind::Database);
        assert_eq!(config.run.limit, 7);
        assert_eq!(config.run.steps, vec!["normalize", "extract_refs"]);
        assert_eq!(config.steps["case"], vec!["normalize", "extract_refs"]);
    }

    #[test]
    fn test_with_file_yaml_fills_missing_sections_with_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("lexmill.yaml");
        std::fs::write(&path, "run:\n  limit: 3\n  start: 1\n").unwrap();

        let config = ConfigBuilder::new().with_file(&path).unwrap().build().unwrap();
        assert_eq!(config.run.limit, 3);
        assert_eq!(config.run.start, 1);
        assert_eq!(config.run.steps, vec!["all"]);
        assert!(config.steps.contains_key("case"));
    }

    #[test]
    fn test_with_file_rejects_unknown_extension() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("lexmill.ini");
        std::fs::write(&path, "limit = 7").unwrap();

        let err = ConfigBuilder::new()
            .with_file(&path)
            .err()
            .expect("ini should be rejected");
        assert!(matches!(err, ConfigError::UnsupportedFormat { .. }));
    }

    #[test]
    fn test_with_file_missing_file_is_a_read_error() {
        let err = ConfigBuilder::new()
            .with_file("/nonexistent/lexmill.toml")
            .err()
            .expect("missing file should fail");
        assert!(matches!(err, ConfigError::FileRead { .. }));
    }

    // Env overrides share process state, so the valid and invalid cases
    // run in one test to avoid interleaving with each other.
    #[test]
    fn test_env_overrides() {
        std::env::set_var("LEXMILL_LIMIT", "50");
        std::env::set_var("LEXMILL_INPUT_HANDLER", "db");
        std::env::set_var("LEXMILL_STEPS", "normalize, extract_refs");
        std::env::set_var("LEXMILL_EMPTY", "true");

        let config = ConfigBuilder::new().with_env().build().unwrap();
        assert_eq!(config.run.limit, 50);
        assert_eq!(config.run.input_handler, InputHandlerKind::Database);
        assert_eq!(config.run.steps, vec!["normalize", "extract_refs"]);
        assert!(config.run.empty);

        std::env::set_var("LEXMILL_LIMIT", "not-a-number");
        let err = ConfigBuilder::new()
            .with_env()
            .build()
            .err()
            .expect("bad limit should fail");
        match err {
            ConfigError::EnvParse { key, .. } => assert_eq!(key, "LEXMILL_LIMIT"),
            other => panic!("expected EnvParse, got {other}"),
        }

        std::env::remove_var("LEXMILL_LIMIT");
        std::env::remove_var("LEXMILL_INPUT_HANDLER");
        std::env::remove_var("LEXMILL_STEPS");
        std::env::remove_var("LEXMILL_EMPTY");

        // Without the variables the defaults are back.
        let config = ConfigBuilder::new().with_env().build().unwrap();
        assert_eq!(config.run.limit, 20);
    }
}
