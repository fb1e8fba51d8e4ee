//! TOML Configuration Management
//!
//! Reads, validates and writes the orchestrator configuration file.

use std::fs;
use std::path::{Path, PathBuf};

use gatekeeper_quality_gates::environment::DEFAULT_BUILD_ID_VARS;
use gatekeeper_quality_gates::{ThresholdConfiguration, ValidationRules, DEFAULT_HISTORY_CAPACITY};
use serde::{Deserialize, Serialize};

use crate::utils::error::{AppError, AppResult};

/// Environment variable overriding `history_capacity`.
pub const HISTORY_CAPACITY_ENV: &str = "GATEKEEPER_HISTORY_CAPACITY";

/// Orchestrator settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Maximum number of execution records kept in memory
    pub history_capacity: usize,
    /// Number of recent records shown in generated reports
    pub report_history_limit: usize,
    /// Environment variables checked, in order, for the build identifier
    pub build_id_env_vars: Vec<String>,
    /// Bounds for the configuration validator's metadata checks
    pub validation: ValidationRules,
    /// Initial failure thresholds
    pub thresholds: ThresholdConfiguration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            report_history_limit: 10,
            build_id_env_vars: DEFAULT_BUILD_ID_VARS.iter().map(|v| v.to_string()).collect(),
            validation: ValidationRules::default(),
            thresholds: ThresholdConfiguration::default(),
        }
    }
}

impl OrchestratorConfig {
    /// Check the configuration for values the orchestrator cannot work with.
    pub fn validate(&self) -> Result<(), String> {
        if self.history_capacity == 0 {
            return Err("history_capacity must be at least 1".to_string());
        }
        if self.validation.min_priority > self.validation.max_priority {
            return Err(format!(
                "validation.min_priority ({}) must not exceed validation.max_priority ({})",
                self.validation.min_priority, self.validation.max_priority
            ));
        }
        if self.build_id_env_vars.iter().any(|v| v.trim().is_empty()) {
            return Err("build_id_env_vars must not contain empty names".to_string());
        }
        self.thresholds.validate().map_err(|e| e.to_string())
    }

    /// Apply environment overrides on top of file values.
    pub fn apply_env_overrides(&mut self) -> AppResult<()> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    fn apply_overrides_from<F>(&mut self, lookup: F) -> AppResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(HISTORY_CAPACITY_ENV) {
            self.history_capacity = raw.trim().parse().map_err(|_| {
                AppError::config(format!(
                    "{} must be a positive integer, got '{}'",
                    HISTORY_CAPACITY_ENV, raw
                ))
            })?;
        }
        Ok(())
    }
}

/// Configuration service for loading and saving orchestrator settings
#[derive(Debug)]
pub struct ConfigService {
    config_path: PathBuf,
    config: OrchestratorConfig,
}

impl ConfigService {
    /// Load configuration from `path`, writing defaults there if it does not exist.
    pub fn open(path: impl AsRef<Path>) -> AppResult<Self> {
        let config_path = path.as_ref().to_path_buf();
        let config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            let default_config = OrchestratorConfig::default();
            Self::save_to_file(&config_path, &default_config)?;
            default_config
        };

        Ok(Self {
            config_path,
            config,
        })
    }

    /// Parse and validate a configuration document.
    pub fn from_toml_str(content: &str) -> AppResult<OrchestratorConfig> {
        let config: OrchestratorConfig = toml::from_str(content)?;
        config.validate().map_err(AppError::config)?;
        Ok(config)
    }

    /// Load configuration from a file
    pub fn load_from_file(path: &Path) -> AppResult<OrchestratorConfig> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Save configuration to a file
    pub fn save_to_file(path: &Path, config: &OrchestratorConfig) -> AppResult<()> {
        config.validate().map_err(AppError::config)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let content = toml::to_string_pretty(config)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Get the current configuration
    pub fn get_config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Get a clone of the current configuration with environment overrides applied
    pub fn effective_config(&self) -> AppResult<OrchestratorConfig> {
        let mut config = self.config.clone();
        config.apply_env_overrides()?;
        config.validate().map_err(AppError::config)?;
        Ok(config)
    }

    /// Replace the configuration and persist it
    pub fn update_config(&mut self, config: OrchestratorConfig) -> AppResult<()> {
        Self::save_to_file(&self.config_path, &config)?;
        self.config = config;
        Ok(())
    }

    /// Reload configuration from disk
    pub fn reload(&mut self) -> AppResult<()> {
        self.config = Self::load_from_file(&self.config_path)?;
        Ok(())
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.config_path
    }
}
