//! Configuration for the execution engine, the orchestrator and logging.

use core::time::Duration;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use dirs::home_dir;
use serde::{Deserialize, Serialize};
use toml::{from_str, to_string_pretty};
use tracing::debug;

use crate::error::{Error, Result};
use crate::task::FailFastPolicy;

/// Environment variable overriding [`EngineConfig::max_concurrent_tasks`].
pub const MAX_CONCURRENT_ENV: &str = "HEYDAV_MAX_CONCURRENT_TASKS";
/// Environment variable overriding [`LoggingConfig::filter`].
pub const LOG_FILTER_ENV: &str = "HEYDAV_LOG";

/// Complete pipeline configuration.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeyDavConfig {
    /// Execution engine settings
    pub engine: EngineConfig,
    /// Orchestrator settings
    pub orchestrator: OrchestratorConfig,
    /// Logging settings
    pub logging: LoggingConfig,
}

/// Execution engine settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Global cap on tasks inside processors at once
    pub max_concurrent_tasks: usize,
    /// Interval of the concurrency sampler, in seconds
    pub metrics_interval_secs: u64,
    /// Pause between chunks in batch mode, in milliseconds
    pub batch_pause_ms: u64,
    /// Apply the strategy's per-task timeout as a hard deadline
    pub enforce_task_timeout: bool,
    /// Events buffered per subscriber
    pub event_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_tasks: 5,
            metrics_interval_secs: 30,
            batch_pause_ms: 1000,
            enforce_task_timeout: true,
            event_capacity: 256,
        }
    }
}

impl EngineConfig {
    /// Sampler interval as a duration (at least one second).
    pub fn metrics_interval(&self) -> Duration {
        Duration::from_secs(self.metrics_interval_secs.max(1))
    }

    /// Pause between batch chunks.
    pub fn batch_pause(&self) -> Duration {
        Duration::from_millis(self.batch_pause_ms)
    }
}

/// Orchestrator settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Source recorded on commands the orchestrator derives
    pub source_name: String,
    /// Fail-fast policy applied to every submitted strategy
    pub fail_fast: FailFastPolicy,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            source_name: "orchestrator".to_owned(),
            fail_fast: FailFastPolicy::Critical {
                priority_threshold: 5,
            },
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing` filter directives, overridden by `RUST_LOG`
    pub filter: String,
    /// Colored output
    pub ansi: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "heydav_core=info,heydav_analysis=info,heydav_agent=info".to_owned(),
            ansi: true,
        }
    }
}

impl HeyDavConfig {
    /// Get the default config directory path (`~/.heydav`)
    ///
    /// # Errors
    /// Returns an error if the home directory cannot be determined
    pub fn config_dir() -> Result<PathBuf> {
        let home = home_dir()
            .ok_or_else(|| Error::Config("Could not determine home directory".to_owned()))?;
        Ok(home.join(".heydav"))
    }

    /// Get the default config file path (`~/.heydav/config.toml`)
    ///
    /// # Errors
    /// Returns an error if the home directory cannot be determined
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load config from the default location, creating it with defaults if missing.
    ///
    /// # Errors
    /// Returns an error if the config cannot be read or created
    pub fn load_or_create() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::load_from_file(&config_path)
        } else {
            let config = Self::default();
            config.save_to_file(&config_path)?;
            Ok(config)
        }
    }

    /// Load config from a specific file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Self = from_str(&contents)?;
        debug!(
            "Loaded config from {:?}: max_concurrent_tasks={}",
            path, config.engine.max_concurrent_tasks
        );
        Ok(config)
    }

    /// Save config to a specific file
    ///
    /// # Errors
    /// Returns an error if the file cannot be written
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = to_string_pretty(self)?;
        let header = "# HeyDav Configuration File\n\
                      # Edit this file to customize engine and logging settings\n\n";
        fs::write(path, format!("{header}{contents}"))?;
        Ok(())
    }

    /// Applies overrides from the process environment.
    ///
    /// # Errors
    /// Returns an error if an override has an invalid value
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_env_overrides_with(|key| env::var(key).ok())
    }

    /// Applies overrides read through `lookup`.
    ///
    /// # Errors
    /// Returns an error if an override has an invalid value
    pub fn apply_env_overrides_with<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(MAX_CONCURRENT_ENV) {
            let parsed: usize = raw.trim().parse().map_err(|error| {
                Error::Config(format!("{MAX_CONCURRENT_ENV} must be a number: {error}"))
            })?;
            if parsed == 0 {
                return Err(Error::Config(format!(
                    "{MAX_CONCURRENT_ENV} must be at least 1"
                )));
            }
            self.engine.max_concurrent_tasks = parsed;
        }

        if let Some(filter) = lookup(LOG_FILTER_ENV) {
            self.logging.filter = filter;
        }

        Ok(())
    }
}
