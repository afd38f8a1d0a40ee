//! Orchestrator configuration: TOML-loadable settings for the provider
//! region, object-store bucket, fan-out ceiling, and job defaults (spec §6
//! "Environment configuration used by the core").
//!
//! Grounded directly on the teacher's `config::Config`: same
//! `load`/`save`/`default_path`/`load_or_default` quartet, same nested
//! `#[derive(Default)]` struct-per-concern layout.
//!
//! # Examples
//!
//! ```
//! use fleetbench::config::OrchestratorConfig;
//!
//! let config = OrchestratorConfig::default();
//! assert_eq!(config.launch.max_concurrent_launches, 8);
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub launch: LaunchConfig,
    #[serde(default)]
    pub job_defaults: JobDefaultsConfig,
}

impl OrchestratorConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let config: OrchestratorConfig = toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self).context("failed to serialize config")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create config directory: {}", parent.display()))?;
        }
        std::fs::write(path, contents)
            .with_context(|| format!("failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// `~/.config/fleetbench/config.toml` on Unix, `%APPDATA%\fleetbench\config.toml`
    /// on Windows.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("fleetbench")
            .join("config.toml")
    }

    pub fn load_or_default() -> Self {
        let path = Self::default_path();
        if path.exists() {
            Self::load(&path).unwrap_or_default()
        } else {
            Self::default()
        }
    }
}

/// Cloud provider connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub region: String,
    pub bucket: String,
    /// Key prefix every job is nested under (spec §6: "job-name prefix").
    pub job_prefix: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            region: "us-east-1".to_string(),
            bucket: "fleetbench-results".to_string(),
            job_prefix: "benchmarks".to_string(),
        }
    }
}

/// Launcher fan-out and retry policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchConfig {
    /// Semaphore ceiling bounding concurrent launches (spec §4.4, §5:
    /// "default 5-10").
    pub max_concurrent_launches: usize,
    /// Retry budget for transient provider errors (spec §7, default 3).
    pub retry_budget: u32,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            max_concurrent_launches: 8,
            retry_budget: 3,
        }
    }
}

/// Defaults applied to a job descriptor when the caller does not specify
/// one explicitly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobDefaultsConfig {
    #[serde(with = "humantime_serde")]
    pub max_runtime: Duration,
    pub iteration_count: u32,
}

impl Default for JobDefaultsConfig {
    fn default() -> Self {
        Self {
            max_runtime: Duration::from_secs(900),
            iteration_count: 3,
        }
    }
}
