//! Configuration loading from TOML.
//!
//! Reads `config.toml` (or the file named by `TEAMBALANCE_CONFIG`) and
//! deserializes it into strongly-typed structs.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::engine::{BalancerLimits, DEFAULT_MAX_PARTICIPANTS};

/// Environment variable naming an alternative config file.
pub const CONFIG_PATH_ENV: &str = "TEAMBALANCE_CONFIG";

const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub balancer: BalancerConfig,
    pub roster: RosterConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BalancerConfig {
    pub num_teams: usize,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_max_participants")]
    pub max_participants: usize,
    /// Search deadline. No deadline when absent.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RosterConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

fn default_top_k() -> usize {
    3
}

fn default_max_participants() -> usize {
    DEFAULT_MAX_PARTICIPANTS
}

impl BalancerConfig {
    pub fn limits(&self) -> BalancerLimits {
        BalancerLimits {
            max_participants: self.max_participants,
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        Self::parse(&contents).with_context(|| format!("Failed to parse config file: {path}"))
    }

    /// Load from `$TEAMBALANCE_CONFIG`, falling back to `config.toml`.
    pub fn load_default() -> Result<Self> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::load(&path)
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Catch obviously bad values before any work starts. The balancer
    /// re-checks the request against the actual roster.
    fn validate(&self) -> Result<()> {
        if self.balancer.num_teams < 2 {
            bail!("balancer.num_teams must be at least 2");
        }
        if self.balancer.top_k == 0 {
            bail!("balancer.top_k must be at least 1");
        }
        if self.balancer.timeout_secs == Some(0) {
            bail!("balancer.timeout_secs must be positive when set");
        }
        Ok(())
    }
}
