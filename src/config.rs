//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! The upstream shared secret is referenced by env-var name in the config
//! and resolved at runtime via `std::env::var`.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::time::Duration;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub schedule: ScheduleConfig,
    pub providers: ProvidersConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    pub port: u16,
}

/// Polling cadence and the daily racing window (UTC hours, inclusive).
#[derive(Debug, Deserialize, Clone)]
pub struct ScheduleConfig {
    pub start_hour: u32,
    pub end_hour: u32,
    pub active_interval_secs: u64,
    pub idle_interval_secs: u64,
    #[serde(default = "default_error_delay")]
    pub error_delay_secs: u64,
    /// Run one update cycle before the scheduler starts, regardless of hour.
    #[serde(default = "default_true")]
    pub prime_on_startup: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProvidersConfig {
    /// Env var holding the shared secret sent to both upstreams.
    pub secret_env: String,
    #[serde(default = "default_secret_header")]
    pub secret_header: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    pub bet365: ProviderEndpoint,
    pub william_hill: ProviderEndpoint,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProviderEndpoint {
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub url: String,
}

fn default_bind() -> String {
    "0.0.0.0".to_string()
}

fn default_error_delay() -> u64 {
    5
}

fn default_true() -> bool {
    true
}

fn default_secret_header() -> String {
    "x-rapidapi-proxy-secret".to_string()
}

fn default_timeout() -> u64 {
    10
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        Self::from_toml(&contents).with_context(|| format!("Invalid config file: {path}"))
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: AppConfig =
            toml::from_str(contents).context("Failed to parse config TOML")?;
        config.validate()?;
        Ok(config)
    }

    /// Resolve an environment variable name to its value.
    /// Useful for loading secrets referenced in the config.
    pub fn resolve_env(env_name: &str) -> Result<String> {
        std::env::var(env_name)
            .with_context(|| format!("Environment variable not set: {env_name}"))
    }

    fn validate(&self) -> Result<()> {
        let s = &self.schedule;
        if s.start_hour > 23 || s.end_hour > 23 {
            anyhow::bail!(
                "schedule hours must be within 0-23 (got {}-{})",
                s.start_hour,
                s.end_hour
            );
        }
        if s.start_hour > s.end_hour {
            anyhow::bail!(
                "schedule.start_hour ({}) is after schedule.end_hour ({})",
                s.start_hour,
                s.end_hour
            );
        }
        if s.active_interval_secs == 0 || s.idle_interval_secs == 0 || s.error_delay_secs == 0 {
            anyhow::bail!("schedule intervals must be non-zero");
        }
        if self.providers.timeout_secs == 0 {
            anyhow::bail!("providers.timeout_secs must be non-zero");
        }
        Ok(())
    }
}

impl ScheduleConfig {
    pub fn active_interval(&self) -> Duration {
        Duration::from_secs(self.active_interval_secs)
    }

    pub fn idle_interval(&self) -> Duration {
        Duration::from_secs(self.idle_interval_secs)
    }

    pub fn error_delay(&self) -> Duration {
        Duration::from_secs(self.error_delay_secs)
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            start_hour: 7,
            end_hour: 21,
            active_interval_secs: 5,
            idle_interval_secs: 300,
            error_delay_secs: default_error_delay(),
            prime_on_startup: true,
        }
    }
}
