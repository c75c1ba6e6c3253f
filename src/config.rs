//! Configuration for the orchestrator and computing agents
//!
//! Loaded from an optional TOML file, then overridden by the environment
//! variables the service has always honoured (`PORT`, `TIME_ADDITION_MS`,
//! `COMPUTING_POWER`, ...). Every field has a default.

use crate::calculation::OperationTimings;
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;
use url::Url;

/// Top-level configuration shared by both process roles
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub orchestrator: OrchestratorSection,
    #[serde(default)]
    pub operations: OperationsSection,
    #[serde(default)]
    pub agent: AgentSection,
}

/// Orchestrator HTTP server and queue settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrchestratorSection {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Maximum number of queued tasks before submissions are refused
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

impl OrchestratorSection {
    /// Address the HTTP server binds to
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip: IpAddr = self.bind_address.parse().map_err(|_| {
            ConfigError::InvalidConfig(format!(
                "orchestrator.bind_address '{}' is not an IP address",
                self.bind_address
            ))
        })?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

impl Default for OrchestratorSection {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

/// Simulated per-operator latency, in milliseconds
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OperationsSection {
    #[serde(default = "default_addition_ms")]
    pub addition_ms: u64,
    #[serde(default = "default_subtraction_ms")]
    pub subtraction_ms: u64,
    #[serde(default = "default_multiplication_ms")]
    pub multiplication_ms: u64,
    #[serde(default = "default_division_ms")]
    pub division_ms: u64,
}

impl Default for OperationsSection {
    fn default() -> Self {
        Self {
            addition_ms: default_addition_ms(),
            subtraction_ms: default_subtraction_ms(),
            multiplication_ms: default_multiplication_ms(),
            division_ms: default_division_ms(),
        }
    }
}

impl OperationsSection {
    pub fn timings(&self) -> OperationTimings {
        OperationTimings {
            addition: Duration::from_millis(self.addition_ms),
            subtraction: Duration::from_millis(self.subtraction_ms),
            multiplication: Duration::from_millis(self.multiplication_ms),
            division: Duration::from_millis(self.division_ms),
        }
    }
}

/// Computing agent settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentSection {
    /// Base URL of the orchestrator
    #[serde(default = "default_orchestrator_url")]
    pub orchestrator_url: String,
    /// Divisor applied to `compute_delay_base_ms` after each task
    #[serde(default = "default_computing_power")]
    pub computing_power: u32,
    /// Number of concurrent worker loops in one agent process
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Backoff after a failed or empty poll
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_compute_delay_base_ms")]
    pub compute_delay_base_ms: u64,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for AgentSection {
    fn default() -> Self {
        Self {
            orchestrator_url: default_orchestrator_url(),
            computing_power: default_computing_power(),
            workers: default_workers(),
            poll_interval_ms: default_poll_interval_ms(),
            compute_delay_base_ms: default_compute_delay_base_ms(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl AgentSection {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Post-task delay scaled down by computing power
    pub fn compute_delay(&self) -> Duration {
        Duration::from_millis(self.compute_delay_base_ms / u64::from(self.computing_power.max(1)))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn orchestrator_url(&self) -> Result<Url, ConfigError> {
        parse_orchestrator_url(&self.orchestrator_url)
    }
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_queue_capacity() -> usize {
    100
}

fn default_addition_ms() -> u64 {
    100
}

fn default_subtraction_ms() -> u64 {
    200
}

fn default_multiplication_ms() -> u64 {
    300
}

fn default_division_ms() -> u64 {
    400
}

fn default_orchestrator_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_computing_power() -> u32 {
    1
}

fn default_workers() -> usize {
    1
}

fn default_poll_interval_ms() -> u64 {
    2000
}

fn default_compute_delay_base_ms() -> u64 {
    100
}

fn default_request_timeout_ms() -> u64 {
    5000
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Invalid orchestrator URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl AppConfig {
    /// Load from a TOML file, apply environment overrides and validate
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: AppConfig = toml::from_str(&content)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Defaults plus environment overrides, for running without a file
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = AppConfig::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from any key lookup; unparsable values are ignored
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        override_value(&lookup, "PORT", &mut self.orchestrator.port);
        override_value(
            &lookup,
            "QUEUE_CAPACITY",
            &mut self.orchestrator.queue_capacity,
        );
        override_value(
            &lookup,
            "TIME_ADDITION_MS",
            &mut self.operations.addition_ms,
        );
        override_value(
            &lookup,
            "TIME_SUBTRACTION_MS",
            &mut self.operations.subtraction_ms,
        );
        override_value(
            &lookup,
            "TIME_MULTIPLICATIONS_MS",
            &mut self.operations.multiplication_ms,
        );
        override_value(
            &lookup,
            "TIME_DIVISIONS_MS",
            &mut self.operations.division_ms,
        );
        override_value(
            &lookup,
            "COMPUTING_POWER",
            &mut self.agent.computing_power,
        );
        override_value(&lookup, "AGENT_WORKERS", &mut self.agent.workers);
        override_value(
            &lookup,
            "ORCHESTRATOR_URL",
            &mut self.agent.orchestrator_url,
        );
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.orchestrator.queue_capacity == 0 {
            return Err(ConfigError::InvalidConfig(
                "orchestrator.queue_capacity must be at least 1".to_string(),
            ));
        }
        if self.agent.computing_power == 0 {
            return Err(ConfigError::InvalidConfig(
                "agent.computing_power must be at least 1".to_string(),
            ));
        }
        if self.agent.workers == 0 {
            return Err(ConfigError::InvalidConfig(
                "agent.workers must be at least 1".to_string(),
            ));
        }
        self.orchestrator.socket_addr()?;
        self.agent.orchestrator_url()?;
        Ok(())
    }

    /// Configuration with no simulated latency, for unit tests
    #[cfg(test)]
    pub fn test_config() -> Self {
        let toml_content = r#"
[orchestrator]
port = 0
queue_capacity = 4

[operations]
addition_ms = 0
subtraction_ms = 0
multiplication_ms = 0
division_ms = 0

[agent]
orchestrator_url = "http://127.0.0.1:8080"
poll_interval_ms = 10
compute_delay_base_ms = 0
"#;
        toml::from_str(toml_content).expect("Test config should parse")
    }
}

fn override_value<F, T>(lookup: &F, key: &str, target: &mut T)
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    let Some(raw) = lookup(key) else {
        return;
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return;
    }
    match raw.parse::<T>() {
        Ok(value) => *target = value,
        Err(_) => warn!(key, value = raw, "Ignoring unparsable environment override"),
    }
}

fn parse_orchestrator_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|e| ConfigError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(ConfigError::InvalidUrl {
            url: raw.to_string(),
            reason: format!("unsupported scheme '{scheme}'"),
        }),
    }
}
