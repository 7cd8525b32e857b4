//! Run configuration loading and validation.

use crate::error::{LoadResult, LoadTestError};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Parameters of one load test run. Read-only for the whole run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    pub url: String,
    /// Number of simulated users (workers running at the same time).
    #[serde(alias = "users")]
    pub concurrency: u32,
    /// Sequential requests issued by each user.
    #[serde(alias = "requests_per_user")]
    pub requests_per_worker: u64,
    /// Skip TLS certificate validation. Only meant for local test targets.
    #[serde(default)]
    pub insecure: bool,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

impl RunConfig {
    /// Create a config with default client settings.
    pub fn new(url: impl Into<String>, concurrency: u32, requests_per_worker: u64) -> Self {
        Self {
            url: url.into(),
            concurrency,
            requests_per_worker,
            insecure: false,
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }

    /// Load a scenario from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> LoadResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: RunConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Validate the configuration and return the parsed target URL.
    pub fn validate(&self) -> LoadResult<Url> {
        if self.concurrency == 0 {
            return Err(LoadTestError::InvalidConfig(
                "concurrency must be > 0".to_string(),
            ));
        }
        if self.timeout_secs == 0 {
            return Err(LoadTestError::InvalidConfig(
                "timeout_secs must be > 0".to_string(),
            ));
        }

        let url = Url::parse(self.url.trim()).map_err(|e| LoadTestError::InvalidUrl {
            url: self.url.clone(),
            reason: e.to_string(),
        })?;

        match url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(LoadTestError::InvalidUrl {
                    url: self.url.clone(),
                    reason: format!("unsupported scheme '{}'", other),
                })
            }
        }
        if url.host_str().is_none() {
            return Err(LoadTestError::InvalidUrl {
                url: self.url.clone(),
                reason: "missing host".to_string(),
            });
        }

        Ok(url)
    }

    /// Total number of requests a complete run issues, saturating at `u64::MAX`.
    pub fn total_requests(&self) -> u64 {
        (self.concurrency as u64).saturating_mul(self.requests_per_worker)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}
