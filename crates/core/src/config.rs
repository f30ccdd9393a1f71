// SPDX-License-Identifier: MIT

//! Control-plane configuration: loaded from a TOML file with `WHARF_*`
//! environment variable overrides, matching the layering the rest of this
//! codebase uses for daemon configuration.

use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceSpec {
    pub cpu: String,
    pub memory: String,
}

impl Default for ResourceSpec {
    fn default() -> Self {
        Self {
            cpu: "100m".to_string(),
            memory: "256Mi".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub namespace: String,
    pub runtime_image: String,
    pub resource_requests: ResourceSpec,
    pub resource_limits: ResourceSpec,
    pub storage_size: String,
    pub session_ttl_secs: u64,
    pub grpc_port: u16,
    pub http_port: u16,
    pub probe_interval_secs: u64,
    pub probe_timeout_secs: u64,
    pub pool_idle_timeout_secs: u64,
    pub pool_max_idle_per_host: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            namespace: "default".to_string(),
            runtime_image: "wharf/agent:latest".to_string(),
            resource_requests: ResourceSpec::default(),
            resource_limits: ResourceSpec {
                cpu: "500m".to_string(),
                memory: "512Mi".to_string(),
            },
            storage_size: "1Gi".to_string(),
            session_ttl_secs: 24 * 60 * 60,
            grpc_port: 7070,
            http_port: 8080,
            probe_interval_secs: 30,
            probe_timeout_secs: 5,
            pool_idle_timeout_secs: 10 * 60,
            pool_max_idle_per_host: 8,
        }
    }
}

impl Config {
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    pub fn probe_interval(&self) -> Duration {
        Duration::from_secs(self.probe_interval_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn pool_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.pool_idle_timeout_secs)
    }

    /// Load from an optional TOML file, then apply `WHARF_*` environment
    /// variable overrides on top.
    pub fn load(path: Option<&Path>) -> Result<Self, CoreError> {
        let mut config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .map_err(|e| CoreError::Config(format!("reading {}: {e}", path.display())))?;
                toml::from_str(&text).map_err(|e| CoreError::Config(e.to_string()))?
            }
            None => Config::default(),
        };
        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("WHARF_NAMESPACE") {
            self.namespace = v;
        }
        if let Ok(v) = std::env::var("WHARF_RUNTIME_IMAGE") {
            self.runtime_image = v;
        }
        if let Ok(v) = std::env::var("WHARF_STORAGE_SIZE") {
            self.storage_size = v;
        }
        if let Some(v) = env_u64("WHARF_SESSION_TTL_SECS") {
            self.session_ttl_secs = v;
        }
        if let Some(v) = env_u16("WHARF_GRPC_PORT") {
            self.grpc_port = v;
        }
        if let Some(v) = env_u16("WHARF_HTTP_PORT") {
            self.http_port = v;
        }
        if let Some(v) = env_u64("WHARF_PROBE_INTERVAL_SECS") {
            self.probe_interval_secs = v;
        }
        if let Some(v) = env_u64("WHARF_PROBE_TIMEOUT_SECS") {
            self.probe_timeout_secs = v;
        }
        if let Some(v) = env_u64("WHARF_POOL_IDLE_TIMEOUT_SECS") {
            self.pool_idle_timeout_secs = v;
        }
        if let Some(v) = env_u64("WHARF_POOL_MAX_IDLE_PER_HOST") {
            self.pool_max_idle_per_host = v as usize;
        }
    }
}

fn env_u64(key: &str) -> Option<u64> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

fn env_u16(key: &str) -> Option<u16> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
