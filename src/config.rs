//! Adapter configuration.
//!
//! Sources are merged with well-defined priority (lowest first): built-in
//! defaults, a YAML file, environment variables, CLI flags. The resulting
//! [`AdapterConfig`] is immutable once the server starts.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AdapterError, Result};

/// Production AgentOps API endpoint.
pub const DEFAULT_API_URL: &str = "https://api.agentops.ai";

/// Per-request HTTP timeout used when nothing else is configured.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Environment variable overriding the default API URL.
pub const ENV_API_URL: &str = "AGENTOPS_API_URL";

/// Environment variable overriding the request timeout in seconds.
pub const ENV_TIMEOUT_SECS: &str = "AGENTOPS_TIMEOUT_SECS";

const CONFIG_FILE_NAME: &str = "config.yaml";

// ---------------------------------------------------------------------------
// AdapterConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterConfig {
    /// Base URL used when a tool call does not pass `AGENTOPS_API_URL`.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Timeout applied to each outbound HTTP request.
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            request_timeout_secs: default_timeout_secs(),
        }
    }
}

impl AdapterConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Parse a YAML document. Missing fields fall back to defaults.
    pub fn from_yaml(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).map_err(|e| AdapterError::Config(e.to_string()))
    }

    /// Overlay environment variables, looked up through `lookup` so tests
    /// don't have to touch the process environment.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.trim().is_empty()) {
            self.api_url = url.trim().to_string();
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            self.request_timeout_secs = raw.trim().parse().map_err(|_| {
                AdapterError::Config(format!("{ENV_TIMEOUT_SECS} must be a whole number, got {raw:?}"))
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.api_url.trim().is_empty() {
            return Err(AdapterError::Config("api_url must not be empty".into()));
        }
        if self.request_timeout_secs == 0 {
            return Err(AdapterError::Config(
                "request_timeout_secs must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Platform config file location, e.g. `~/.config/agentops-mcp/config.yaml`.
pub fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("ai", "agentops", "agentops-mcp")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

/// Load configuration from file and environment.
///
/// An explicit `path` must exist. Without one, the platform default location
/// is read if present and skipped otherwise. CLI flags are applied by the
/// caller on top of the returned value.
pub fn load_config(path: Option<&Path>) -> Result<AdapterConfig> {
    let mut config = match path {
        Some(p) => read_file(p)?,
        None => match default_config_path() {
            Some(p) if p.is_file() => read_file(&p)?,
            _ => AdapterConfig::default(),
        },
    };
    config.apply_env(|key| std::env::var(key).ok())?;
    Ok(config)
}

fn read_file(path: &Path) -> Result<AdapterConfig> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| AdapterError::Config(format!("{}: {e}", path.display())))?;
    tracing::debug!(path = %path.display(), "loaded config file");
    serde_yaml::from_str(&text)
        .map_err(|e| AdapterError::Config(format!("{}: {e}", path.display())))
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
