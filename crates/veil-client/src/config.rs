//! Client configuration.
//!
//! `ClientConfig` is read from a TOML document. Every field has a default, so
//! an empty document is a valid configuration.
//!
//! ```toml
//! base_url = "https://governance.example.com"
//! api_prefix = "/api"
//! timeout_ms = 3000
//! token_path = "/home/me/.veil/token"
//! insights_interval_secs = 60
//! ```

use std::{path::Path, path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};

use veil_contracts::error::{VeilError, VeilResult};

/// Connection and polling settings for the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Scheme, host and port of the backend, without a trailing slash.
    pub base_url: String,
    /// Path prefix of the wrapped API.
    pub api_prefix: String,
    /// Client-side timeout for every wrapped call.
    pub timeout_ms: u64,
    /// Where the bearer token is persisted. `None` keeps it in memory only.
    pub token_path: Option<PathBuf>,
    /// Period of the insights poller.
    pub insights_interval_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            api_prefix: "/api".to_string(),
            timeout_ms: 3000,
            token_path: None,
            insights_interval_secs: 60,
        }
    }
}

impl ClientConfig {
    /// Parse `s` as TOML and validate the result.
    pub fn from_toml_str(s: &str) -> VeilResult<Self> {
        let config: ClientConfig = toml::from_str(s).map_err(|e| VeilError::ConfigError {
            reason: format!("failed to parse client config TOML: {}", e),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Read the file at `path` and parse it as TOML client configuration.
    pub fn from_file(path: &Path) -> VeilResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| VeilError::ConfigError {
            reason: format!("failed to read config file '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn validate(&self) -> VeilResult<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(VeilError::ConfigError {
                reason: format!("base_url '{}' must be an http(s) URL", self.base_url),
            });
        }
        if self.timeout_ms == 0 {
            return Err(VeilError::ConfigError {
                reason: "timeout_ms must be greater than zero".to_string(),
            });
        }
        if self.insights_interval_secs == 0 {
            return Err(VeilError::ConfigError {
                reason: "insights_interval_secs must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// Origin with any trailing slash removed.
    pub fn origin(&self) -> String {
        self.base_url.trim_end_matches('/').to_string()
    }

    /// Absolute base of the wrapped API, e.g. `http://localhost:8000/api`.
    pub fn api_base(&self) -> String {
        let prefix = self.api_prefix.trim_end_matches('/');
        if prefix.is_empty() || prefix.starts_with('/') {
            format!("{}{}", self.origin(), prefix)
        } else {
            format!("{}/{}", self.origin(), prefix)
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn insights_interval(&self) -> Duration {
        Duration::from_secs(self.insights_interval_secs)
    }
}
