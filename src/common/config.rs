//! Configuration file handling
//!
//! Precedence, lowest first: built-in defaults, `config.toml`, `REVUE_*`
//! environment variables, command-line flags.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::paths::config_path;
use super::{Error, Result};

/// Environment variable overriding `api.base_url`
pub const ENV_BASE_URL: &str = "REVUE_BASE_URL";
/// Environment variable overriding `credentials.email`
pub const ENV_EMAIL: &str = "REVUE_EMAIL";
/// Environment variable overriding `credentials.password`
pub const ENV_PASSWORD: &str = "REVUE_PASSWORD";

/// Main configuration structure
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    /// Target API settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Login credentials
    #[serde(default)]
    pub credentials: Credentials,

    /// HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Scenario execution settings
    #[serde(default)]
    pub scenario: ScenarioConfig,

    /// Mock server settings
    #[serde(default)]
    pub mock: MockConfig,
}

/// Target API settings
#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    /// Base URL every endpoint path is appended to
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

fn default_base_url() -> String {
    "https://d2925tksfvgq8c.cloudfront.net/api".to_string()
}

/// Login credentials sent to `/User/Authentication`
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct Credentials {
    #[serde(default = "default_email")]
    pub email: String,

    #[serde(default = "default_password")]
    pub password: String,
}

impl Default for Credentials {
    fn default() -> Self {
        Self {
            email: default_email(),
            password: default_password(),
        }
    }
}

fn default_email() -> String {
    "user@example.com".to_string()
}
fn default_password() -> String {
    "string".to_string()
}

/// HTTP client settings
#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_timeout() -> u64 {
    30
}

/// Scenario execution settings
#[derive(Debug, Deserialize, Clone)]
pub struct ScenarioConfig {
    /// Re-authenticate before every step instead of once per run
    #[serde(default = "default_reauthenticate")]
    pub reauthenticate: bool,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            reauthenticate: default_reauthenticate(),
        }
    }
}

fn default_reauthenticate() -> bool {
    true
}

/// Mock server settings
#[derive(Debug, Deserialize, Clone)]
pub struct MockConfig {
    /// Address the mock API listens on
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

fn default_listen() -> String {
    "127.0.0.1:5080".to_string()
}

impl Config {
    /// Load configuration from the default config file, then apply
    /// environment overrides
    ///
    /// Returns default configuration if file doesn't exist
    pub fn load() -> Result<Self> {
        let mut config = match config_path() {
            Some(path) if path.exists() => Self::from_file(&path)?,
            _ => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load configuration from a specific TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::ConfigParse(e.to_string()))
    }

    /// Apply `REVUE_*` overrides using the given variable lookup
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_BASE_URL).filter(|v| !v.is_empty()) {
            self.api.base_url = url;
        }
        if let Some(email) = lookup(ENV_EMAIL).filter(|v| !v.is_empty()) {
            self.credentials.email = email;
        }
        if let Some(password) = lookup(ENV_PASSWORD) {
            self.credentials.password = password;
        }
    }

    /// Path of the config file that `load` reads, if any
    pub fn path() -> Option<PathBuf> {
        config_path()
    }
}
