//! Configuration management

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{MonitorError, Result};

pub const DEFAULT_SERVER: &str = "http://localhost:32400";
pub const DEFAULT_PROVIDER: &str = "https://plex.tv";
pub const DEFAULT_INTERVAL_SECS: u64 = 60;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_server")]
    pub server: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub token: String,
    // Sign-in provider
    #[serde(default = "default_provider")]
    pub provider_url: String,
    #[serde(default = "default_interval")]
    pub monitor_interval_secs: u64,
    // Unset means the HTTP library default
    #[serde(default)]
    pub http_timeout_secs: Option<u64>,
    // Logging
    #[serde(default = "default_log_file")]
    pub log_file: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_server() -> String { DEFAULT_SERVER.to_string() }
fn default_provider() -> String { DEFAULT_PROVIDER.to_string() }
fn default_interval() -> u64 { DEFAULT_INTERVAL_SECS }
fn default_log_file() -> String { "plex_monitor.log".to_string() }
fn default_log_level() -> String { "info".to_string() }

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: default_server(),
            username: String::new(),
            password: String::new(),
            token: String::new(),
            provider_url: default_provider(),
            monitor_interval_secs: DEFAULT_INTERVAL_SECS,
            http_timeout_secs: None,
            log_file: default_log_file(),
            log_level: default_log_level(),
        }
    }
}

/// Values supplied on the command line or through `PLEX_*` environment variables.
/// They take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub server: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub token: Option<String>,
    pub provider_url: Option<String>,
    pub log_file: Option<String>,
    pub log_level: Option<String>,
    pub http_timeout_secs: Option<u64>,
}

impl AppConfig {
    pub fn config_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push("plex_monitor");
        path.push("config.json");
        path
    }

    /// Load the config file, falling back to defaults when it does not exist.
    /// An unreadable or invalid file is reported so the caller can log it once
    /// logging is up.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.map(Path::to_path_buf).unwrap_or_else(Self::config_path);

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path).map_err(|source| MonitorError::ConfigRead {
            path: path.clone(),
            source,
        })?;
        let mut config: Self = serde_json::from_str(&content)
            .map_err(|source| MonitorError::ConfigParse { path, source })?;
        config.fill_empty_defaults();
        Ok(config)
    }

    // Empty strings in the file mean "not set"
    fn fill_empty_defaults(&mut self) {
        fn fill(field: &mut String, default: fn() -> String) {
            if field.trim().is_empty() {
                *field = default();
            }
        }

        fill(&mut self.server, default_server);
        fill(&mut self.provider_url, default_provider);
        fill(&mut self.log_file, default_log_file);
        fill(&mut self.log_level, default_log_level);
    }

    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        fn set(field: &mut String, value: Option<String>) {
            if let Some(v) = value.filter(|v| !v.is_empty()) {
                *field = v;
            }
        }

        set(&mut self.server, overrides.server);
        set(&mut self.username, overrides.username);
        set(&mut self.password, overrides.password);
        set(&mut self.token, overrides.token);
        set(&mut self.provider_url, overrides.provider_url);
        set(&mut self.log_file, overrides.log_file);
        set(&mut self.log_level, overrides.log_level);
        if overrides.http_timeout_secs.is_some() {
            self.http_timeout_secs = overrides.http_timeout_secs;
        }
    }

    pub fn http_timeout(&self) -> Option<Duration> {
        self.http_timeout_secs.filter(|s| *s > 0).map(Duration::from_secs)
    }

    pub fn credentials(&self) -> Credentials {
        fn non_empty(s: &str) -> Option<String> {
            if s.is_empty() { None } else { Some(s.to_string()) }
        }

        Credentials {
            server: self.server.trim_end_matches('/').to_string(),
            username: non_empty(&self.username),
            password: non_empty(&self.password),
            token: non_empty(&self.token),
        }
    }
}

/// Server location plus whatever is available to authenticate with it.
#[derive(Debug, Clone, PartialEq)]
pub struct Credentials {
    pub server: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub token: Option<String>,
}

impl Credentials {
    /// Username and password, when both are configured
    pub fn login(&self) -> Option<(&str, &str)> {
        Some((self.username.as_deref()?, self.password.as_deref()?))
    }
}
