//! Configuration management for cvbench

use crate::{Result, ViewerError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Dashboard server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address for the HTTP server
    pub bind: String,
    /// Directory holding benchmark JSON files
    pub data_dir: PathBuf,
    /// Directory served under `/static`
    pub static_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:5000".to_string(),
            data_dir: PathBuf::from("./data"),
            static_dir: PathBuf::from("./static"),
        }
    }
}

/// REST client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the dashboard API
    pub api_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:5000".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Default chart selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    /// Category key for the bar view
    pub category_key: String,
    /// X-axis key for the line view
    pub x_axis_key: String,
    /// Series key for the line view
    pub series_key: String,
    /// Redraw interval of the live bar view in milliseconds
    pub redraw_interval_ms: u64,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            category_key: "algorithm_name".to_string(),
            x_axis_key: "benchmark_run_date".to_string(),
            series_key: "algorithm_name".to_string(),
            redraw_interval_ms: 500,
        }
    }
}

/// Complete viewer configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub server: ServerConfig,
    pub client: ClientConfig,
    pub chart: ChartConfig,
}

impl ViewerConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load from an optional file, then apply `CVBENCH_*` environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply overrides from an environment lookup
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(bind) = lookup("CVBENCH_BIND") {
            self.server.bind = bind;
        }
        if let Some(dir) = lookup("CVBENCH_DATA_DIR") {
            self.server.data_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("CVBENCH_STATIC_DIR") {
            self.server.static_dir = PathBuf::from(dir);
        }
        if let Some(url) = lookup("CVBENCH_API_URL") {
            self.client.api_url = url;
        }
        if let Some(timeout) = lookup("CVBENCH_TIMEOUT_SECS") {
            self.client.timeout_secs = timeout.parse().map_err(|_| {
                ViewerError::Config(format!("CVBENCH_TIMEOUT_SECS is not a number: {timeout}"))
            })?;
        }
        debug!("Effective configuration: {:?}", self);
        Ok(())
    }
}
