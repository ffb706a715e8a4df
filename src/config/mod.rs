use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_UPSTREAM: &str = "https://downr.org";

// Static analytics cookie the upstream expects on every call. It is not
// refreshed by us; if upstream starts rejecting it, override it in config.
pub const DEFAULT_BASELINE_COOKIE: &str = "_ga=GA1.1.536005378.1770437315; _clck=17lj13q%5E2%5Eg3d";

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Linux; Android 10) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/144.0.0.0 Mobile Safari/537.36";

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: "json".to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    /// Directory with the browser front-end, served for any path not matched by the API.
    pub static_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3000".to_string(),
            static_dir: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct UpstreamConfig {
    pub base_url: String,
    pub cookie_timeout_secs: u64,
    pub resolve_timeout_secs: u64,
    pub baseline_cookie: String,
    pub user_agent: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_UPSTREAM.to_string(),
            cookie_timeout_secs: 8,
            resolve_timeout_secs: 15,
            baseline_cookie: DEFAULT_BASELINE_COOKIE.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl UpstreamConfig {
    pub fn cookie_timeout(&self) -> Duration {
        Duration::from_secs(self.cookie_timeout_secs)
    }

    pub fn resolve_timeout(&self) -> Duration {
        Duration::from_secs(self.resolve_timeout_secs)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct ClientConfig {
    pub endpoint: String,
    pub download_dir: Option<PathBuf>,
    pub storage_path: Option<PathBuf>,
    pub filename_prefix: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:3000/api".to_string(),
            download_dir: None,
            storage_path: None,
            filename_prefix: "MEDIALINK_DL".to_string(),
        }
    }
}

impl ClientConfig {
    pub fn download_dir(&self) -> PathBuf {
        self.download_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Location of the key-value file that backs local history.
    pub fn storage_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.storage_path {
            return Ok(path.clone());
        }

        let data_dir = dirs::data_dir().context("Could not determine user data directory")?;
        Ok(data_dir.join("medialink").join("storage.json"))
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub logging: LoggingConfig,
    pub server: ServerConfig,
    pub upstream: UpstreamConfig,
    pub client: ClientConfig,
}

impl Config {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let mut config: Config = toml::from_str(contents)?;
        config.apply_env();
        Ok(config)
    }

    /// Loads the config at `path` when given, otherwise the defaults.
    pub fn load(path: Option<&str>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let mut config = Self::default();
                config.apply_env();
                Ok(config)
            }
        }
    }

    fn apply_env(&mut self) {
        if let Ok(base_url) = std::env::var("MEDIALINK_UPSTREAM") {
            if !base_url.trim().is_empty() {
                self.upstream.base_url = base_url.trim().to_string();
            }
        }
    }

    pub fn get_logging_format(&self) -> &str {
        &self.logging.format
    }
}
