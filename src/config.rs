//! Configuration types for wall-ingest

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Remote API access settings
#[derive(Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Access token for the remote API (already issued; no auth flow is run here)
    pub token: String,

    /// Method endpoint base URL (default: "https://api.vk.com/method/")
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// API version sent with every call (default: "5.199")
    #[serde(default = "default_api_version")]
    pub version: String,

    /// Per-request timeout (default: 30 seconds)
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub request_timeout: Duration,

    /// Number of most recent posts fetched per channel (default: 10)
    #[serde(default = "default_post_count")]
    pub post_count: u32,
}

impl ApiConfig {
    /// API settings with the given token and defaults for everything else
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            base_url: default_base_url(),
            version: default_api_version(),
            request_timeout: default_request_timeout(),
            post_count: default_post_count(),
        }
    }
}

// The token never ends up in logs.
impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("token", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("version", &self.version)
            .field("request_timeout", &self.request_timeout)
            .field("post_count", &self.post_count)
            .finish()
    }
}

/// Where media files and the ledger live
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Media root; each channel gets `<data_dir>/<channel_name>/{text,photo}` (default: "data")
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Ledger database file shared by all channels (default: "data/info.db")
    #[serde(default = "default_ledger_path")]
    pub ledger_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            ledger_path: default_ledger_path(),
        }
    }
}

/// Main configuration for a [`Pipeline`](crate::Pipeline) run
///
/// Built once at startup and passed by reference; nothing in the crate reads
/// process state behind its back.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Channel identifiers as configured (screen names or numeric IDs)
    pub channels: Vec<String>,

    /// Remote API settings
    pub api: ApiConfig,

    /// Media store and ledger locations
    #[serde(default)]
    pub storage: StorageConfig,
}

impl Config {
    /// Load configuration from the process environment, after applying `.env`
    /// from the current directory if one exists.
    ///
    /// Required: `TOKEN_VK` (`VK_TOKEN` is accepted as a fallback),
    /// `CHANNEL_LIST` (whitespace separated).
    /// Optional: `VK_API_URL`, `VK_API_VERSION`, `VK_TIMEOUT_SECS`, `POST_COUNT`,
    /// `DATA_DIR`, `LEDGER_PATH`.
    pub fn from_env() -> Result<Self> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                tracing::warn!(error = %e, "Failed to load .env file");
            }
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from a specific env file. Keys missing from the file
    /// fall back to the process environment. The process environment is not
    /// modified.
    pub fn from_env_file(path: &Path) -> Result<Self> {
        let iter = dotenvy::from_path_iter(path).map_err(|e| Error::Config {
            message: format!("Failed to read env file {}: {}", path.display(), e),
            key: None,
        })?;

        let mut vars = HashMap::new();
        for item in iter {
            let (key, value) = item.map_err(|e| Error::Config {
                message: format!("Failed to parse env file {}: {}", path.display(), e),
                key: None,
            })?;
            vars.insert(key, value);
        }

        Self::from_lookup(|key| vars.get(key).cloned().or_else(|| std::env::var(key).ok()))
    }

    /// Build a configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token = lookup("TOKEN_VK")
            .or_else(|| lookup("VK_TOKEN"))
            .ok_or_else(|| missing("TOKEN_VK"))?;
        let channels: Vec<String> = lookup("CHANNEL_LIST")
            .ok_or_else(|| missing("CHANNEL_LIST"))?
            .split_whitespace()
            .map(str::to_string)
            .collect();

        let mut api = ApiConfig::with_token(token);
        if let Some(url) = lookup("VK_API_URL") {
            api.base_url = url;
        }
        if let Some(version) = lookup("VK_API_VERSION") {
            api.version = version;
        }
        if let Some(secs) = lookup("VK_TIMEOUT_SECS") {
            api.request_timeout = Duration::from_secs(parse_number("VK_TIMEOUT_SECS", &secs)?);
        }
        if let Some(count) = lookup("POST_COUNT") {
            api.post_count = parse_number("POST_COUNT", &count)?;
        }

        let mut storage = StorageConfig::default();
        if let Some(dir) = lookup("DATA_DIR") {
            // Ledger follows the data dir unless placed explicitly
            storage.ledger_path = PathBuf::from(&dir).join("info.db");
            storage.data_dir = PathBuf::from(dir);
        }
        if let Some(path) = lookup("LEDGER_PATH") {
            storage.ledger_path = PathBuf::from(path);
        }

        let config = Self {
            channels,
            api,
            storage,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that cannot produce a meaningful run
    pub fn validate(&self) -> Result<()> {
        if self.api.token.trim().is_empty() {
            return Err(Error::Config {
                message: "API token is empty".to_string(),
                key: Some("TOKEN_VK".to_string()),
            });
        }
        if self.channels.is_empty() {
            return Err(Error::Config {
                message: "no channels configured".to_string(),
                key: Some("CHANNEL_LIST".to_string()),
            });
        }
        if self.api.post_count == 0 {
            return Err(Error::Config {
                message: "post count must be at least 1".to_string(),
                key: Some("POST_COUNT".to_string()),
            });
        }
        Ok(())
    }
}

fn missing(key: &str) -> Error {
    Error::Config {
        message: format!("{} not set in environment", key),
        key: Some(key.to_string()),
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| Error::Config {
        message: format!("{} must be a non-negative integer, got {:?}", key, value),
        key: Some(key.to_string()),
    })
}

// Default value functions
fn default_base_url() -> String {
    "https://api.vk.com/method/".to_string()
}

fn default_api_version() -> String {
    "5.199".to_string()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_post_count() -> u32 {
    10
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_ledger_path() -> PathBuf {
    PathBuf::from("data").join("info.db")
}

// Duration serialization helper (as whole seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
