//! Application configuration management.
//!
//! Configuration lives at `~/.config/proxydesk/config.json` and holds the
//! admin API location, the last admin username and timing knobs. The
//! session token is not stored here; see `auth::session`.
//!
//! `PROXYDESK_URL` overrides the configured base URL.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "proxydesk";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Where the admin API is served when nothing else is configured
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080";

/// Seconds between status polls
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;

/// HTTP request timeout in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Environment variable overriding `base_url`
pub const URL_ENV_VAR: &str = "PROXYDESK_URL";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub base_url: Option<String>,
    pub last_username: Option<String>,
    pub poll_interval_secs: Option<u64>,
    pub request_timeout_secs: Option<u64>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory holding the session file and logs
    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    /// Base URL with the environment override applied and any trailing
    /// slash removed
    pub fn base_url(&self) -> String {
        let url = std::env::var(URL_ENV_VAR)
            .ok()
            .filter(|u| !u.is_empty())
            .or_else(|| self.base_url.clone())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        url.trim_end_matches('/').to_string()
    }

    pub fn poll_interval(&self) -> Duration {
        let secs = self
            .poll_interval_secs
            .filter(|s| *s > 0)
            .unwrap_or(DEFAULT_POLL_INTERVAL_SECS);
        Duration::from_secs(secs)
    }

    pub fn request_timeout(&self) -> Duration {
        let secs = self
            .request_timeout_secs
            .filter(|s| *s > 0)
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);
        Duration::from_secs(secs)
    }
}
