use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Session file name in the cache directory
pub const SESSION_FILE: &str = "session.json";

/// On-disk form of the session. `jwt_token` is the fixed storage key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionFile {
    pub jwt_token: String,
    pub saved_at: DateTime<Utc>,
}

/// Owner of the bearer token.
///
/// The token is held in a `watch` channel so route guards can observe
/// login and logout without polling. Every write goes through
/// `set_authenticated` or `logout`.
pub struct SessionStore {
    path: PathBuf,
    token: watch::Sender<Option<String>>,
}

impl SessionStore {
    pub fn new(cache_dir: &Path) -> Self {
        let (token, _) = watch::channel(None);
        Self {
            path: cache_dir.join(SESSION_FILE),
            token,
        }
    }

    /// Read the durable token, if any. Returns whether the session is now
    /// authenticated. An unreadable file counts as no session.
    pub fn initialize(&self) -> bool {
        let stored = match self.read_file() {
            Ok(stored) => stored,
            Err(e) => {
                warn!(error = %e, path = ?self.path, "Ignoring unreadable session file");
                None
            }
        };

        let authenticated = stored.is_some();
        debug!(authenticated, "Session initialized from storage");
        self.token.send_replace(stored.map(|s| s.jwt_token));
        authenticated
    }

    /// Adopt a freshly issued token. The in-memory session is always
    /// updated; an `Err` means only that persisting it failed.
    pub fn set_authenticated(&self, token: String) -> Result<()> {
        let file = SessionFile {
            jwt_token: token.clone(),
            saved_at: Utc::now(),
        };
        self.token.send_replace(Some(token));
        info!("Session established");
        self.write_file(&file)
    }

    /// Clear the token from memory and storage. Returns `false`, and does
    /// nothing else, when already logged out.
    pub fn logout(&self) -> bool {
        let changed = self.token.send_if_modified(|token| token.take().is_some());
        if !changed {
            debug!("Logout requested with no active session");
            return false;
        }

        self.remove_file();
        info!("Session cleared");
        true
    }

    /// Clear the session only if it still holds `token`. Used when a
    /// request sent with `token` comes back unauthorized, so a late failure
    /// cannot end a newer session.
    pub fn invalidate(&self, token: &str) -> bool {
        let changed = self.token.send_if_modified(|current| {
            if current.as_deref() == Some(token) {
                *current = None;
                true
            } else {
                false
            }
        });
        if changed {
            self.remove_file();
            info!("Session invalidated by authorization failure");
        }
        changed
    }

    pub fn token(&self) -> Option<String> {
        self.token.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.borrow().is_some()
    }

    /// Receiver that observes every login and logout
    pub fn subscribe(&self) -> watch::Receiver<Option<String>> {
        self.token.subscribe()
    }

    fn read_file(&self) -> Result<Option<SessionFile>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents =
            std::fs::read_to_string(&self.path).context("Failed to read session file")?;
        let file: SessionFile =
            serde_json::from_str(&contents).context("Failed to parse session file")?;
        if file.jwt_token.is_empty() {
            return Ok(None);
        }
        Ok(Some(file))
    }

    fn remove_file(&self) {
        if self.path.exists() {
            if let Err(e) = std::fs::remove_file(&self.path) {
                warn!(error = %e, path = ?self.path, "Failed to remove session file");
            }
        }
    }

    fn write_file(&self, file: &SessionFile) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create session directory")?;
        }
        let contents = serde_json::to_string_pretty(file)?;
        std::fs::write(&self.path, contents).context("Failed to write session file")?;
        Ok(())
    }
}
