use anyhow::{Context, Result};
use keyring::Entry;
use tracing::debug;

/// Keychain service name for the operator's admin login
const SERVICE_NAME: &str = "proxydesk-admin";

/// The operator's admin password, kept in the OS keychain so the login
/// form can be pre-filled. Proxy users' passwords are never stored.
pub struct CredentialStore;

impl CredentialStore {
    pub fn remember(username: &str, password: &str) -> Result<()> {
        let entry = Self::entry(username)?;
        entry
            .set_password(password)
            .context("Failed to store admin password in keychain")?;
        debug!(username, "Admin password stored in keychain");
        Ok(())
    }

    /// Stored password for `username`, or `None` when there is none or the
    /// keychain is unavailable
    pub fn recall(username: &str) -> Option<String> {
        if username.is_empty() {
            return None;
        }
        Self::entry(username).ok()?.get_password().ok()
    }

    pub fn forget(username: &str) -> Result<()> {
        Self::entry(username)?
            .delete_credential()
            .context("Failed to delete admin password from keychain")?;
        Ok(())
    }

    fn entry(username: &str) -> Result<Entry> {
        Entry::new(SERVICE_NAME, username).context("Failed to create keyring entry")
    }
}
