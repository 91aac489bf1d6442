//! Operator-facing notifications: one error slot and one success slot.

use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Error,
    Success,
}

/// At most one live message per kind. Every operator action starts with
/// `clear` and then sets at most one of the two.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Notifications {
    error: Option<String>,
    success: Option<String>,
}

impl Notifications {
    pub fn clear(&mut self) {
        self.error = None;
        self.success = None;
    }

    pub fn error(&mut self, message: impl Into<String>) {
        let message = message.into();
        error!(message = %message, "Operator notified of failure");
        self.error = Some(message);
    }

    pub fn success(&mut self, message: impl Into<String>) {
        let message = message.into();
        info!(message = %message, "Operator notified of success");
        self.success = Some(message);
    }

    pub fn current_error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn current_success(&self) -> Option<&str> {
        self.success.as_deref()
    }

    /// Live notifications, errors first
    pub fn iter(&self) -> impl Iterator<Item = (NotificationKind, &str)> {
        self.error
            .as_deref()
            .map(|m| (NotificationKind::Error, m))
            .into_iter()
            .chain(self.success.as_deref().map(|m| (NotificationKind::Success, m)))
    }

    pub fn is_empty(&self) -> bool {
        self.error.is_none() && self.success.is_none()
    }
}
