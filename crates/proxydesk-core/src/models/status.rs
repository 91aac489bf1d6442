use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::format::age_display;

/// Proxy service status, replaced wholesale on every successful fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub is_active: bool,
    #[serde(rename = "status")]
    pub status_label: String,
    #[serde(default)]
    pub details: String,
    /// Local time the snapshot was received; not part of the wire format
    #[serde(skip, default = "Utc::now")]
    pub fetched_at: DateTime<Utc>,
}

impl StatusSnapshot {
    pub fn indicator(&self) -> &'static str {
        if self.is_active {
            "active"
        } else {
            "inactive"
        }
    }

    pub fn age_display(&self) -> String {
        age_display(self.fetched_at, Utc::now())
    }
}
