use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Connection state of an integration.
///
/// A user without any record is `Disconnected`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntegrationStatus {
    #[default]
    Disconnected,
    Connected,
}

impl IntegrationStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connected => "connected",
        }
    }
}

impl fmt::Display for IntegrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IntegrationStatus {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "disconnected" => Ok(Self::Disconnected),
            "connected" => Ok(Self::Connected),
            other => Err(StoreError::InvalidStatus {
                value: other.to_string(),
            }),
        }
    }
}

/// A persisted integration, one per user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationRecord {
    pub user_id: String,
    pub guild_id: String,
    pub channel_id: String,
    /// Display label cached at save time; may go stale.
    pub channel_name: String,
    pub status: IntegrationStatus,
    /// Unix milliseconds.
    pub created_at: i64,
    /// Unix milliseconds.
    pub updated_at: i64,
}

impl IntegrationRecord {
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.status == IntegrationStatus::Connected
    }
}

/// A validated channel choice, ready to be upserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSelection {
    pub user_id: String,
    pub guild_id: String,
    pub channel_id: String,
    pub channel_name: String,
}
