use serde::{Deserialize, Serialize};

use crate::permissions::Permissions;

/// Guild (server) metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guild {
    pub id: String,
    pub name: String,
}

/// Discord channel type, from the numeric `type` field.
///
/// Only `Text` channels can host an integration; everything else is carried
/// so the directory can filter it out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "u8")]
pub enum ChannelKind {
    Text,
    Voice,
    Category,
    Other(u8),
}

impl From<u8> for ChannelKind {
    fn from(value: u8) -> Self {
        match value {
            0 => Self::Text,
            2 => Self::Voice,
            4 => Self::Category,
            other => Self::Other(other),
        }
    }
}

/// Channel metadata as returned by `/channels/{id}` and the guild listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Channel {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ChannelKind,
    #[serde(default)]
    pub guild_id: Option<String>,
}

impl Channel {
    #[must_use]
    pub fn is_text(&self) -> bool {
        self.kind == ChannelKind::Text
    }

    /// Whether the channel reports `guild_id` as its parent.
    #[must_use]
    pub fn belongs_to(&self, guild_id: &str) -> bool {
        self.guild_id.as_deref() == Some(guild_id)
    }
}

/// Outcome of [`ChannelDirectory::list_channels`](crate::ChannelDirectory::list_channels).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GuildChannels {
    /// `None` when the bot is not a member of the configured guild.
    pub guild: Option<Guild>,
    pub channels: Vec<Channel>,
}

/// Body of `/channels/{id}/permissions/@me`.
#[derive(Debug, Deserialize)]
pub(crate) struct PermissionsResponse {
    pub permissions: Permissions,
}

/// Body of `POST /channels/{id}/messages`.
#[derive(Debug, Serialize)]
pub(crate) struct CreateMessage<'a> {
    pub content: &'a str,
}
