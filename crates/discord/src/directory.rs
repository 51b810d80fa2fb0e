use async_trait::async_trait;

use crate::{
    error::Result,
    permissions::Permissions,
    types::{Channel, Guild, GuildChannels},
};

/// Read access to the configured guild plus message posting, as the bot.
///
/// [`DiscordClient`](crate::DiscordClient) is the production implementation;
/// the trait exists so the integration service can be driven by a fake.
#[async_trait]
pub trait ChannelDirectory: Send + Sync {
    /// Guild every lookup is scoped to.
    fn guild_id(&self) -> &str;

    /// Metadata for the configured guild, or `None` when the bot is not a
    /// member of it.
    async fn guild(&self) -> Result<Option<Guild>>;

    /// Every channel of the configured guild, any type, in API order.
    async fn guild_channels(&self) -> Result<Vec<Channel>>;

    /// A single channel. Fails with `NotFound` if it is missing or hidden
    /// from the bot.
    async fn channel(&self, channel_id: &str) -> Result<Channel>;

    /// The bot's effective permissions on a channel.
    async fn channel_permissions(&self, channel_id: &str) -> Result<Permissions>;

    /// Post a plain text message. Any non-2xx reply is `Rejected`.
    async fn post_message(&self, channel_id: &str, content: &str) -> Result<()>;

    /// Text channels of the configured guild, sorted by name, along with the
    /// guild they were listed from.
    ///
    /// When the bot is not in the guild, `guild` is `None` and the channel
    /// endpoint is not called. A guild without text channels yields an empty
    /// list; neither case is an error.
    async fn list_channels(&self) -> Result<GuildChannels> {
        let Some(guild) = self.guild().await? else {
            return Ok(GuildChannels::default());
        };
        let channels = text_channels(self.guild_channels().await?);
        Ok(GuildChannels {
            guild: Some(guild),
            channels,
        })
    }
}

/// Keep only text channels and order them by name.
fn text_channels(channels: Vec<Channel>) -> Vec<Channel> {
    let mut text: Vec<Channel> = channels.into_iter().filter(Channel::is_text).collect();
    text.sort_by(|a, b| a.name.cmp(&b.name));
    text
}
