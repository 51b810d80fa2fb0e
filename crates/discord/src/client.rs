use std::time::Duration;

use {
    async_trait::async_trait,
    reqwest::{StatusCode, Url},
    secrecy::{ExposeSecret, Secret},
    serde::de::DeserializeOwned,
    tracing::{debug, warn},
    whalebuddy_config::DiscordConfig,
};

use crate::{
    directory::ChannelDirectory,
    error::{DirectoryError, Result},
    permissions::Permissions,
    types::{Channel, CreateMessage, Guild, PermissionsResponse},
};

/// Statuses Discord uses for "does not exist" and "exists but the bot
/// cannot see it". Both read as not found.
const MISSING: [StatusCode; 2] = [StatusCode::NOT_FOUND, StatusCode::FORBIDDEN];

/// Discord REST client authenticated as the bot.
///
/// Every method issues exactly one HTTP request and never retries. Ids are
/// appended as single percent-encoded path segments, so a caller-supplied id
/// can never address another endpoint.
#[derive(Clone)]
pub struct DiscordClient {
    http: reqwest::Client,
    base_url: Url,
    token: Secret<String>,
    guild_id: String,
}

impl std::fmt::Debug for DiscordClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordClient")
            .field("base_url", &self.base_url.as_str())
            .field("guild_id", &self.guild_id)
            .finish_non_exhaustive()
    }
}

impl DiscordClient {
    /// Build a client with its own connection pool and the configured
    /// per-request timeout.
    pub fn new(config: &DiscordConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if config.request_timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(config.request_timeout_secs));
        }
        let http = builder.build()?;
        Self::with_http(http, config)
    }

    /// Build a client on top of an existing `reqwest::Client`.
    pub fn with_http(http: reqwest::Client, config: &DiscordConfig) -> Result<Self> {
        let base_url = Url::parse(config.base_url()).map_err(|e| {
            DirectoryError::unavailable(
                None,
                format!("invalid API base URL {:?}: {e}", config.base_url()),
            )
        })?;
        if base_url.cannot_be_a_base() {
            return Err(DirectoryError::unavailable(
                None,
                format!("API base URL {base_url} cannot carry a path"),
            ));
        }
        Ok(Self {
            http,
            base_url,
            token: config.bot_token.clone(),
            guild_id: config.guild_id.clone(),
        })
    }

    /// Base URL plus `segments`, each pushed as one encoded path segment.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn authorization(&self) -> String {
        format!("Bot {}", self.token.expose_secret())
    }

    /// GET the endpoint and decode the body. `Ok(None)` when Discord answers
    /// with one of the [`MISSING`] statuses.
    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<Option<T>> {
        let url = self.endpoint(segments);
        let path = url.path().to_string();
        debug!(path = %path, "discord GET");
        let resp = self
            .http
            .get(url)
            .header(reqwest::header::AUTHORIZATION, self.authorization())
            .send()
            .await
            .inspect_err(|e| warn!(path = %path, error = %e, "discord request failed"))?;

        let status = resp.status();
        if MISSING.contains(&status) {
            debug!(path = %path, status = status.as_u16(), "discord resource missing");
            return Ok(None);
        }

        let body = resp.text().await?;
        if !status.is_success() {
            warn!(path = %path, status = status.as_u16(), body = %body, "discord API error");
            return Err(DirectoryError::unavailable(Some(status.as_u16()), body));
        }

        serde_json::from_str(&body).map(Some).map_err(|e| {
            warn!(path = %path, error = %e, body = %body, "malformed discord response");
            DirectoryError::unavailable(Some(status.as_u16()), format!("malformed response: {e}"))
        })
    }
}

#[async_trait]
impl ChannelDirectory for DiscordClient {
    fn guild_id(&self) -> &str {
        &self.guild_id
    }

    async fn guild(&self) -> Result<Option<Guild>> {
        let guild = self
            .get_json::<Guild>(&["guilds", &self.guild_id])
            .await?;
        if guild.is_none() {
            warn!(guild_id = %self.guild_id, "bot is not a member of the configured guild");
        }
        Ok(guild)
    }

    async fn guild_channels(&self) -> Result<Vec<Channel>> {
        self.get_json(&["guilds", &self.guild_id, "channels"])
            .await?
            .ok_or_else(|| DirectoryError::not_found(format!("guild {}", self.guild_id)))
    }

    async fn channel(&self, channel_id: &str) -> Result<Channel> {
        self.get_json(&["channels", channel_id])
            .await?
            .ok_or_else(|| DirectoryError::not_found(format!("channel {channel_id}")))
    }

    async fn channel_permissions(&self, channel_id: &str) -> Result<Permissions> {
        self.get_json::<PermissionsResponse>(&["channels", channel_id, "permissions", "@me"])
            .await?
            .map(|r| r.permissions)
            .ok_or_else(|| DirectoryError::not_found(format!("channel {channel_id}")))
    }

    async fn post_message(&self, channel_id: &str, content: &str) -> Result<()> {
        let url = self.endpoint(&["channels", channel_id, "messages"]);
        debug!(path = %url.path(), "discord POST");
        let resp = self
            .http
            .post(url)
            .header(reqwest::header::AUTHORIZATION, self.authorization())
            .json(&CreateMessage { content })
            .send()
            .await
            .inspect_err(|e| warn!(channel_id, error = %e, "discord request failed"))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            warn!(channel_id, status, body = %body, "discord rejected message");
            return Err(DirectoryError::Rejected { status, body });
        }
        Ok(())
    }
}
