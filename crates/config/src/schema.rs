use {secrecy::Secret, serde::Deserialize};

/// Default base URL of the Discord HTTP API.
pub const DEFAULT_DISCORD_API_URL: &str = "https://discord.com/api/v10";

/// Default SQLite location, created on first use.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://whalebuddy.db?mode=rwc";

/// Root configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WhalebuddyConfig {
    pub discord: DiscordConfig,
    pub database: DatabaseConfig,
}

/// Bot credentials and the single guild integrations are bound to.
/// Read-only: the token only leaves through `expose_secret`.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct DiscordConfig {
    /// Bot token from the Discord developer portal.
    pub bot_token: Secret<String>,

    /// Base URL of the Discord HTTP API, without a trailing slash.
    pub api_base_url: String,

    /// Guild (server) every integration must live in.
    pub guild_id: String,

    /// Per-request timeout applied by the HTTP client.
    pub request_timeout_secs: u64,
}

impl std::fmt::Debug for DiscordConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordConfig")
            .field("bot_token", &"[REDACTED]")
            .field("api_base_url", &self.api_base_url)
            .field("guild_id", &self.guild_id)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            bot_token: Secret::new(String::new()),
            api_base_url: DEFAULT_DISCORD_API_URL.into(),
            guild_id: String::new(),
            request_timeout_secs: 10,
        }
    }
}

impl DiscordConfig {
    /// `api_base_url` with any trailing slash removed.
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.api_base_url.trim_end_matches('/')
    }
}

/// Where integration records are persisted.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// sqlx connection URL.
    pub url: String,

    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_DATABASE_URL.into(),
            max_connections: 5,
        }
    }
}
