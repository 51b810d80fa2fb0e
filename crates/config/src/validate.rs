//! Semantic checks on a loaded configuration.
//!
//! Errors mean the integration service cannot run at all; warnings are
//! printed but do not block startup.

use {secrecy::ExposeSecret, std::fmt};

use crate::schema::WhalebuddyConfig;

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Dotted path, e.g. "discord.guild_id"
    pub path: &'static str,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.severity, self.path, self.message)
    }
}

/// Result of validating a configuration.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidationResult {
    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    fn push(&mut self, severity: Severity, path: &'static str, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic {
            severity,
            path,
            message: message.into(),
        });
    }
}

/// Check that the bot credential, guild and API URL are usable.
#[must_use]
pub fn validate(config: &WhalebuddyConfig) -> ValidationResult {
    let mut result = ValidationResult::default();
    let discord = &config.discord;

    if discord.bot_token.expose_secret().trim().is_empty() {
        result.push(
            Severity::Error,
            "discord.bot_token",
            "bot token is not set (DISCORD_BOT_TOKEN)",
        );
    }

    if discord.guild_id.trim().is_empty() {
        result.push(
            Severity::Error,
            "discord.guild_id",
            "guild id is not set (DISCORD_GUILD_ID)",
        );
    } else if !discord.guild_id.chars().all(|c| c.is_ascii_digit()) {
        result.push(
            Severity::Warning,
            "discord.guild_id",
            format!("'{}' does not look like a Discord snowflake", discord.guild_id),
        );
    }

    match url::Url::parse(discord.base_url()) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {},
        Ok(url) => result.push(
            Severity::Error,
            "discord.api_base_url",
            format!("unsupported scheme '{}'", url.scheme()),
        ),
        Err(e) => result.push(
            Severity::Error,
            "discord.api_base_url",
            format!("invalid URL: {e}"),
        ),
    }

    if discord.request_timeout_secs == 0 {
        result.push(
            Severity::Warning,
            "discord.request_timeout_secs",
            "0 disables the per-request timeout",
        );
    }

    if config.database.url.trim().is_empty() {
        result.push(Severity::Error, "database.url", "database URL is empty");
    }

    result
}
