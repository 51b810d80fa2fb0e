use std::path::{Path, PathBuf};

use {
    secrecy::Secret,
    tracing::{debug, warn},
};

use crate::{
    env_subst::substitute_env,
    error::{Error, Result},
    schema::WhalebuddyConfig,
};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "whalebuddy.toml",
    "whalebuddy.yaml",
    "whalebuddy.yml",
    "whalebuddy.json",
];

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> Result<WhalebuddyConfig> {
    let raw = std::fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&substitute_env(&raw), path)
}

/// Discover the config file, load it and apply environment overrides.
///
/// Search order:
/// 1. `./whalebuddy.{toml,yaml,yml,json}`
/// 2. `~/.config/whalebuddy/whalebuddy.{toml,yaml,yml,json}`
///
/// A missing or unreadable file falls back to defaults; the environment can
/// still supply every required value.
pub fn discover_and_load() -> WhalebuddyConfig {
    let mut config = match find_config_file() {
        Some(path) => {
            debug!(path = %path.display(), "loading config");
            load_config(&path).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
                WhalebuddyConfig::default()
            })
        },
        None => {
            debug!("no config file found, using defaults");
            WhalebuddyConfig::default()
        },
    };
    apply_env_overrides(&mut config);
    config
}

/// Overlay `DISCORD_*` and `DATABASE_URL` from the process environment.
pub fn apply_env_overrides(config: &mut WhalebuddyConfig) {
    apply_env_overrides_with(config, |name| std::env::var(name).ok());
}

fn apply_env_overrides_with(
    config: &mut WhalebuddyConfig,
    lookup: impl Fn(&str) -> Option<String>,
) {
    let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(token) = get("DISCORD_BOT_TOKEN") {
        config.discord.bot_token = Secret::new(token);
    }
    if let Some(url) = get("DISCORD_API_URL") {
        config.discord.api_base_url = url;
    }
    if let Some(guild_id) = get("DISCORD_GUILD_ID") {
        config.discord.guild_id = guild_id;
    }
    if let Some(url) = get("DATABASE_URL") {
        config.database.url = url;
    }
}

fn find_config_file() -> Option<PathBuf> {
    CONFIG_FILENAMES
        .iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
        .or_else(|| {
            let dir = config_dir()?;
            CONFIG_FILENAMES
                .iter()
                .map(|name| dir.join(name))
                .find(|p| p.exists())
        })
}

/// Returns the user-global config directory (`~/.config/whalebuddy/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "whalebuddy").map(|d| d.config_dir().to_path_buf())
}

fn parse_config(raw: &str, path: &Path) -> Result<WhalebuddyConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        other => Err(Error::UnsupportedFormat {
            extension: other.to_string(),
        }),
    }
}
