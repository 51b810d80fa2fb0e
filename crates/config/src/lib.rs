//! Configuration loading, env substitution, env overrides and validation.
//!
//! Config files: `whalebuddy.toml`, `whalebuddy.yaml`, or `whalebuddy.json`
//! Searched in `./` then `~/.config/whalebuddy/`.
//!
//! Supports `${ENV_VAR}` substitution in all string values. The variables
//! `DISCORD_BOT_TOKEN`, `DISCORD_API_URL`, `DISCORD_GUILD_ID` and
//! `DATABASE_URL` override whatever the file says.

pub mod env_subst;
pub mod error;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    error::{Error, Result},
    loader::{apply_env_overrides, config_dir, discover_and_load, load_config},
    schema::{DatabaseConfig, DiscordConfig, WhalebuddyConfig},
    validate::{Diagnostic, Severity, ValidationResult, validate},
};
