//! Discord channel directory for whalebuddy.
//!
//! Wraps the parts of the Discord HTTP API the integration flow needs:
//! guild metadata, the guild's channel list, single-channel lookups, the
//! bot's effective permissions on a channel, and posting a message. All
//! calls authenticate as the configured bot and make exactly one request.

pub mod client;
pub mod directory;
pub mod error;
pub mod permissions;
pub mod types;
pub mod validator;

pub use {
    client::DiscordClient,
    directory::ChannelDirectory,
    error::{DirectoryError, Result},
    permissions::Permissions,
    types::{Channel, ChannelKind, Guild, GuildChannels},
    validator::{FailReason, PermissionValidator, Verdict},
};
