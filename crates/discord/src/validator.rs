//! Decides whether the bot may operate in a channel.
//!
//! The caller hands over a channel it already fetched by id. The outcome is
//! a plain pass/fail: permission lookup failures (network, malformed data)
//! are logged and turned into a failing verdict and never reach the caller
//! as directory errors.

use tracing::{debug, warn};

use crate::{
    directory::ChannelDirectory,
    permissions::Permissions,
    types::{Channel, ChannelKind},
};

/// Why a channel failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailReason {
    NotTextChannel { kind: ChannelKind },
    MissingPermissions { granted: Permissions, missing: Permissions },
    /// The permission lookup failed.
    Lookup(String),
}

impl std::fmt::Display for FailReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotTextChannel { kind } => write!(f, "not a text channel ({kind:?})"),
            Self::MissingPermissions { granted, missing } => {
                write!(f, "bot lacks permissions {missing} (granted {granted})")
            },
            Self::Lookup(cause) => write!(f, "lookup failed: {cause}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    Fail(FailReason),
}

impl Verdict {
    #[must_use]
    pub fn passed(&self) -> bool {
        matches!(self, Self::Pass)
    }
}

/// Checks a channel against a required permission mask.
#[derive(Debug, Clone, Copy)]
pub struct PermissionValidator {
    required: Permissions,
}

impl Default for PermissionValidator {
    fn default() -> Self {
        Self::new(Permissions::REQUIRED)
    }
}

impl PermissionValidator {
    #[must_use]
    pub fn new(required: Permissions) -> Self {
        Self { required }
    }

    /// Validate a fetched channel. Non-text channels fail without a
    /// permission lookup.
    pub async fn check(&self, directory: &dyn ChannelDirectory, channel: &Channel) -> Verdict {
        if !channel.is_text() {
            debug!(channel_id = %channel.id, kind = ?channel.kind, "channel is not a text channel");
            return Verdict::Fail(FailReason::NotTextChannel { kind: channel.kind });
        }

        let granted = match directory.channel_permissions(&channel.id).await {
            Ok(granted) => granted,
            Err(e) => {
                warn!(channel_id = %channel.id, error = %e, "permission lookup failed during validation");
                return Verdict::Fail(FailReason::Lookup(e.to_string()));
            },
        };

        if granted.contains(self.required) {
            debug!(channel_id = %channel.id, %granted, "channel permissions ok");
            Verdict::Pass
        } else {
            let missing = granted.missing(self.required);
            debug!(channel_id = %channel.id, %granted, %missing, "bot lacks required permissions");
            Verdict::Fail(FailReason::MissingPermissions { granted, missing })
        }
    }
}
