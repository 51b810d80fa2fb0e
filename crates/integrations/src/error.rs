use {
    thiserror::Error,
    whalebuddy_common::http::status_suffix,
    whalebuddy_discord::{ChannelKind, DirectoryError, Permissions},
};

/// Storage-layer failures.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Migrate(#[from] sqlx::migrate::MigrateError),

    /// A row carried a status outside the two known values.
    #[error("invalid integration status in store: {value:?}")]
    InvalidStatus { value: String },
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Which pre-save check a channel failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationFailure {
    #[error("channel belongs to another server (expected guild {expected})")]
    WrongGuild {
        expected: String,
        actual: Option<String>,
    },

    #[error("only text channels are supported ({kind:?})")]
    NotTextChannel { kind: ChannelKind },

    #[error("the bot lacks permission {missing} in this channel")]
    MissingPermissions { missing: Permissions },

    /// The permission lookup itself failed; treated as a failed check.
    #[error("the bot's permissions in this channel could not be verified")]
    PermissionsUnverified { cause: String },
}

/// Errors surfaced by [`IntegrationService`](crate::IntegrationService).
#[derive(Debug, Error)]
pub enum IntegrationError {
    #[error("discord is unavailable{}: {body}", status_suffix(.status))]
    RemoteUnavailable { status: Option<u16>, body: String },

    #[error("{resource} not found")]
    RemoteNotFound { resource: String },

    #[error("discord rejected the request ({status}): {body}")]
    RemoteRejected { status: u16, body: String },

    #[error("validation failed: {0}")]
    ValidationFailed(#[from] ValidationFailure),

    #[error("no active integration; select a channel first")]
    NotConfigured,

    #[error("invalid input: {message}")]
    InvalidInput { message: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IntegrationError {
    #[must_use]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Stable machine-readable kind for the request boundary.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::RemoteUnavailable { .. } => "remote_unavailable",
            Self::RemoteNotFound { .. } => "remote_not_found",
            Self::RemoteRejected { .. } => "remote_rejected",
            Self::ValidationFailed(_) => "validation_failed",
            Self::NotConfigured => "not_configured",
            Self::InvalidInput { .. } => "invalid_input",
            Self::Store(_) => "internal",
        }
    }

    /// Whether trying again later could plausibly succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RemoteUnavailable { .. } | Self::Store(_))
    }
}

impl From<DirectoryError> for IntegrationError {
    fn from(e: DirectoryError) -> Self {
        match e {
            DirectoryError::Unavailable { status, body } => Self::RemoteUnavailable { status, body },
            DirectoryError::NotFound { resource } => Self::RemoteNotFound { resource },
            DirectoryError::Rejected { status, body } => Self::RemoteRejected { status, body },
        }
    }
}

pub type Result<T> = std::result::Result<T, IntegrationError>;
