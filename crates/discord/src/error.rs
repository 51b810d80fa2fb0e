use {thiserror::Error, whalebuddy_common::http::status_suffix};

/// Failures talking to the Discord HTTP API.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// Transport failure, unclassified non-2xx status or an undecodable
    /// body. `status` is `None` when no response was received.
    #[error("discord API unavailable{}: {body}", status_suffix(.status))]
    Unavailable { status: Option<u16>, body: String },

    /// The guild or channel does not exist or the bot cannot see it.
    #[error("{resource} not found on discord")]
    NotFound { resource: String },

    /// Discord understood the request but refused the action.
    #[error("discord rejected the request ({status}): {body}")]
    Rejected { status: u16, body: String },
}

impl DirectoryError {
    #[must_use]
    pub fn unavailable(status: Option<u16>, body: impl Into<String>) -> Self {
        Self::Unavailable {
            status,
            body: body.into(),
        }
    }

    #[must_use]
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }
}

impl From<reqwest::Error> for DirectoryError {
    fn from(e: reqwest::Error) -> Self {
        Self::unavailable(e.status().map(|s| s.as_u16()), e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DirectoryError>;
