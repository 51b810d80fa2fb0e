//! Per-user Discord channel integrations.
//!
//! A user links their account to one text channel in the configured guild.
//! [`IntegrationService`] validates the choice against Discord, persists it
//! through an [`IntegrationStore`], and can post a test message to it.

pub mod error;
pub mod record;
pub mod service;
pub mod store;

pub use {
    error::{IntegrationError, Result, StoreError, StoreResult, ValidationFailure},
    record::{IntegrationRecord, IntegrationStatus, NewSelection},
    service::{
        Ack, ChannelCandidate, ChannelListing, IntegrationService, IntegrationView, SaveOutcome,
        TEST_MESSAGE,
    },
    store::{IntegrationStore, SqliteIntegrationStore},
};

/// Run database migrations for the integrations crate.
///
/// Creates the `channel_integrations` table. Call once at startup before
/// using [`SqliteIntegrationStore`].
pub async fn run_migrations(pool: &sqlx::SqlitePool) -> StoreResult<()> {
    sqlx::migrate!("./migrations")
        .set_ignore_missing(true)
        .run(pool)
        .await?;
    Ok(())
}
