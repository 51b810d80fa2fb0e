//! Integration lifecycle: list candidates, read status, save a selection,
//! disconnect, and send a test message.
//!
//! `disconnected` (no record, or a record flipped off) moves to `connected`
//! only after the channel is fetched from Discord and passes the guild,
//! text-type and permission checks. Nothing is written to the store until all
//! of them pass. Reads never mutate.

use std::sync::Arc;

use {
    serde::Serialize,
    tracing::{debug, info, warn},
    whalebuddy_discord::{ChannelDirectory, FailReason, Guild, PermissionValidator, Verdict},
};

use crate::{
    error::{IntegrationError, Result, ValidationFailure},
    record::{IntegrationStatus, NewSelection},
    store::IntegrationStore,
};

/// Fixed diagnostic message posted by [`IntegrationService::send_test_message`].
pub const TEST_MESSAGE: &str = "🐋 **WhaleBuddy Test Message**\n\n\
    Hello! This is a test message from WhaleBuddy.\n\
    Your integration is working correctly! ✅";

/// What a user currently has linked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationView {
    pub status: IntegrationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guild_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
}

impl IntegrationView {
    fn disconnected() -> Self {
        Self {
            status: IntegrationStatus::Disconnected,
            guild_id: None,
            channel_id: None,
            channel_name: None,
            updated_at: None,
        }
    }
}

/// A text channel the user may pick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelCandidate {
    pub id: String,
    pub name: String,
    pub guild_id: String,
    pub guild_name: String,
}

/// Result of listing candidates. `bot_present == false` means the bot has not
/// been invited to the guild yet; `channels` is then empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelListing {
    pub bot_present: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guild: Option<Guild>,
    pub channels: Vec<ChannelCandidate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveOutcome {
    pub success: bool,
    pub message: &'static str,
    pub channel_id: String,
    pub channel_name: String,
}

/// Plain success acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ack {
    pub success: bool,
    pub message: &'static str,
}

impl Ack {
    fn ok(message: &'static str) -> Self {
        Self {
            success: true,
            message,
        }
    }
}

/// Orchestrates the directory, the validator and the store.
pub struct IntegrationService {
    directory: Arc<dyn ChannelDirectory>,
    store: Arc<dyn IntegrationStore>,
    validator: PermissionValidator,
}

impl IntegrationService {
    pub fn new(directory: Arc<dyn ChannelDirectory>, store: Arc<dyn IntegrationStore>) -> Self {
        Self {
            directory,
            store,
            validator: PermissionValidator::default(),
        }
    }

    /// Current integration for `user_id`. A missing record reads as
    /// `disconnected`.
    pub async fn status(&self, user_id: &str) -> Result<IntegrationView> {
        require("user_id", user_id)?;
        Ok(match self.store.get(user_id).await? {
            Some(rec) => IntegrationView {
                status: rec.status,
                guild_id: Some(rec.guild_id),
                channel_id: Some(rec.channel_id),
                channel_name: Some(rec.channel_name),
                updated_at: Some(rec.updated_at),
            },
            None => IntegrationView::disconnected(),
        })
    }

    /// Metadata for the configured guild, `None` when the bot is not in it.
    pub async fn guild(&self) -> Result<Option<Guild>> {
        Ok(self.directory.guild().await?)
    }

    /// Text channels of the configured guild, sorted by name.
    pub async fn list_channels(&self) -> Result<ChannelListing> {
        let listed = self.directory.list_channels().await?;
        let Some(guild) = listed.guild else {
            info!(guild_id = %self.directory.guild_id(), "bot not present in guild, no candidates");
            return Ok(ChannelListing {
                bot_present: false,
                guild: None,
                channels: Vec::new(),
            });
        };

        let channels = listed
            .channels
            .into_iter()
            .map(|c| ChannelCandidate {
                id: c.id,
                name: c.name,
                guild_id: guild.id.clone(),
                guild_name: guild.name.clone(),
            })
            .collect::<Vec<_>>();
        debug!(guild_id = %guild.id, count = channels.len(), "listed candidate channels");

        Ok(ChannelListing {
            bot_present: true,
            guild: Some(guild),
            channels,
        })
    }

    /// Validate `channel_id` and link it to `user_id`.
    ///
    /// Directory errors from the channel lookup propagate with their kind;
    /// failed checks are `ValidationFailed` naming the check. The store is
    /// only touched once every check has passed.
    pub async fn save_channel(
        &self,
        user_id: &str,
        channel_id: &str,
        channel_name: &str,
    ) -> Result<SaveOutcome> {
        require("user_id", user_id)?;
        require("channel_id", channel_id)?;
        require("channel_name", channel_name)?;
        require_snowflake("channel_id", channel_id)?;

        let guild_id = self.directory.guild_id();
        let channel = self.directory.channel(channel_id).await?;

        if !channel.belongs_to(guild_id) {
            warn!(user_id, channel_id, channel_guild = ?channel.guild_id, "channel outside configured guild");
            return Err(ValidationFailure::WrongGuild {
                expected: guild_id.to_string(),
                actual: channel.guild_id.clone(),
            }
            .into());
        }

        match self.validator.check(self.directory.as_ref(), &channel).await {
            Verdict::Pass => {},
            Verdict::Fail(reason) => {
                warn!(user_id, channel_id, %reason, "channel failed permission validation");
                return Err(match reason {
                    FailReason::NotTextChannel { kind } => ValidationFailure::NotTextChannel { kind },
                    FailReason::MissingPermissions { missing, .. } => {
                        ValidationFailure::MissingPermissions { missing }
                    },
                    FailReason::Lookup(cause) => ValidationFailure::PermissionsUnverified { cause },
                }
                .into());
            },
        }

        let record = self
            .store
            .upsert(NewSelection {
                user_id: user_id.to_string(),
                guild_id: guild_id.to_string(),
                channel_id: channel.id,
                channel_name: channel_name.trim().to_string(),
            })
            .await?;
        info!(user_id, channel_id = %record.channel_id, "integration connected");

        Ok(SaveOutcome {
            success: true,
            message: "Channel registered successfully.",
            channel_id: record.channel_id,
            channel_name: record.channel_name,
        })
    }

    /// Soft-disconnect. Succeeds without writing when there is no record.
    pub async fn disconnect(&self, user_id: &str) -> Result<Ack> {
        require("user_id", user_id)?;
        if self.store.set_disconnected(user_id).await? {
            info!(user_id, "integration disconnected");
        } else {
            debug!(user_id, "disconnect without integration, nothing to do");
        }
        Ok(Ack::ok("Integration disconnected."))
    }

    /// Post [`TEST_MESSAGE`] to the user's connected channel.
    ///
    /// `NotConfigured` without any remote call unless the user is connected.
    pub async fn send_test_message(&self, user_id: &str) -> Result<Ack> {
        require("user_id", user_id)?;
        let record = match self.store.get(user_id).await? {
            Some(rec) if rec.is_connected() => rec,
            _ => {
                debug!(user_id, "test message requested without a connected integration");
                return Err(IntegrationError::NotConfigured);
            },
        };

        self.directory
            .post_message(&record.channel_id, TEST_MESSAGE)
            .await?;
        info!(user_id, channel_id = %record.channel_id, "test message sent");
        Ok(Ack::ok("Test message sent."))
    }
}

fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(IntegrationError::invalid_input(format!("{field} is required")));
    }
    Ok(())
}

/// Discord ids are decimal snowflakes. Anything else is refused before it
/// can reach a request path.
fn require_snowflake(field: &str, value: &str) -> Result<()> {
    if !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(IntegrationError::invalid_input(format!(
            "{field} must be a numeric Discord id"
        )));
    }
    Ok(())
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use std::{
        collections::HashMap,
        sync::{
            Mutex,
            atomic::{AtomicUsize, Ordering},
        },
    };

    use {
        super::*,
        crate::{
            error::StoreResult,
            record::IntegrationRecord,
            store::{SqliteIntegrationStore, tests::test_pool},
        },
        async_trait::async_trait,
        whalebuddy_discord::{Channel, ChannelKind, DirectoryError, Permissions},
    };

    const GUILD: &str = "g1";

    /// In-memory directory that counts every remote call.
    #[derive(Default)]
    struct FakeDirectory {
        guild: Option<Guild>,
        channels: Vec<Channel>,
        permissions: HashMap<String, u64>,
        reject_posts: bool,
        calls: AtomicUsize,
        posted: Mutex<Vec<(String, String)>>,
    }

    impl FakeDirectory {
        fn with_guild() -> Self {
            Self {
                guild: Some(Guild {
                    id: GUILD.into(),
                    name: "Whale Pod".into(),
                }),
                ..Default::default()
            }
        }

        fn channel(mut self, id: &str, name: &str, kind: ChannelKind, guild: &str) -> Self {
            self.channels.push(Channel {
                id: id.into(),
                name: name.into(),
                kind,
                guild_id: Some(guild.into()),
            });
            self
        }

        fn perms(mut self, id: &str, bits: u64) -> Self {
            self.permissions.insert(id.into(), bits);
            self
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn hit(&self) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl ChannelDirectory for FakeDirectory {
        fn guild_id(&self) -> &str {
            GUILD
        }

        async fn guild(&self) -> whalebuddy_discord::Result<Option<Guild>> {
            self.hit();
            Ok(self.guild.clone())
        }

        async fn guild_channels(&self) -> whalebuddy_discord::Result<Vec<Channel>> {
            self.hit();
            Ok(self
                .channels
                .iter()
                .filter(|c| c.belongs_to(GUILD))
                .cloned()
                .collect())
        }

        async fn channel(&self, channel_id: &str) -> whalebuddy_discord::Result<Channel> {
            self.hit();
            self.channels
                .iter()
                .find(|c| c.id == channel_id)
                .cloned()
                .ok_or_else(|| DirectoryError::not_found(format!("channel {channel_id}")))
        }

        async fn channel_permissions(
            &self,
            channel_id: &str,
        ) -> whalebuddy_discord::Result<Permissions> {
            self.hit();
            self.permissions
                .get(channel_id)
                .map(|b| Permissions::from_bits(*b))
                .ok_or_else(|| DirectoryError::unavailable(Some(500), "permissions down"))
        }

        async fn post_message(
            &self,
            channel_id: &str,
            content: &str,
        ) -> whalebuddy_discord::Result<()> {
            self.hit();
            if self.reject_posts {
                return Err(DirectoryError::Rejected {
                    status: 403,
                    body: "Missing Access".into(),
                });
            }
            self.posted
                .lock()
                .unwrap()
                .push((channel_id.to_string(), content.to_string()));
            Ok(())
        }
    }

    /// Store wrapper that counts every access.
    struct CountingStore {
        inner: SqliteIntegrationStore,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl IntegrationStore for CountingStore {
        async fn get(&self, user_id: &str) -> StoreResult<Option<IntegrationRecord>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.get(user_id).await
        }

        async fn upsert(&self, selection: NewSelection) -> StoreResult<IntegrationRecord> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.upsert(selection).await
        }

        async fn set_disconnected(&self, user_id: &str) -> StoreResult<bool> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.set_disconnected(user_id).await
        }
    }

    const VIEW_SEND: u64 =
        Permissions::VIEW_CHANNEL.bits() | Permissions::SEND_MESSAGES.bits();

    fn standard_directory() -> FakeDirectory {
        FakeDirectory::with_guild()
            .channel("1001", "general", ChannelKind::Text, GUILD)
            .channel("1002", "alerts", ChannelKind::Text, GUILD)
            .channel("1003", "voice-lounge", ChannelKind::Voice, GUILD)
            .channel("1004", "elsewhere", ChannelKind::Text, "other-guild")
            .channel("1005", "read-only", ChannelKind::Text, GUILD)
            .perms("1001", VIEW_SEND)
            .perms("1002", VIEW_SEND | Permissions::MANAGE_MESSAGES.bits())
            .perms("1004", VIEW_SEND)
            .perms("1005", Permissions::VIEW_CHANNEL.bits())
    }

    async fn service(
        directory: FakeDirectory,
    ) -> (IntegrationService, Arc<FakeDirectory>, Arc<CountingStore>) {
        let directory = Arc::new(directory);
        let store = Arc::new(CountingStore {
            inner: SqliteIntegrationStore::new(test_pool().await),
            calls: AtomicUsize::new(0),
        });
        let svc = IntegrationService::new(directory.clone(), store.clone());
        (svc, directory, store)
    }

    #[tokio::test]
    async fn status_without_record_is_disconnected() {
        let (svc, dir, _) = service(standard_directory()).await;
        let view = svc.status("u1").await.unwrap();
        assert_eq!(view, IntegrationView::disconnected());
        assert_eq!(dir.calls(), 0);
    }

    #[tokio::test]
    async fn listing_and_guild_never_touch_the_store() {
        let (svc, _, store) = service(standard_directory()).await;
        svc.list_channels().await.unwrap();
        svc.guild().await.unwrap();
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn list_channels_returns_sorted_text_channels_with_guild() {
        let (svc, _, _) = service(standard_directory()).await;
        let listing = svc.list_channels().await.unwrap();

        assert!(listing.bot_present);
        let names: Vec<&str> = listing.channels.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["alerts", "general", "read-only"]);
        assert!(listing.channels.iter().all(|c| c.guild_name == "Whale Pod"));
    }

    #[tokio::test]
    async fn list_channels_flags_missing_bot() {
        let (svc, dir, _) = service(FakeDirectory::default()).await;
        let listing = svc.list_channels().await.unwrap();
        assert!(!listing.bot_present);
        assert!(listing.channels.is_empty());
        // Only the guild lookup was made.
        assert_eq!(dir.calls(), 1);
    }

    #[tokio::test]
    async fn save_then_status_is_connected() {
        let (svc, _, _) = service(standard_directory()).await;
        let out = svc.save_channel("u1", "1001", "general").await.unwrap();
        assert!(out.success);
        assert_eq!(out.channel_id, "1001");

        let view = svc.status("u1").await.unwrap();
        assert_eq!(view.status, IntegrationStatus::Connected);
        assert_eq!(view.guild_id.as_deref(), Some(GUILD));
        assert_eq!(view.channel_id.as_deref(), Some("1001"));
        assert_eq!(view.channel_name.as_deref(), Some("general"));
    }

    #[tokio::test]
    async fn save_stores_caller_label() {
        let (svc, _, _) = service(standard_directory()).await;
        let out = svc.save_channel("u1", "1001", "  team pings ").await.unwrap();
        assert_eq!(out.channel_name, "team pings");

        let view = svc.status("u1").await.unwrap();
        assert_eq!(view.channel_name.as_deref(), Some("team pings"));
    }

    #[tokio::test]
    async fn save_is_idempotent() {
        let (svc, _, store) = service(standard_directory()).await;
        svc.save_channel("u1", "1001", "general").await.unwrap();
        let first = store.inner.get("u1").await.unwrap().unwrap();
        svc.save_channel("u1", "1001", "general").await.unwrap();
        let second = store.inner.get("u1").await.unwrap().unwrap();

        assert_eq!(second.channel_id, first.channel_id);
        assert_eq!(second.status, IntegrationStatus::Connected);
        assert_eq!(second.created_at, first.created_at);
        assert!(second.updated_at > first.updated_at);
    }

    #[tokio::test]
    async fn switching_channels_updates_the_single_record() {
        let (svc, _, _) = service(standard_directory()).await;
        svc.save_channel("u1", "1001", "general").await.unwrap();
        svc.save_channel("u1", "1002", "alerts").await.unwrap();

        let view = svc.status("u1").await.unwrap();
        assert_eq!(view.channel_id.as_deref(), Some("1002"));
        assert_eq!(view.status, IntegrationStatus::Connected);
    }

    async fn assert_rejected_without_write(channel_id: &str) -> IntegrationError {
        let (svc, _, store) = service(standard_directory()).await;
        let err = svc
            .save_channel("u1", channel_id, "label")
            .await
            .unwrap_err();
        // Only the failed save touched anything; no upsert happened.
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
        assert_eq!(
            svc.status("u1").await.unwrap().status,
            IntegrationStatus::Disconnected
        );
        err
    }

    #[tokio::test]
    async fn missing_send_permission_fails_validation() {
        let err = assert_rejected_without_write("1005").await;
        assert!(matches!(
            err,
            IntegrationError::ValidationFailed(ValidationFailure::MissingPermissions { missing })
                if missing == Permissions::SEND_MESSAGES
        ));
    }

    #[tokio::test]
    async fn voice_channel_fails_validation() {
        let err = assert_rejected_without_write("1003").await;
        assert!(matches!(
            err,
            IntegrationError::ValidationFailed(ValidationFailure::NotTextChannel {
                kind: ChannelKind::Voice
            })
        ));
    }

    #[tokio::test]
    async fn foreign_guild_channel_fails_validation() {
        let err = assert_rejected_without_write("1004").await;
        assert!(matches!(
            err,
            IntegrationError::ValidationFailed(ValidationFailure::WrongGuild { ref actual, .. })
                if actual.as_deref() == Some("other-guild")
        ));
    }

    #[tokio::test]
    async fn unknown_channel_propagates_not_found() {
        let err = assert_rejected_without_write("9999").await;
        assert!(matches!(err, IntegrationError::RemoteNotFound { .. }), "{err}");
    }

    #[tokio::test]
    async fn permission_lookup_failure_is_a_validation_failure() {
        let dir = FakeDirectory::with_guild().channel("1001", "general", ChannelKind::Text, GUILD);
        let (svc, _, store) = service(dir).await;
        let err = svc.save_channel("u1", "1001", "general").await.unwrap_err();
        assert!(matches!(
            err,
            IntegrationError::ValidationFailed(ValidationFailure::PermissionsUnverified { .. })
        ));
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failed_switch_keeps_previous_channel() {
        let (svc, _, _) = service(standard_directory()).await;
        svc.save_channel("u1", "1001", "general").await.unwrap();
        let before = svc.status("u1").await.unwrap();

        svc.save_channel("u1", "1005", "read-only").await.unwrap_err();
        assert_eq!(svc.status("u1").await.unwrap(), before);
    }

    #[tokio::test]
    async fn blank_input_is_rejected_before_remote_calls() {
        let (svc, dir, _) = service(standard_directory()).await;
        for (user, channel, name) in [("", "1001", "n"), ("u1", " ", "n"), ("u1", "1001", "")] {
            let err = svc.save_channel(user, channel, name).await.unwrap_err();
            assert!(matches!(err, IntegrationError::InvalidInput { .. }));
        }
        assert_eq!(dir.calls(), 0);
    }

    #[tokio::test]
    async fn non_numeric_channel_id_is_rejected_before_remote_calls() {
        let (svc, dir, store) = service(standard_directory()).await;
        for channel in ["../guilds/g1/members", "1001/messages", "1001?x=1", "١٢٣"] {
            let err = svc.save_channel("u1", channel, "label").await.unwrap_err();
            assert!(matches!(err, IntegrationError::InvalidInput { .. }), "{channel}: {err}");
        }
        assert_eq!(dir.calls(), 0);
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn disconnect_without_record_is_noop_success() {
        let (svc, _, store) = service(standard_directory()).await;
        let ack = svc.disconnect("u1").await.unwrap();
        assert!(ack.success);
        assert!(store.inner.get("u1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn disconnect_flips_status() {
        let (svc, _, _) = service(standard_directory()).await;
        svc.save_channel("u1", "1001", "general").await.unwrap();
        svc.disconnect("u1").await.unwrap();

        let view = svc.status("u1").await.unwrap();
        assert_eq!(view.status, IntegrationStatus::Disconnected);
        assert_eq!(view.channel_id.as_deref(), Some("1001"));
    }

    #[tokio::test]
    async fn send_test_without_integration_makes_no_remote_calls() {
        let (svc, dir, _) = service(standard_directory()).await;
        let err = svc.send_test_message("u1").await.unwrap_err();
        assert!(matches!(err, IntegrationError::NotConfigured));
        assert_eq!(dir.calls(), 0);
    }

    #[tokio::test]
    async fn send_test_after_disconnect_is_not_configured() {
        let (svc, dir, _) = service(standard_directory()).await;
        svc.save_channel("u1", "1001", "general").await.unwrap();
        svc.disconnect("u1").await.unwrap();
        let calls_before = dir.calls();

        let err = svc.send_test_message("u1").await.unwrap_err();
        assert!(matches!(err, IntegrationError::NotConfigured));
        assert_eq!(dir.calls(), calls_before);
    }

    #[tokio::test]
    async fn send_test_posts_fixed_message_to_stored_channel() {
        let (svc, dir, _) = service(standard_directory()).await;
        svc.save_channel("u1", "1002", "alerts").await.unwrap();
        svc.send_test_message("u1").await.unwrap();

        let posted = dir.posted.lock().unwrap();
        assert_eq!(posted.as_slice(), &[("1002".to_string(), TEST_MESSAGE.to_string())]);
    }

    #[tokio::test]
    async fn send_test_rejection_keeps_state() {
        let mut dir = standard_directory();
        dir.reject_posts = true;
        let (svc, _, _) = service(dir).await;
        svc.save_channel("u1", "1001", "general").await.unwrap();
        let before = svc.status("u1").await.unwrap();

        let err = svc.send_test_message("u1").await.unwrap_err();
        assert!(matches!(err, IntegrationError::RemoteRejected { status: 403, .. }));
        assert_eq!(svc.status("u1").await.unwrap(), before);
    }
}
