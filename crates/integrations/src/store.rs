use {async_trait::async_trait, sqlx::SqlitePool, tracing::debug, whalebuddy_common::time::now_ms};

use crate::{
    error::{StoreError, StoreResult},
    record::{IntegrationRecord, NewSelection},
};

/// Persistent storage for integrations, keyed by user.
#[async_trait]
pub trait IntegrationStore: Send + Sync {
    async fn get(&self, user_id: &str) -> StoreResult<Option<IntegrationRecord>>;

    /// Insert a connected record, or update the existing one in place.
    /// Identity and `created_at` survive; `updated_at` always moves forward.
    async fn upsert(&self, selection: NewSelection) -> StoreResult<IntegrationRecord>;

    /// Flip the user's record to `disconnected`. Returns `false` (and writes
    /// nothing) when the user has no record.
    async fn set_disconnected(&self, user_id: &str) -> StoreResult<bool>;
}

/// Internal row type for sqlx mapping.
#[derive(sqlx::FromRow)]
struct IntegrationRow {
    user_id: String,
    guild_id: String,
    channel_id: String,
    channel_name: String,
    status: String,
    created_at: i64,
    updated_at: i64,
}

impl TryFrom<IntegrationRow> for IntegrationRecord {
    type Error = StoreError;

    fn try_from(r: IntegrationRow) -> StoreResult<Self> {
        Ok(Self {
            status: r.status.parse()?,
            user_id: r.user_id,
            guild_id: r.guild_id,
            channel_id: r.channel_id,
            channel_name: r.channel_name,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

const COLUMNS: &str = "user_id, guild_id, channel_id, channel_name, status, created_at, updated_at";

/// SQLite-backed integration store.
///
/// Uniqueness per user comes from the `user_id` primary key, so concurrent
/// saves for one user collapse into a single row (last writer wins).
pub struct SqliteIntegrationStore {
    pool: SqlitePool,
}

impl SqliteIntegrationStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IntegrationStore for SqliteIntegrationStore {
    async fn get(&self, user_id: &str) -> StoreResult<Option<IntegrationRecord>> {
        let row = sqlx::query_as::<_, IntegrationRow>(&format!(
            "SELECT {COLUMNS} FROM channel_integrations WHERE user_id = ?"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(TryInto::try_into).transpose()
    }

    async fn upsert(&self, selection: NewSelection) -> StoreResult<IntegrationRecord> {
        let now = now_ms();
        let row = sqlx::query_as::<_, IntegrationRow>(&format!(
            r#"INSERT INTO channel_integrations
                 (user_id, guild_id, channel_id, channel_name, status, created_at, updated_at)
               VALUES (?, ?, ?, ?, 'connected', ?, ?)
               ON CONFLICT(user_id) DO UPDATE SET
                 guild_id = excluded.guild_id,
                 channel_id = excluded.channel_id,
                 channel_name = excluded.channel_name,
                 status = 'connected',
                 updated_at = MAX(excluded.updated_at, channel_integrations.updated_at + 1)
               RETURNING {COLUMNS}"#
        ))
        .bind(&selection.user_id)
        .bind(&selection.guild_id)
        .bind(&selection.channel_id)
        .bind(&selection.channel_name)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        debug!(user_id = %selection.user_id, channel_id = %selection.channel_id, "integration upserted");
        row.try_into()
    }

    async fn set_disconnected(&self, user_id: &str) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"UPDATE channel_integrations
               SET status = 'disconnected',
                   updated_at = MAX(?, updated_at + 1)
               WHERE user_id = ?"#,
        )
        .bind(now_ms())
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
