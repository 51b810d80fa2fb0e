use std::str::FromStr;

use {
    clap::Subcommand,
    sqlx::{
        SqlitePool,
        sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    },
    tracing::debug,
    whalebuddy_config::DatabaseConfig,
};

#[derive(Subcommand)]
pub enum DbAction {
    /// Run all pending database migrations.
    Migrate,
    /// Delete every stored integration but keep the schema.
    Clear,
}

/// Open the configured SQLite pool, creating the file if needed.
pub async fn connect(config: &DatabaseConfig) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&config.url)?.create_if_missing(true);
    debug!(url = %config.url, max_connections = config.max_connections, "opening database");
    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .connect_with(options)
        .await?;
    Ok(pool)
}

pub async fn handle_db(action: DbAction, config: &DatabaseConfig) -> anyhow::Result<()> {
    let pool = connect(config).await?;
    let result = match action {
        DbAction::Migrate => migrate(&pool).await,
        DbAction::Clear => clear(&pool).await,
    };
    pool.close().await;
    result
}

async fn migrate(pool: &SqlitePool) -> anyhow::Result<()> {
    whalebuddy_integrations::run_migrations(pool).await?;
    println!("Migrations applied.");
    Ok(())
}

async fn clear(pool: &SqlitePool) -> anyhow::Result<()> {
    whalebuddy_integrations::run_migrations(pool).await?;
    let done = sqlx::query("DELETE FROM channel_integrations")
        .execute(pool)
        .await?;
    println!("Cleared {} integration(s).", done.rows_affected());
    Ok(())
}
