mod db_commands;
mod integration_commands;

use std::{path::PathBuf, process::ExitCode, sync::Arc};

use {
    anyhow::bail,
    clap::{Parser, Subcommand},
    tracing::{error, info, warn},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
    whalebuddy_config::{Severity, WhalebuddyConfig},
    whalebuddy_discord::DiscordClient,
    whalebuddy_integrations::{IntegrationService, SqliteIntegrationStore},
};

#[derive(Parser)]
#[command(
    name = "whalebuddy",
    version,
    about = "WhaleBuddy: link a Discord channel for notifications"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Explicit config file (skips discovery).
    #[arg(long, global = true, env = "WHALEBUDDY_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Integration(integration_commands::IntegrationAction),
    /// Database management.
    Db {
        #[command(subcommand)]
        action: db_commands::DbAction,
    },
}

/// Logs go to stderr; stdout is reserved for command results.
fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

fn load_config(explicit: Option<&PathBuf>) -> anyhow::Result<WhalebuddyConfig> {
    match explicit {
        Some(path) => {
            let mut config = whalebuddy_config::load_config(path)?;
            whalebuddy_config::apply_env_overrides(&mut config);
            Ok(config)
        },
        None => Ok(whalebuddy_config::discover_and_load()),
    }
}

/// Log diagnostics and refuse to continue on errors.
fn check_config(config: &WhalebuddyConfig) -> anyhow::Result<()> {
    let result = whalebuddy_config::validate(config);
    let mut failing = Vec::new();
    for diag in &result.diagnostics {
        match diag.severity {
            Severity::Error => {
                error!(path = diag.path, "{}", diag.message);
                failing.push(diag.path);
            },
            Severity::Warning => warn!(path = diag.path, "{}", diag.message),
        }
    }
    if !failing.is_empty() {
        bail!("configuration is incomplete: {}", failing.join(", "));
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "whalebuddy starting");

    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Commands::Db { action } => {
            db_commands::handle_db(action, &config.database).await?;
            Ok(ExitCode::SUCCESS)
        },
        Commands::Integration(action) => {
            check_config(&config)?;
            let pool = db_commands::connect(&config.database).await?;
            whalebuddy_integrations::run_migrations(&pool).await?;

            let service = IntegrationService::new(
                Arc::new(DiscordClient::new(&config.discord)?),
                Arc::new(SqliteIntegrationStore::new(pool.clone())),
            );
            let code = integration_commands::handle(&service, action).await?;
            pool.close().await;
            Ok(code)
        },
    }
}
