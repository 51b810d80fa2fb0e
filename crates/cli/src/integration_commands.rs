use std::process::ExitCode;

use {
    clap::Subcommand,
    serde::Serialize,
    tracing::warn,
    whalebuddy_discord::Guild,
    whalebuddy_integrations::{
        Ack, ChannelListing, IntegrationError, IntegrationService, IntegrationView, SaveOutcome,
    },
};

#[derive(Subcommand)]
pub enum IntegrationAction {
    /// Show the user's current integration.
    Status {
        #[arg(long)]
        user: String,
    },
    /// Show the configured guild and whether the bot is in it.
    Guild,
    /// List text channels the bot can see in the configured guild.
    Channels,
    /// Validate a channel and link it to the user.
    Save {
        #[arg(long)]
        user: String,
        #[arg(long)]
        channel: String,
        /// Label stored with the integration and shown back in status.
        #[arg(long)]
        name: String,
    },
    /// Soft-disconnect the user's integration.
    Disconnect {
        #[arg(long)]
        user: String,
    },
    /// Post the test message to the user's connected channel.
    Test {
        #[arg(long)]
        user: String,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GuildReport {
    bot_present: bool,
    guild: Option<Guild>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Output {
    View(IntegrationView),
    Guild(GuildReport),
    Listing(ChannelListing),
    Saved(SaveOutcome),
    Ack(Ack),
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct Failure {
    success: bool,
    error: &'static str,
    message: String,
    retryable: bool,
}

impl From<&IntegrationError> for Failure {
    fn from(e: &IntegrationError) -> Self {
        Self {
            success: false,
            error: e.code(),
            message: e.to_string(),
            retryable: e.is_retryable(),
        }
    }
}

/// Run one operation and print its JSON result. Operation failures are
/// printed as a JSON body and reported through the exit code.
pub async fn handle(
    service: &IntegrationService,
    action: IntegrationAction,
) -> anyhow::Result<ExitCode> {
    match dispatch(service, action).await {
        Ok(output) => {
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(ExitCode::SUCCESS)
        },
        Err(e) => {
            warn!(code = e.code(), error = %e, "operation failed");
            println!("{}", serde_json::to_string_pretty(&Failure::from(&e))?);
            Ok(ExitCode::FAILURE)
        },
    }
}

async fn dispatch(
    service: &IntegrationService,
    action: IntegrationAction,
) -> Result<Output, IntegrationError> {
    Ok(match action {
        IntegrationAction::Status { user } => Output::View(service.status(&user).await?),
        IntegrationAction::Guild => {
            let guild = service.guild().await?;
            Output::Guild(GuildReport {
                bot_present: guild.is_some(),
                guild,
            })
        },
        IntegrationAction::Channels => Output::Listing(service.list_channels().await?),
        IntegrationAction::Save {
            user,
            channel,
            name,
        } => Output::Saved(service.save_channel(&user, &channel, &name).await?),
        IntegrationAction::Disconnect { user } => Output::Ack(service.disconnect(&user).await?),
        IntegrationAction::Test { user } => Output::Ack(service.send_test_message(&user).await?),
    })
}
