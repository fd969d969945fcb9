use std::process::ExitCode;

use clap::Parser;
use mdh_reminders::{run_reminders, AwsSecretsManager, InvocationArgs, ReminderConfig, SecretStore};
use tracing_subscriber::EnvFilter;

/// Send survey reminder notifications to one participant
#[derive(Debug, Parser)]
#[command(name = "mdh-reminders", version, about)]
struct Cli {
    /// Participant identifier
    #[arg(long, env = "MDH_PID")]
    pid: String,

    /// Survey identifier (accepted for compatibility, not used for dispatch)
    #[arg(long, env = "MDH_SID")]
    sid: Option<String>,

    /// Notification identifier (mapped identifiers are what is sent)
    #[arg(long, env = "MDH_NID")]
    nid: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    // .env is a development convenience; production reads the secret store
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config = match ReminderConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Fatal Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let store = if config.is_production() {
        Some(AwsSecretsManager::new(config.aws_region.clone()).await)
    } else {
        None
    };

    let args = InvocationArgs {
        survey_id: cli.sid,
        notification_id: cli.nid,
        participant_id: cli.pid,
    };

    match run_reminders(&config, store.as_ref().map(|s| s as &dyn SecretStore), &args).await {
        Ok(summary) => {
            tracing::info!(
                "Done: {} task(s) examined, {} notification(s) sent, {} failed",
                summary.tasks_examined,
                summary.notifications_sent,
                summary.notifications_failed
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("Reminder run aborted: {}", e);
            ExitCode::FAILURE
        }
    }
}
