//! GovernAI - contract governance copilot CLI
//!
#![doc = "Main entry point for the GovernAI copilot client."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use governai::api::UploadFilters;
use governai::cli::{Cli, Commands};
use governai::commands;
use governai::config::Config;
use governai::session::SubmitOutcome;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    init_tracing(cli.verbose, cli.json_logs);

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    match cli.command {
        Commands::Chat => {
            commands::chat::run_chat(config).await?;
            Ok(())
        }
        Commands::Query { text, json } => {
            tracing::debug!("One-shot query (json: {})", json);
            let outcome = commands::query::run_query(config, text, json).await?;
            exit_on_failure(&outcome);
            Ok(())
        }
        Commands::Upload { file, filters } => {
            tracing::debug!("One-shot upload of {}", file.display());
            let outcome =
                commands::upload::run_upload(config, file, UploadFilters::from(filters)).await?;
            exit_on_failure(&outcome);
            Ok(())
        }
        Commands::Contracts { json } => {
            commands::records::list_contracts(&config, json).await?;
            Ok(())
        }
        Commands::Compliance { command } => {
            commands::records::run_compliance(&config, command).await?;
            Ok(())
        }
        Commands::Reports { command } => {
            commands::records::run_reports(&config, command).await?;
            Ok(())
        }
        Commands::Usage { command } => {
            commands::usage::run_usage(&config, command)?;
            Ok(())
        }
    }
}

/// One-shot commands report anything but a clean answer through the exit code
fn exit_on_failure(outcome: &SubmitOutcome) {
    let code = match outcome {
        SubmitOutcome::Completed { failed: false } => return,
        SubmitOutcome::GateRejected => 3,
        SubmitOutcome::Invalid(_) => 2,
        SubmitOutcome::Completed { failed: true } | SubmitOutcome::Busy => 1,
    };
    std::process::exit(code);
}

/// Initialize tracing subscriber with environment filter
fn init_tracing(verbose: bool, json: bool) {
    let default_level = if verbose { "governai=debug" } else { "governai=info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
