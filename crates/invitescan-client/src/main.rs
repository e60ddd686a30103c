//! invitescan CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use tracing::Level;

use invitescan_client::cli::{Cli, Command, ConfigAction};
use invitescan_client::commands;
use invitescan_client::config::ClientConfig;
use invitescan_client::error::{ClientError, ClientResult};
use invitescan_core::{TracingConfig, init_tracing};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let tracing_config = if cli.log_json {
        TracingConfig::service()
    } else if cli.debug || config.debug {
        TracingConfig::cli_debug()
    } else {
        TracingConfig::default().with_level(Level::WARN)
    };
    if let Err(e) = init_tracing(tracing_config) {
        eprintln!("warning: {}", e);
    }

    match run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn load_config(cli: &Cli) -> ClientResult<ClientConfig> {
    match cli.config {
        Some(ref path) => ClientConfig::load_from(path),
        None => ClientConfig::load(),
    }
    .map_err(ClientError::Config)
}

async fn run(cli: Cli, config: ClientConfig) -> ClientResult<()> {
    let config_path = cli.config.unwrap_or_else(ClientConfig::default_path);

    match cli.command {
        Command::Scan(args) => commands::scan::run(args, &config).await,
        Command::Config { action } => match action {
            ConfigAction::Dump => commands::config::dump(&config, &config_path),
            ConfigAction::Validate => commands::config::validate(&config),
            ConfigAction::Path => commands::config::path(&config_path),
        },
    }
}
