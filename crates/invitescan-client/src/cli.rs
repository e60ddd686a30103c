//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// invitescan - Find calendar invites in your mailboxes
#[derive(Debug, Parser)]
#[command(name = "invitescan")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "INVITESCAN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v')]
    pub debug: bool,

    /// Emit JSON logs, for runs under a scheduler or service manager
    #[arg(long)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Scan the configured mailboxes for new calendar invites
    Scan(ScanArgs),

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Options for `invitescan scan`.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ScanArgs {
    /// Gmail access token (overrides config)
    #[arg(long, env = "INVITESCAN_GMAIL_TOKEN", hide_env_values = true)]
    pub gmail_token: Option<String>,

    /// Outlook (Microsoft Graph) access token (overrides config)
    #[arg(long, env = "INVITESCAN_OUTLOOK_TOKEN", hide_env_values = true)]
    pub outlook_token: Option<String>,

    /// Messages to request per provider
    #[arg(long)]
    pub max_results: Option<usize>,

    /// Output the scan report as JSON
    #[arg(long)]
    pub json: bool,
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Dump current configuration
    Dump,

    /// Validate configuration
    Validate,

    /// Show configuration file path
    Path,
}
