//! The `scan` command.

use std::fmt::Write as _;

use invitescan_server::{ProviderOutcome, ScanReport, ScanService, Scanner, tracker_for};
use tracing::{debug, info};

use crate::cli::ScanArgs;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Scans every mailbox that has a token and prints what was found.
pub async fn run(args: ScanArgs, config: &ClientConfig) -> ClientResult<()> {
    let credentials = config
        .credentials(args.gmail_token.as_deref(), args.outlook_token.as_deref())
        .map_err(ClientError::Config)?;
    if credentials.gmail.is_none() && credentials.outlook.is_none() {
        return Err(ClientError::AuthRequired(
            "no Gmail or Outlook token configured; pass --gmail-token/--outlook-token or set them in config.toml"
                .to_string(),
        ));
    }

    let mut scan_config = config.to_scan_config();
    if let Some(max) = args.max_results {
        scan_config = scan_config.with_max_results(max);
    }
    scan_config.validate()?;
    debug!(?scan_config, "scan configuration");

    let tracker = tracker_for(&scan_config)?;
    let service = ScanService::new(Scanner::new(&scan_config, tracker));
    let report = service.scan(&credentials).await;
    info!(invites = report.invites.len(), "scan finished");

    let output = if args.json {
        render_json(&report)?
    } else {
        render_text(&report)
    };
    print!("{}", output);

    if every_provider_failed(&report) {
        return Err(ClientError::Scan("no mailbox could be scanned".to_string()));
    }
    Ok(())
}

/// True when at least one provider was attempted and none succeeded.
pub fn every_provider_failed(report: &ScanReport) -> bool {
    let attempted = report
        .providers
        .iter()
        .filter(|(_, outcome)| !matches!(outcome, ProviderOutcome::Skipped))
        .count();
    attempted > 0 && report.failures().count() == attempted
}

pub fn render_json(report: &ScanReport) -> ClientResult<String> {
    let mut json = serde_json::to_string_pretty(report)
        .map_err(|e| ClientError::Output(format!("failed to serialize report: {}", e)))?;
    json.push('\n');
    Ok(json)
}

/// Human-readable report: one block per invite, then a line per provider.
pub fn render_text(report: &ScanReport) -> String {
    let mut out = String::new();

    if report.invites.is_empty() {
        out.push_str(invitescan_server::NOTHING_FOUND);
        out.push('\n');
    }

    for invite in &report.invites {
        let _ = writeln!(out, "{}", invite.title());
        let _ = writeln!(
            out,
            "  when:  {} - {}",
            invite.start_time().format("%Y-%m-%d %H:%M UTC"),
            invite.effective_end().format("%H:%M")
        );
        if !invite.location().is_empty() {
            let _ = writeln!(out, "  where: {}", invite.location());
        }
    }

    out.push('\n');
    for (id, outcome) in &report.providers {
        let status = match outcome {
            ProviderOutcome::Scanned { invites } => format!("{} new", invites),
            ProviderOutcome::Skipped => "skipped (no token)".to_string(),
            ProviderOutcome::Failed { error } => format!("failed: {}", error),
        };
        let _ = writeln!(out, "{:<8} {}", id.as_str(), status);
    }
    out
}
