//! Multi-provider scan orchestration.
//!
//! The [`Scanner`] owns one adapter per provider and the shared
//! [`DedupTracker`]. A scan runs every adapter that has a credential
//! concurrently, bounds each by the provider timeout, and concatenates the
//! results in the fixed provider order (Gmail, then Outlook) regardless of
//! which finished first.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use futures_util::future::join_all;
use invitescan_core::{Credential, DedupTracker, InviteEvent, ProviderId};
use invitescan_providers::{ErrorProvider, GmailProvider, MailProvider, OutlookProvider};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::ScanConfig;

/// Bearer credentials for one scan. A missing credential skips that
/// provider.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub gmail: Option<Credential>,
    pub outlook: Option<Credential>,
}

impl Credentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_gmail(mut self, token: impl Into<String>) -> Self {
        self.gmail = Some(Credential::new(token));
        self
    }

    pub fn with_outlook(mut self, token: impl Into<String>) -> Self {
        self.outlook = Some(Credential::new(token));
        self
    }

    pub fn get(&self, id: ProviderId) -> Option<&Credential> {
        match id {
            ProviderId::Gmail => self.gmail.as_ref(),
            ProviderId::Outlook => self.outlook.as_ref(),
        }
    }
}

/// What happened to one provider during a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProviderOutcome {
    /// The provider was scanned and yielded this many new invites.
    Scanned { invites: usize },
    /// No credential was supplied.
    Skipped,
    /// The search failed, the adapter panicked, or the provider timed out.
    Failed { error: String },
}

/// Result of one scan across all providers.
#[derive(Debug, Default, Serialize)]
pub struct ScanReport {
    /// New invites, Gmail's first.
    pub invites: Vec<InviteEvent>,
    /// Per-provider outcome in scan order.
    pub providers: Vec<(ProviderId, ProviderOutcome)>,
}

impl ScanReport {
    pub fn outcome(&self, id: ProviderId) -> Option<&ProviderOutcome> {
        self.providers
            .iter()
            .find(|(provider, _)| *provider == id)
            .map(|(_, outcome)| outcome)
    }

    /// Providers that failed, with their error text.
    pub fn failures(&self) -> impl Iterator<Item = (ProviderId, &str)> {
        self.providers.iter().filter_map(|(id, outcome)| match outcome {
            ProviderOutcome::Failed { error } => Some((*id, error.as_str())),
            _ => None,
        })
    }
}

/// Runs mailbox scans.
pub struct Scanner {
    providers: Vec<Box<dyn MailProvider>>,
    tracker: Arc<DedupTracker>,
    provider_timeout: Duration,
}

impl Scanner {
    /// Creates a scanner with the Gmail and Outlook adapters.
    ///
    /// An adapter that cannot be built is replaced by an [`ErrorProvider`] so
    /// the failure surfaces in every scan report.
    pub fn new(config: &ScanConfig, tracker: Arc<DedupTracker>) -> Self {
        let gmail: Box<dyn MailProvider> =
            match GmailProvider::new(config.adapter_config(ProviderId::Gmail)) {
                Ok(provider) => Box::new(provider),
                Err(e) => Box::new(ErrorProvider::new(ProviderId::Gmail, e)),
            };
        let outlook: Box<dyn MailProvider> =
            match OutlookProvider::new(config.adapter_config(ProviderId::Outlook)) {
                Ok(provider) => Box::new(provider),
                Err(e) => Box::new(ErrorProvider::new(ProviderId::Outlook, e)),
            };

        Self::with_providers(vec![gmail, outlook], tracker, config.provider_timeout)
    }

    /// Creates a scanner over arbitrary adapters, ordered by provider.
    pub fn with_providers(
        mut providers: Vec<Box<dyn MailProvider>>,
        tracker: Arc<DedupTracker>,
        provider_timeout: Duration,
    ) -> Self {
        providers.sort_by_key(|p| p.id());
        Self {
            providers,
            tracker,
            provider_timeout,
        }
    }

    pub fn tracker(&self) -> &Arc<DedupTracker> {
        &self.tracker
    }

    /// Scans every provider that has a credential.
    ///
    /// Never fails: provider errors, panics and timeouts are logged and
    /// recorded in the report, and the other providers' invites are still
    /// returned. The seen set is flushed once after every adapter is done.
    pub async fn scan_all(&self, credentials: &Credentials) -> ScanReport {
        let scans = self.providers.iter().map(|provider| async move {
            let id = provider.id();
            let Some(credential) = credentials.get(id) else {
                info!(provider = %id, "no credential, skipping provider");
                return (id, Ok(None));
            };

            info!(provider = %id, "scanning {}", id.display_name());
            let scan =
                AssertUnwindSafe(provider.try_scan(credential, &self.tracker)).catch_unwind();
            let result = match tokio::time::timeout(self.provider_timeout, scan).await {
                Ok(Ok(Ok(invites))) => Ok(Some(invites)),
                Ok(Ok(Err(e))) => Err(e.to_string()),
                Ok(Err(panic)) => Err(format!("panicked: {}", panic_message(panic.as_ref()))),
                Err(_) => Err(format!(
                    "timed out after {}s",
                    self.provider_timeout.as_secs_f64()
                )),
            };
            (id, result)
        });

        let mut report = ScanReport::default();
        for (id, result) in join_all(scans).await {
            let outcome = match result {
                Ok(Some(invites)) => {
                    let count = invites.len();
                    report.invites.extend(invites);
                    ProviderOutcome::Scanned { invites: count }
                }
                Ok(None) => ProviderOutcome::Skipped,
                Err(error) => {
                    warn!(provider = %id, error = %error, "provider scan failed");
                    ProviderOutcome::Failed { error }
                }
            };
            report.providers.push((id, outcome));
        }

        let tracker = Arc::clone(&self.tracker);
        if let Err(e) = tokio::task::spawn_blocking(move || tracker.flush()).await {
            warn!(error = %e, "seen store flush did not complete");
        }

        info!(
            invites = report.invites.len(),
            tracked = self.tracker.len(),
            "scan complete"
        );
        report
    }
}

/// Text of a panic payload, for reports and logs.
pub(crate) fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "scan failed".to_string()
    }
}
