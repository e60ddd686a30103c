//! Scan-and-deliver service.
//!
//! Wraps a [`Scanner`] with the request-level behavior a caller sees: one
//! scan at a time, every new invite handed to a [`CalendarSink`], and a
//! structured [`ScanResponse`] whatever happens inside.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use invitescan_core::{Credential, InviteEvent};
use invitescan_providers::BoxFuture;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::scanner::{Credentials, ScanReport, Scanner, panic_message};

/// Error text for invites that could not be delivered for lack of a
/// calendar credential.
pub const NO_CALENDAR_ACCESS: &str = "No calendar access";

/// Message returned when a scan found nothing new.
pub const NOTHING_FOUND: &str = "No new calendar invites found";

/// Destination for discovered invites.
pub trait CalendarSink: Send + Sync {
    /// Creates one calendar entry. The error is reported back verbatim.
    fn create_event<'a>(
        &'a self,
        credential: &'a Credential,
        invite: &'a InviteEvent,
    ) -> BoxFuture<'a, Result<(), String>>;
}

/// Outcome of delivering one invite.
#[derive(Debug, Clone, Serialize)]
pub struct DeliveryResult {
    pub invite: InviteEvent,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DeliveryResult {
    fn delivered(invite: InviteEvent) -> Self {
        Self {
            invite,
            success: true,
            error: None,
        }
    }

    fn failed(invite: InviteEvent, error: impl Into<String>) -> Self {
        Self {
            invite,
            success: false,
            error: Some(error.into()),
        }
    }
}

/// What a scan request returns.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ScanResponse {
    Completed {
        message: String,
        invites: Vec<DeliveryResult>,
    },
    Error {
        error: String,
    },
}

impl ScanResponse {
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    /// Delivery results, empty for an error response.
    pub fn deliveries(&self) -> &[DeliveryResult] {
        match self {
            Self::Completed { invites, .. } => invites,
            Self::Error { .. } => &[],
        }
    }
}

/// Serializes scans and delivers their results.
pub struct ScanService {
    scanner: Scanner,
    sink: Option<Arc<dyn CalendarSink>>,
    gate: Mutex<()>,
}

impl ScanService {
    pub fn new(scanner: Scanner) -> Self {
        Self {
            scanner,
            sink: None,
            gate: Mutex::new(()),
        }
    }

    /// Builder: set the calendar sink.
    pub fn with_sink(mut self, sink: Arc<dyn CalendarSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn scanner(&self) -> &Scanner {
        &self.scanner
    }

    /// Scans without delivering. Still waits for any running scan.
    ///
    /// A panicking adapter shows up as a failed provider in the report.
    pub async fn scan(&self, credentials: &Credentials) -> ScanReport {
        let _guard = self.gate.lock().await;
        self.scanner.scan_all(credentials).await
    }

    /// Scans every provider and hands each new invite to the sink.
    ///
    /// Overlapping calls run one after another. Adapter panics are contained
    /// by the scanner; any other panic in the pipeline, such as one from the
    /// sink, is caught here and reported as [`ScanResponse::Error`].
    pub async fn scan_and_deliver(
        &self,
        credentials: &Credentials,
        calendar: Option<&Credential>,
    ) -> ScanResponse {
        let _guard = self.gate.lock().await;
        info!("starting calendar invite scan");

        match AssertUnwindSafe(self.run(credentials, calendar))
            .catch_unwind()
            .await
        {
            Ok(response) => response,
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!(error = %message, "scan aborted");
                ScanResponse::Error { error: message }
            }
        }
    }

    async fn run(&self, credentials: &Credentials, calendar: Option<&Credential>) -> ScanResponse {
        let report = self.scanner.scan_all(credentials).await;

        if report.invites.is_empty() {
            info!("{}", NOTHING_FOUND);
            return ScanResponse::Completed {
                message: NOTHING_FOUND.to_string(),
                invites: Vec::new(),
            };
        }

        let count = report.invites.len();
        info!(count, "found calendar invites");

        let mut results = Vec::with_capacity(count);
        for invite in report.invites {
            results.push(self.deliver(invite, calendar).await);
        }

        ScanResponse::Completed {
            message: format!("Processed {} invites", count),
            invites: results,
        }
    }

    /// Delivery failures never un-mark the message; the invite will not be
    /// offered again.
    async fn deliver(&self, invite: InviteEvent, calendar: Option<&Credential>) -> DeliveryResult {
        let (Some(sink), Some(credential)) = (self.sink.as_ref(), calendar) else {
            return DeliveryResult::failed(invite, NO_CALENDAR_ACCESS);
        };

        match sink.create_event(credential, &invite).await {
            Ok(()) => {
                info!(title = invite.title(), "added to calendar");
                DeliveryResult::delivered(invite)
            }
            Err(e) => {
                warn!(title = invite.title(), error = %e, "failed to add invite");
                DeliveryResult::failed(invite, e)
            }
        }
    }
}
