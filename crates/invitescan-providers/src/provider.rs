//! MailProvider trait definition.
//!
//! A [`MailProvider`] searches one mailbox for messages that look like
//! calendar invites, skips messages the [`DedupTracker`] already knows about,
//! and turns the rest into [`InviteEvent`]s.
//!
//! Implementations report provider-level failures (the search itself failing,
//! a rejected credential) from [`MailProvider::try_scan`]. Failures on a single
//! message are logged and skipped inside the implementation so one bad
//! message never hides the others.

use std::future::Future;
use std::pin::Pin;

use invitescan_core::{Credential, DedupTracker, InviteEvent, ProviderId};
use tracing::warn;

use crate::error::{ProviderError, ProviderResult};

/// A boxed future for async trait methods.
///
/// Boxing keeps the trait object-safe so the scanner can hold a list of
/// `Box<dyn MailProvider>`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A mailbox that can be scanned for calendar invites.
pub trait MailProvider: Send + Sync {
    /// Which provider this is. Also scopes the dedup keys it produces.
    fn id(&self) -> ProviderId;

    /// Scans the mailbox, returning the new invites in message order.
    ///
    /// Every returned invite's message has been marked seen in `tracker`.
    /// Messages that yielded no invite are left unmarked.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError` when the search request fails. Per-message
    /// failures are not errors.
    fn try_scan<'a>(
        &'a self,
        credential: &'a Credential,
        tracker: &'a DedupTracker,
    ) -> BoxFuture<'a, ProviderResult<Vec<InviteEvent>>>;

    /// Like [`try_scan`](Self::try_scan), but a provider-level failure is
    /// logged and yields no invites.
    fn scan<'a>(
        &'a self,
        credential: &'a Credential,
        tracker: &'a DedupTracker,
    ) -> BoxFuture<'a, Vec<InviteEvent>> {
        Box::pin(async move {
            match self.try_scan(credential, tracker).await {
                Ok(invites) => invites,
                Err(e) => {
                    warn!(provider = %self.id(), error = %e, "mailbox scan failed");
                    Vec::new()
                }
            }
        })
    }
}

/// A provider that always fails.
///
/// Stands in for an adapter that could not be constructed, so the failure
/// shows up in the scan report instead of aborting startup.
#[derive(Debug)]
pub struct ErrorProvider {
    id: ProviderId,
    error: ProviderError,
}

impl ErrorProvider {
    pub fn new(id: ProviderId, error: ProviderError) -> Self {
        Self { id, error }
    }
}

impl MailProvider for ErrorProvider {
    fn id(&self) -> ProviderId {
        self.id
    }

    fn try_scan<'a>(
        &'a self,
        _credential: &'a Credential,
        _tracker: &'a DedupTracker,
    ) -> BoxFuture<'a, ProviderResult<Vec<InviteEvent>>> {
        // ProviderError is not Clone; rebuild it from its parts.
        let error = ProviderError::new(self.error.code(), self.error.message())
            .with_provider(self.id.as_str());
        Box::pin(async move { Err(error) })
    }
}
