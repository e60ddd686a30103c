//! Outlook provider implementation.

use chrono::Utc;
use invitescan_core::{
    Credential, DedupTracker, InviteEvent, MessageKey, ProviderId, parse_calendar_markup,
    parse_invite_text,
};
use tracing::{debug, info, instrument, warn};

use super::client::{GraphClient, GraphMessage};
use crate::config::AdapterConfig;
use crate::decode::{decode_standard, html_to_text, is_calendar_attachment};
use crate::error::{ProviderError, ProviderResult};
use crate::provider::{BoxFuture, MailProvider};

/// OData filter selecting likely invites.
pub const SEARCH_FILTER: &str = "hasAttachments eq true or contains(subject,'meeting') or contains(subject,'invite') or contains(subject,'calendar')";

/// Scans an Outlook mailbox through Microsoft Graph.
#[derive(Debug)]
pub struct OutlookProvider {
    client: GraphClient,
    config: AdapterConfig,
}

impl OutlookProvider {
    pub fn new(config: AdapterConfig) -> ProviderResult<Self> {
        let client = GraphClient::new(&config).map_err(|e| e.with_provider("outlook"))?;
        Ok(Self { client, config })
    }

    #[instrument(skip(self, credential, tracker), fields(provider = "outlook"))]
    async fn scan_mailbox(
        &self,
        credential: &Credential,
        tracker: &DedupTracker,
    ) -> ProviderResult<Vec<InviteEvent>> {
        let messages = self
            .client
            .list_messages(credential, SEARCH_FILTER, self.config.max_results)
            .await
            .map_err(|e| e.with_provider("outlook"))?;

        let mut invites = Vec::new();
        for message in messages {
            let key = MessageKey::new(ProviderId::Outlook, &message.id);
            if tracker.has(&key) {
                debug!(message_id = %message.id, "already processed, skipping");
                continue;
            }

            match self.invite_from_message(credential, &message).await {
                Ok(Some(invite)) => {
                    debug!(
                        message_id = %message.id,
                        received = message.received_date_time.as_deref().unwrap_or_default(),
                        "found invite"
                    );
                    tracker.mark_seen(key);
                    invites.push(invite);
                }
                Ok(None) => debug!(message_id = %message.id, "no invite in message"),
                Err(e) => warn!(message_id = %message.id, error = %e, "failed to process message"),
            }
        }

        info!(count = invites.len(), "outlook scan complete");
        Ok(invites)
    }

    /// The search already carries subject and body; attachments are only
    /// listed for messages that have some.
    async fn invite_from_message(
        &self,
        credential: &Credential,
        message: &GraphMessage,
    ) -> ProviderResult<Option<InviteEvent>> {
        let subject = message.subject.as_deref().unwrap_or_default();

        if message.has_attachments {
            let attachments = self.client.list_attachments(credential, &message.id).await?;
            let calendar = attachments.iter().find(|a| {
                is_calendar_attachment(a.name.as_deref(), a.content_type.as_deref())
            });
            if let Some(attachment) = calendar {
                let Some(content) = attachment.content_bytes.as_deref() else {
                    return Err(ProviderError::decode("calendar attachment has no content"));
                };
                let markup = decode_standard(content)?;
                return Ok(parse_calendar_markup(
                    &markup,
                    subject,
                    self.config.timestamp_zone,
                ));
            }
        }

        let body = match message.body.as_ref() {
            Some(body) if body.is_html() => html_to_text(&body.content),
            Some(body) => body.content.clone(),
            None => String::new(),
        };
        Ok(parse_invite_text(
            &body,
            subject,
            Utc::now(),
            self.config.timestamp_zone,
        ))
    }
}

impl MailProvider for OutlookProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Outlook
    }

    fn try_scan<'a>(
        &'a self,
        credential: &'a Credential,
        tracker: &'a DedupTracker,
    ) -> BoxFuture<'a, ProviderResult<Vec<InviteEvent>>> {
        Box::pin(self.scan_mailbox(credential, tracker))
    }
}
