//! Gmail provider implementation.

use chrono::Utc;
use invitescan_core::{
    Credential, DedupTracker, InviteEvent, MessageKey, ProviderId, parse_calendar_markup,
    parse_invite_text,
};
use tracing::{debug, info, instrument, warn};

use super::client::{GmailClient, Message, MessagePart};
use crate::config::AdapterConfig;
use crate::decode::{decode_url_safe, html_to_text, is_calendar_attachment};
use crate::error::{ProviderError, ProviderResult};
use crate::provider::{BoxFuture, MailProvider};

/// Search that selects likely invites: calendar attachments, meeting-ish
/// subjects, or bodies with `when:`/`where:` labels.
pub const SEARCH_QUERY: &str = "has:attachment filename:ics OR subject:meeting OR subject:invite OR subject:calendar OR \"when:\" OR \"where:\"";

/// Scans a Gmail mailbox for calendar invites.
#[derive(Debug)]
pub struct GmailProvider {
    client: GmailClient,
    config: AdapterConfig,
}

impl GmailProvider {
    pub fn new(config: AdapterConfig) -> ProviderResult<Self> {
        let client = GmailClient::new(&config).map_err(|e| e.with_provider("gmail"))?;
        Ok(Self { client, config })
    }

    #[instrument(skip(self, credential, tracker), fields(provider = "gmail"))]
    async fn scan_mailbox(
        &self,
        credential: &Credential,
        tracker: &DedupTracker,
    ) -> ProviderResult<Vec<InviteEvent>> {
        let refs = self
            .client
            .list_messages(credential, SEARCH_QUERY, self.config.max_results)
            .await
            .map_err(|e| e.with_provider("gmail"))?;

        let mut invites = Vec::new();
        for message_ref in refs {
            let key = MessageKey::new(ProviderId::Gmail, &message_ref.id);
            if tracker.has(&key) {
                debug!(message_id = %message_ref.id, "already processed, skipping");
                continue;
            }

            match self.invite_from_message(credential, &message_ref.id).await {
                Ok(Some(invite)) => {
                    tracker.mark_seen(key);
                    invites.push(invite);
                }
                Ok(None) => debug!(message_id = %message_ref.id, "no invite in message"),
                Err(e) => {
                    warn!(message_id = %message_ref.id, error = %e, "failed to process message")
                }
            }
        }

        info!(count = invites.len(), "gmail scan complete");
        Ok(invites)
    }

    /// Fetches one message and runs it through the matching parser.
    ///
    /// A calendar attachment, when present, decides the outcome; the body is
    /// only read for messages without one.
    async fn invite_from_message(
        &self,
        credential: &Credential,
        id: &str,
    ) -> ProviderResult<Option<InviteEvent>> {
        let message = self.client.get_message(credential, id).await?;
        let subject = message.subject();
        let Some(payload) = message.payload.as_ref() else {
            return Err(ProviderError::invalid_response("message has no payload"));
        };

        let calendar_part = payload
            .find(&|p| is_calendar_attachment(p.filename.as_deref(), p.mime_type.as_deref()));

        if let Some(part) = calendar_part {
            let markup = self.read_part(credential, id, part).await?;
            return Ok(parse_calendar_markup(
                &markup,
                subject,
                self.config.timestamp_zone,
            ));
        }

        let body = extract_body(&message)?;
        Ok(parse_invite_text(
            &body,
            subject,
            Utc::now(),
            self.config.timestamp_zone,
        ))
    }

    /// Returns the decoded content of a part, downloading it if the data is
    /// not inline.
    async fn read_part(
        &self,
        credential: &Credential,
        message_id: &str,
        part: &MessagePart,
    ) -> ProviderResult<String> {
        if let Some(data) = part.data() {
            return decode_url_safe(data);
        }
        let Some(attachment_id) = part.attachment_id() else {
            return Err(ProviderError::decode("calendar part has no data"));
        };
        let data = self
            .client
            .get_attachment(credential, message_id, attachment_id)
            .await?;
        decode_url_safe(&data)
    }
}

/// Picks the text the free-text parser reads: top-level body data, else the
/// first `text/plain` part, else the first `text/html` part reduced to text.
fn extract_body(message: &Message) -> ProviderResult<String> {
    let Some(payload) = message.payload.as_ref() else {
        return Ok(String::new());
    };

    if let Some(data) = payload.data() {
        let text = decode_url_safe(data)?;
        return Ok(if payload.is_mime_type("text/html") {
            html_to_text(&text)
        } else {
            text
        });
    }

    if let Some(data) = payload
        .find(&|p| p.is_mime_type("text/plain") && p.data().is_some())
        .and_then(MessagePart::data)
    {
        return decode_url_safe(data);
    }

    if let Some(data) = payload
        .find(&|p| p.is_mime_type("text/html") && p.data().is_some())
        .and_then(MessagePart::data)
    {
        return Ok(html_to_text(&decode_url_safe(data)?));
    }

    Ok(String::new())
}

impl MailProvider for GmailProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Gmail
    }

    fn try_scan<'a>(
        &'a self,
        credential: &'a Credential,
        tracker: &'a DedupTracker,
    ) -> BoxFuture<'a, ProviderResult<Vec<InviteEvent>>> {
        Box::pin(self.scan_mailbox(credential, tracker))
    }
}
