//! Gmail REST API client.
//!
//! A thin typed wrapper over the three endpoints a scan needs: message
//! search, message detail and attachment download.

use invitescan_core::Credential;
use serde::Deserialize;
use tracing::debug;

use crate::config::AdapterConfig;
use crate::error::ProviderResult;
use crate::http::{build_client, read_json, send_error};

/// Gmail API client bound to one API root.
#[derive(Debug, Clone)]
pub struct GmailClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl GmailClient {
    pub fn new(config: &AdapterConfig) -> ProviderResult<Self> {
        Ok(Self {
            http_client: build_client(config)?,
            base_url: config.base_url.clone(),
        })
    }

    /// Runs a search and returns the matching message ids, newest first.
    pub async fn list_messages(
        &self,
        credential: &Credential,
        query: &str,
        max_results: usize,
    ) -> ProviderResult<Vec<MessageRef>> {
        let url = format!("{}/users/me/messages", self.base_url);

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(credential.bearer())
            .query(&[("q", query.to_string()), ("maxResults", max_results.to_string())])
            .send()
            .await
            .map_err(send_error)?;

        let list: MessageListResponse = read_json(response, "message list").await?;
        debug!(count = list.messages.len(), "listed gmail messages");
        Ok(list.messages)
    }

    /// Fetches a message with its full MIME tree.
    pub async fn get_message(&self, credential: &Credential, id: &str) -> ProviderResult<Message> {
        let url = format!(
            "{}/users/me/messages/{}",
            self.base_url,
            urlencoding::encode(id)
        );

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(credential.bearer())
            .query(&[("format", "full")])
            .send()
            .await
            .map_err(send_error)?;

        read_json(response, "message").await
    }

    /// Downloads an attachment body, still base64 encoded.
    pub async fn get_attachment(
        &self,
        credential: &Credential,
        message_id: &str,
        attachment_id: &str,
    ) -> ProviderResult<String> {
        let url = format!(
            "{}/users/me/messages/{}/attachments/{}",
            self.base_url,
            urlencoding::encode(message_id),
            urlencoding::encode(attachment_id)
        );

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(credential.bearer())
            .send()
            .await
            .map_err(send_error)?;

        let body: PartBody = read_json(response, "attachment").await?;
        Ok(body.data.unwrap_or_default())
    }
}

/// Response from `users.messages.list`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessageListResponse {
    #[serde(default)]
    messages: Vec<MessageRef>,
}

/// A search hit: just the ids.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRef {
    pub id: String,
}

/// A message from `users.messages.get` with `format=full`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub payload: Option<MessagePart>,
}

impl Message {
    /// The `Subject` header, or an empty string.
    pub fn subject(&self) -> &str {
        self.payload
            .as_ref()
            .and_then(|p| p.header("Subject"))
            .unwrap_or_default()
    }
}

/// One node of the MIME tree.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePart {
    pub part_id: Option<String>,
    pub mime_type: Option<String>,
    pub filename: Option<String>,
    #[serde(default)]
    pub headers: Vec<Header>,
    pub body: Option<PartBody>,
    #[serde(default)]
    pub parts: Vec<MessagePart>,
}

impl MessagePart {
    /// Header value by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
    }

    /// Inline base64 data, if any.
    pub fn data(&self) -> Option<&str> {
        self.body
            .as_ref()
            .and_then(|b| b.data.as_deref())
            .filter(|d| !d.is_empty())
    }

    pub fn attachment_id(&self) -> Option<&str> {
        self.body.as_ref().and_then(|b| b.attachment_id.as_deref())
    }

    pub fn is_mime_type(&self, mime_type: &str) -> bool {
        self.mime_type
            .as_deref()
            .is_some_and(|m| m.eq_ignore_ascii_case(mime_type))
    }

    /// Depth-first search of this part and its descendants.
    pub fn find(&self, predicate: &dyn Fn(&MessagePart) -> bool) -> Option<&MessagePart> {
        if predicate(self) {
            return Some(self);
        }
        self.parts.iter().find_map(|part| part.find(predicate))
    }
}

#[derive(Debug, Deserialize)]
pub struct Header {
    pub name: String,
    pub value: String,
}

/// A part body or a downloaded attachment.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartBody {
    pub attachment_id: Option<String>,
    #[serde(default)]
    pub size: u64,
    pub data: Option<String>,
}
