//! Microsoft Graph mail client.

use invitescan_core::Credential;
use serde::Deserialize;
use tracing::debug;

use crate::config::AdapterConfig;
use crate::error::ProviderResult;
use crate::http::{build_client, read_json, send_error};

/// Fields requested for each search hit.
const SELECT_FIELDS: &str = "id,subject,body,receivedDateTime,hasAttachments";

/// Graph client bound to one API root.
#[derive(Debug, Clone)]
pub struct GraphClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl GraphClient {
    pub fn new(config: &AdapterConfig) -> ProviderResult<Self> {
        Ok(Self {
            http_client: build_client(config)?,
            base_url: config.base_url.clone(),
        })
    }

    /// Runs a filtered search. Bodies are requested as plain text.
    pub async fn list_messages(
        &self,
        credential: &Credential,
        filter: &str,
        top: usize,
    ) -> ProviderResult<Vec<GraphMessage>> {
        let url = format!("{}/me/messages", self.base_url);

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(credential.bearer())
            .header("Prefer", "outlook.body-content-type=\"text\"")
            .query(&[
                ("$filter", filter.to_string()),
                ("$top", top.to_string()),
                ("$select", SELECT_FIELDS.to_string()),
            ])
            .send()
            .await
            .map_err(send_error)?;

        let list: CollectionResponse<GraphMessage> = read_json(response, "message list").await?;
        debug!(count = list.value.len(), "listed outlook messages");
        Ok(list.value)
    }

    /// Lists a message's attachments with their content.
    pub async fn list_attachments(
        &self,
        credential: &Credential,
        message_id: &str,
    ) -> ProviderResult<Vec<Attachment>> {
        let url = format!(
            "{}/me/messages/{}/attachments",
            self.base_url,
            urlencoding::encode(message_id)
        );

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(credential.bearer())
            .send()
            .await
            .map_err(send_error)?;

        let list: CollectionResponse<Attachment> = read_json(response, "attachment list").await?;
        Ok(list.value)
    }
}

/// Graph collections wrap their items in `value`.
#[derive(Debug, Deserialize)]
struct CollectionResponse<T> {
    #[serde(default = "Vec::new")]
    value: Vec<T>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphMessage {
    pub id: String,
    pub subject: Option<String>,
    pub body: Option<ItemBody>,
    pub received_date_time: Option<String>,
    #[serde(default)]
    pub has_attachments: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemBody {
    /// `text` or `html`.
    pub content_type: Option<String>,
    #[serde(default)]
    pub content: String,
}

impl ItemBody {
    pub fn is_html(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|t| t.eq_ignore_ascii_case("html"))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub id: Option<String>,
    pub name: Option<String>,
    pub content_type: Option<String>,
    /// Standard base64. Absent for item and reference attachments.
    pub content_bytes: Option<String>,
}
