//! Adapter configuration shared by the mail providers.

use std::time::Duration;

use invitescan_core::{ProviderId, TimestampZone};

use crate::error::{ProviderError, ProviderResult};

/// Base URL for the Gmail REST API v1.
pub const GMAIL_API_BASE: &str = "https://gmail.googleapis.com/gmail/v1";

/// Base URL for Microsoft Graph v1.0.
pub const GRAPH_API_BASE: &str = "https://graph.microsoft.com/v1.0";

/// Default number of messages a search returns.
pub const DEFAULT_MAX_RESULTS: usize = 10;

/// Settings for one provider adapter.
#[derive(Debug, Clone)]
pub struct AdapterConfig {
    /// API root, without a trailing slash.
    pub base_url: String,
    /// Page size of the single search request.
    pub max_results: usize,
    /// Per-request HTTP timeout.
    pub request_timeout: Duration,
    /// How markup timestamps are resolved.
    pub timestamp_zone: TimestampZone,
    pub user_agent: String,
}

impl AdapterConfig {
    /// Defaults for the given provider.
    pub fn for_provider(id: ProviderId) -> Self {
        let base_url = match id {
            ProviderId::Gmail => GMAIL_API_BASE,
            ProviderId::Outlook => GRAPH_API_BASE,
        };
        Self {
            base_url: base_url.to_string(),
            max_results: DEFAULT_MAX_RESULTS,
            request_timeout: Duration::from_secs(15),
            timestamp_zone: TimestampZone::default(),
            user_agent: format!("invitescan/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    pub fn gmail() -> Self {
        Self::for_provider(ProviderId::Gmail)
    }

    pub fn outlook() -> Self {
        Self::for_provider(ProviderId::Outlook)
    }

    /// Points the adapter at a different API root, e.g. a mock server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_timestamp_zone(mut self, zone: TimestampZone) -> Self {
        self.timestamp_zone = zone;
        self
    }

    /// Checks the settings before an HTTP client is built.
    pub fn validate(&self) -> ProviderResult<()> {
        if self.max_results == 0 {
            return Err(ProviderError::configuration("max_results must be at least 1"));
        }
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ProviderError::configuration(format!(
                "base_url must be an http(s) URL: {}",
                self.base_url
            )));
        }
        Ok(())
    }
}
