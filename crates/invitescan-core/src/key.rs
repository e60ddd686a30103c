//! Provider identifiers and the composite message key used for dedup.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A supported mail provider.
///
/// The derived ordering is the fixed scan order: Gmail before Outlook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderId {
    Gmail,
    Outlook,
}

impl ProviderId {
    /// All providers in scan order.
    pub const ALL: [ProviderId; 2] = [ProviderId::Gmail, ProviderId::Outlook];

    /// Returns the tag used in message keys and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gmail => "gmail",
            Self::Outlook => "outlook",
        }
    }

    /// Returns a human-readable name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Gmail => "Gmail",
            Self::Outlook => "Outlook",
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a provider tag or message key cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseKeyError {
    #[error("unknown provider: {0}")]
    UnknownProvider(String),
    #[error("malformed message key: {0}")]
    Malformed(String),
}

impl FromStr for ProviderId {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gmail" => Ok(Self::Gmail),
            "outlook" => Ok(Self::Outlook),
            other => Err(ParseKeyError::UnknownProvider(other.to_string())),
        }
    }
}

/// Identifies one message within one provider.
///
/// Encoded as `<provider>-<message id>`, e.g. `gmail-18c2f0a9d1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MessageKey {
    provider: ProviderId,
    message_id: String,
}

impl MessageKey {
    pub fn new(provider: ProviderId, message_id: impl Into<String>) -> Self {
        Self {
            provider,
            message_id: message_id.into(),
        }
    }

    pub fn provider(&self) -> ProviderId {
        self.provider
    }

    pub fn message_id(&self) -> &str {
        &self.message_id
    }
}

impl fmt::Display for MessageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.provider, self.message_id)
    }
}

impl FromStr for MessageKey {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Provider tags never contain '-', message ids may.
        let (provider, id) = s
            .split_once('-')
            .ok_or_else(|| ParseKeyError::Malformed(s.to_string()))?;
        if id.is_empty() {
            return Err(ParseKeyError::Malformed(s.to_string()));
        }
        Ok(Self::new(provider.parse()?, id))
    }
}
