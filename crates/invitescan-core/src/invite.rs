//! The normalized invite record produced by both parsers.
//!
//! An [`InviteEvent`] can only be built through [`InviteEvent::new`], which
//! rejects blank titles, so anything handed to a calendar sink has at least a
//! title and a resolved start time.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// Provenance tag for invites extracted from mail.
pub const EMAIL_SOURCE: &str = "email";

/// Duration assumed when an invite carries no end time.
pub const DEFAULT_DURATION_MINUTES: i64 = 60;

/// A calendar invite extracted from a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteEvent {
    title: String,
    start_time: DateTime<Utc>,
    end_time: Option<DateTime<Utc>>,
    location: String,
    description: Option<String>,
    source: String,
}

impl InviteEvent {
    /// Creates an invite, or `None` when the title is blank.
    pub fn new(title: impl Into<String>, start_time: DateTime<Utc>) -> Option<Self> {
        let title = title.into();
        if title.trim().is_empty() {
            return None;
        }

        Some(Self {
            title,
            start_time,
            end_time: None,
            location: String::new(),
            description: None,
            source: EMAIL_SOURCE.to_string(),
        })
    }

    /// Builder method to set the end time.
    pub fn with_end_time(mut self, end: DateTime<Utc>) -> Self {
        self.end_time = Some(end);
        self
    }

    /// Builder method to set the location.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    /// Builder method to set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Builder method to set the provenance tag.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.end_time
    }

    /// Returns the end time, defaulting to one hour after the start.
    pub fn effective_end(&self) -> DateTime<Utc> {
        self.end_time
            .unwrap_or(self.start_time + Duration::minutes(DEFAULT_DURATION_MINUTES))
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}
