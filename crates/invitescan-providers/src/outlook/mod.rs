//! Outlook provider, backed by Microsoft Graph v1.0.
//!
//! A single filtered `me/messages` query returns subject and body for each
//! candidate, so only messages with attachments need a second request.
//! Attachment content is standard base64.

mod client;
mod provider;

pub use client::{Attachment, GraphClient, GraphMessage, ItemBody};
pub use provider::{OutlookProvider, SEARCH_FILTER};
