//! Gmail provider.
//!
//! Talks to the Gmail REST API v1 with a caller-supplied bearer token:
//!
//! 1. `users/me/messages?q=...` selects candidate messages.
//! 2. `users/me/messages/{id}?format=full` fetches each unseen one.
//! 3. Calendar attachments not carried inline are downloaded from
//!    `users/me/messages/{id}/attachments/{attachmentId}`.
//!
//! Message data is URL-safe base64.

mod client;
mod provider;

pub use client::{GmailClient, Message, MessagePart, MessageRef};
pub use provider::{GmailProvider, SEARCH_QUERY};
