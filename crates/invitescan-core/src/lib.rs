//! Core types: invites, message keys, parsers, dedup tracking
//!
//! Everything in this crate is provider-agnostic. Mail adapters live in
//! `invitescan-providers` and feed message content into the two parsers
//! exported here.

pub mod credential;
pub mod dedup;
pub mod ics;
pub mod invite;
pub mod key;
pub mod text;
pub mod timestamp;
pub mod tracing;

pub use credential::Credential;
pub use dedup::{DedupTracker, MemoryStore, SeenStore};
pub use ics::parse_calendar_markup;
pub use invite::{DEFAULT_DURATION_MINUTES, EMAIL_SOURCE, InviteEvent};
pub use key::{MessageKey, ParseKeyError, ProviderId};
pub use text::parse_invite_text;
pub use timestamp::{TimestampZone, parse_compact_timestamp};
pub use tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
