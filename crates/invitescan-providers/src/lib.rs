//! Mail provider adapters.
//!
//! - [`MailProvider`] - the trait every mailbox adapter implements
//! - [`GmailProvider`] / [`OutlookProvider`] - REST adapters for the two
//!   supported services
//! - [`ProviderError`] - error types for provider operations
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐    ┌─────────────────┐
//! │  Gmail API v1   │    │  Graph v1.0     │
//! └────────┬────────┘    └────────┬────────┘
//!          │                      │
//!          ▼                      ▼
//! ┌─────────────────┐    ┌─────────────────┐
//! │  GmailProvider  │    │ OutlookProvider │
//! └────────┬────────┘    └────────┬────────┘
//!          │     MailProvider     │
//!          └──────────┬───────────┘
//!                     │ markup or body text
//!                     ▼
//!     parse_calendar_markup / parse_invite_text
//!                     │
//!                     ▼
//!              ┌─────────────┐
//!              │ InviteEvent │
//!              └─────────────┘
//! ```

pub mod config;
pub mod decode;
pub mod error;
#[cfg(feature = "gmail")]
pub mod gmail;
mod http;
#[cfg(feature = "outlook")]
pub mod outlook;
pub mod provider;

pub use config::AdapterConfig;
pub use error::{ProviderError, ProviderErrorCode, ProviderResult};
#[cfg(feature = "gmail")]
pub use gmail::GmailProvider;
#[cfg(feature = "outlook")]
pub use outlook::OutlookProvider;
pub use provider::{BoxFuture, ErrorProvider, MailProvider};
