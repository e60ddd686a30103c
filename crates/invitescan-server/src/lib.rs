//! Scan orchestration and delivery.
//!
//! This crate ties the provider adapters together:
//! - [`Scanner`] runs every configured mailbox concurrently and merges
//!   the results in a fixed provider order
//! - [`ScanService`] serializes scans and hands new invites to a
//!   [`CalendarSink`]
//! - [`JsonFileStore`] persists seen message keys between runs
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use invitescan_core::DedupTracker;
//! use invitescan_server::{Credentials, ScanConfig, ScanService, Scanner};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ScanConfig::default();
//!     let scanner = Scanner::new(&config, Arc::new(DedupTracker::new()));
//!     let service = ScanService::new(scanner);
//!
//!     let credentials = Credentials::new().with_gmail("ya29.token");
//!     let response = service.scan_and_deliver(&credentials, None).await;
//!     println!("{}", serde_json::to_string_pretty(&response).unwrap());
//! }
//! ```

mod config;
mod error;
mod scanner;
mod seen_store;
mod service;

pub use config::ScanConfig;
pub use error::{ServerError, ServerResult};
pub use scanner::{Credentials, ProviderOutcome, ScanReport, Scanner};
pub use seen_store::JsonFileStore;
pub use service::{
    CalendarSink, DeliveryResult, NO_CALENDAR_ACCESS, NOTHING_FOUND, ScanResponse, ScanService,
};

use std::sync::Arc;

use invitescan_core::DedupTracker;

/// Builds the dedup tracker for a config: file-backed when a seen store
/// path is set, in memory otherwise.
pub fn tracker_for(config: &ScanConfig) -> ServerResult<Arc<DedupTracker>> {
    let tracker = match config.seen_store {
        Some(ref path) => DedupTracker::with_store(JsonFileStore::open(path)?),
        None => DedupTracker::new(),
    };
    Ok(Arc::new(tracker))
}
