//! Scan configuration.

use std::path::PathBuf;
use std::time::Duration;

use invitescan_core::{ProviderId, TimestampZone};
use invitescan_providers::AdapterConfig;
use invitescan_providers::config::{DEFAULT_MAX_RESULTS, GMAIL_API_BASE, GRAPH_API_BASE};

use crate::error::{ServerError, ServerResult};

/// Scan configuration.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Messages requested per provider search.
    pub max_results: usize,

    /// Upper bound on one provider's whole scan.
    pub provider_timeout: Duration,

    /// How markup timestamps are resolved.
    pub timestamp_zone: TimestampZone,

    pub gmail_base_url: String,

    pub outlook_base_url: String,

    /// Where seen message keys are persisted. In memory only when unset.
    pub seen_store: Option<PathBuf>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_results: DEFAULT_MAX_RESULTS,
            provider_timeout: Duration::from_secs(30),
            timestamp_zone: TimestampZone::default(),
            gmail_base_url: GMAIL_API_BASE.to_string(),
            outlook_base_url: GRAPH_API_BASE.to_string(),
            seen_store: None,
        }
    }
}

impl ScanConfig {
    /// Builder: set max results.
    pub fn with_max_results(mut self, max: usize) -> Self {
        self.max_results = max;
        self
    }

    /// Builder: set provider timeout.
    pub fn with_provider_timeout(mut self, timeout: Duration) -> Self {
        self.provider_timeout = timeout;
        self
    }

    /// Builder: set timestamp zone.
    pub fn with_timestamp_zone(mut self, zone: TimestampZone) -> Self {
        self.timestamp_zone = zone;
        self
    }

    /// Builder: set a provider's API root.
    pub fn with_base_url(mut self, id: ProviderId, base_url: impl Into<String>) -> Self {
        match id {
            ProviderId::Gmail => self.gmail_base_url = base_url.into(),
            ProviderId::Outlook => self.outlook_base_url = base_url.into(),
        }
        self
    }

    /// Builder: persist seen keys to a file.
    pub fn with_seen_store(mut self, path: impl Into<PathBuf>) -> Self {
        self.seen_store = Some(path.into());
        self
    }

    /// Adapter settings for one provider.
    pub fn adapter_config(&self, id: ProviderId) -> AdapterConfig {
        let base_url = match id {
            ProviderId::Gmail => &self.gmail_base_url,
            ProviderId::Outlook => &self.outlook_base_url,
        };
        AdapterConfig::for_provider(id)
            .with_base_url(base_url.as_str())
            .with_max_results(self.max_results)
            .with_timestamp_zone(self.timestamp_zone)
            .with_request_timeout(self.provider_timeout)
    }

    pub fn validate(&self) -> ServerResult<()> {
        if self.max_results == 0 {
            return Err(ServerError::config("max_results must be at least 1"));
        }
        if self.provider_timeout.is_zero() {
            return Err(ServerError::config("provider timeout must be positive"));
        }
        for id in ProviderId::ALL {
            self.adapter_config(id)
                .validate()
                .map_err(|e| ServerError::config(format!("{}: {}", id, e.message())))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ScanConfig::default();
        assert_eq!(config.max_results, 10);
        assert_eq!(config.provider_timeout, Duration::from_secs(30));
        assert_eq!(config.timestamp_zone, TimestampZone::Local);
        assert!(config.seen_store.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn custom_config() {
        let config = ScanConfig::default()
            .with_max_results(25)
            .with_provider_timeout(Duration::from_secs(5))
            .with_timestamp_zone(TimestampZone::Marker)
            .with_base_url(ProviderId::Outlook, "http://localhost:9000/v1.0/")
            .with_seen_store("/var/lib/invitescan/seen.json");

        let outlook = config.adapter_config(ProviderId::Outlook);
        assert_eq!(outlook.base_url, "http://localhost:9000/v1.0");
        assert_eq!(outlook.max_results, 25);
        assert_eq!(outlook.timestamp_zone, TimestampZone::Marker);

        let gmail = config.adapter_config(ProviderId::Gmail);
        assert_eq!(gmail.base_url, GMAIL_API_BASE);
        assert_eq!(
            config.seen_store,
            Some(PathBuf::from("/var/lib/invitescan/seen.json"))
        );
    }

    #[test]
    fn validate_reports_bad_values() {
        assert!(ScanConfig::default().with_max_results(0).validate().is_err());
        assert!(
            ScanConfig::default()
                .with_provider_timeout(Duration::ZERO)
                .validate()
                .is_err()
        );

        let err = ScanConfig::default()
            .with_base_url(ProviderId::Gmail, "ftp://mail")
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("gmail"));
    }
}
