//! Client configuration.
//!
//! All settings live in a single `config.toml` file at
//! `~/.config/invitescan/config.toml` by default.
//!
//! Provider tokens support secret references:
//! - `pass::path/in/store` resolved via `pass show`
//! - `env::VAR_NAME` resolved from the environment
//! - plain text used as-is

use std::path::{Path, PathBuf};
use std::time::Duration;

use invitescan_core::{ProviderId, TimestampZone};
use invitescan_server::{Credentials, ScanConfig};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ClientConfig (config.toml)
// ---------------------------------------------------------------------------

/// Configuration for the invitescan client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Debug mode.
    pub debug: bool,

    /// Scan settings.
    pub scan: ScanSettings,

    /// Gmail settings.
    pub gmail: Option<ProviderSettings>,

    /// Outlook settings.
    pub outlook: Option<ProviderSettings>,
}

/// Scan settings shared by every provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanSettings {
    /// Messages requested per provider.
    pub max_results: usize,

    /// Upper bound on one provider's scan, in seconds.
    pub provider_timeout_secs: u64,

    /// How calendar markup times are resolved: `local`, `utc` or `marker`.
    pub timestamp_zone: TimestampZone,

    /// File that remembers processed messages between runs.
    pub seen_store: Option<PathBuf>,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            max_results: 10,
            provider_timeout_secs: 30,
            timestamp_zone: TimestampZone::default(),
            seen_store: None,
        }
    }
}

/// Settings for one mail provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderSettings {
    /// Bearer token (supports `pass::` and `env::` prefixes).
    pub token: Option<String>,

    /// API root override.
    pub base_url: Option<String>,
}

impl ClientConfig {
    /// Loads configuration from the default path.
    pub fn load() -> Result<Self, String> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, String> {
        let content =
            std::fs::read_to_string(path).map_err(|e| format!("failed to read config: {}", e))?;
        toml::from_str(&content).map_err(|e| format!("failed to parse config: {}", e))
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }

    /// Returns the default configuration directory.
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("invitescan")
    }

    pub fn provider(&self, id: ProviderId) -> Option<&ProviderSettings> {
        match id {
            ProviderId::Gmail => self.gmail.as_ref(),
            ProviderId::Outlook => self.outlook.as_ref(),
        }
    }

    /// Builds the server-side scan configuration.
    pub fn to_scan_config(&self) -> ScanConfig {
        let mut config = ScanConfig::default()
            .with_max_results(self.scan.max_results)
            .with_provider_timeout(Duration::from_secs(self.scan.provider_timeout_secs))
            .with_timestamp_zone(self.scan.timestamp_zone);

        for id in ProviderId::ALL {
            if let Some(base_url) = self.provider(id).and_then(|p| p.base_url.as_deref()) {
                config = config.with_base_url(id, base_url);
            }
        }
        if let Some(ref path) = self.scan.seen_store {
            config = config.with_seen_store(path);
        }
        config
    }

    /// Resolves provider tokens. An explicit override wins over the file.
    pub fn credentials(
        &self,
        gmail_override: Option<&str>,
        outlook_override: Option<&str>,
    ) -> Result<Credentials, String> {
        let mut credentials = Credentials::new();
        if let Some(token) = self.resolve_token(ProviderId::Gmail, gmail_override)? {
            credentials = credentials.with_gmail(token);
        }
        if let Some(token) = self.resolve_token(ProviderId::Outlook, outlook_override)? {
            credentials = credentials.with_outlook(token);
        }
        Ok(credentials)
    }

    fn resolve_token(
        &self,
        id: ProviderId,
        override_value: Option<&str>,
    ) -> Result<Option<String>, String> {
        let raw = override_value.or_else(|| self.provider(id).and_then(|p| p.token.as_deref()));
        raw.map(|value| {
            crate::secret::resolve(value)
                .map_err(|e| format!("failed to resolve {} token: {}", id, e))
        })
        .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config: ClientConfig = toml::from_str("").unwrap();
        assert!(!config.debug);
        assert_eq!(config.scan.max_results, 10);
        assert_eq!(config.scan.provider_timeout_secs, 30);
        assert_eq!(config.scan.timestamp_zone, TimestampZone::Local);
        assert!(config.gmail.is_none());
    }

    #[test]
    fn full_file() {
        let toml_content = r#"
debug = true

[scan]
max_results = 25
provider_timeout_secs = 10
timestamp_zone = "marker"
seen_store = "/tmp/invitescan/seen.json"

[gmail]
token = "ya29.inline"

[outlook]
token = "env::_IS_UNUSED"
base_url = "http://localhost:9000/v1.0"
"#;
        let config: ClientConfig = toml::from_str(toml_content).unwrap();
        assert!(config.debug);

        let scan = config.to_scan_config();
        assert_eq!(scan.max_results, 25);
        assert_eq!(scan.provider_timeout, Duration::from_secs(10));
        assert_eq!(scan.timestamp_zone, TimestampZone::Marker);
        assert_eq!(scan.outlook_base_url, "http://localhost:9000/v1.0");
        assert_eq!(scan.gmail_base_url, "https://gmail.googleapis.com/gmail/v1");
        assert_eq!(
            scan.seen_store,
            Some(PathBuf::from("/tmp/invitescan/seen.json"))
        );
    }

    #[test]
    fn unknown_zone_is_rejected() {
        let result: Result<ClientConfig, _> = toml::from_str("[scan]\ntimestamp_zone = \"pst\"");
        assert!(result.is_err());
    }

    #[test]
    fn credentials_from_env_reference() {
        unsafe {
            std::env::set_var("_IS_TEST_GMAIL_TOKEN", "gmail-from-env");
        }
        let config: ClientConfig =
            toml::from_str("[gmail]\ntoken = \"env::_IS_TEST_GMAIL_TOKEN\"").unwrap();

        let credentials = config.credentials(None, None).unwrap();
        assert_eq!(
            credentials.get(ProviderId::Gmail).map(|c| c.bearer()),
            Some("gmail-from-env")
        );
        assert!(credentials.get(ProviderId::Outlook).is_none());

        unsafe {
            std::env::remove_var("_IS_TEST_GMAIL_TOKEN");
        }
    }

    #[test]
    fn override_wins_over_file() {
        let config: ClientConfig = toml::from_str("[outlook]\ntoken = \"from-file\"").unwrap();
        let credentials = config.credentials(None, Some("from-flag")).unwrap();
        assert_eq!(
            credentials.get(ProviderId::Outlook).map(|c| c.bearer()),
            Some("from-flag")
        );
    }

    #[test]
    fn unresolvable_token_names_the_provider() {
        let config: ClientConfig =
            toml::from_str("[outlook]\ntoken = \"env::_IS_MISSING_VAR_98765\"").unwrap();
        let err = config.credentials(None, None).unwrap_err();
        assert!(err.contains("outlook"));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[scan]\nmax_results = 3\n").unwrap();

        let config = ClientConfig::load_from(&path).unwrap();
        assert_eq!(config.scan.max_results, 3);

        assert!(ClientConfig::load_from(&dir.path().join("missing.toml")).is_err());
    }

    #[test]
    fn default_path_is_namespaced() {
        assert!(ClientConfig::default_path().ends_with("invitescan/config.toml"));
    }
}
