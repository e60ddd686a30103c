//! Configuration commands.

use std::path::Path;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Dump the current configuration to stdout. Inline tokens are masked.
pub fn dump(config: &ClientConfig, path: &Path) -> ClientResult<()> {
    let toml_str = toml::to_string_pretty(&masked(config))
        .map_err(|e| ClientError::Config(format!("failed to serialize config: {}", e)))?;
    println!("# config.toml ({})", path.display());
    println!("{}", toml_str);

    Ok(())
}

/// Validate the configuration, including that every token resolves.
pub fn validate(config: &ClientConfig) -> ClientResult<()> {
    config.to_scan_config().validate()?;

    let credentials = config
        .credentials(None, None)
        .map_err(ClientError::Config)?;
    for id in invitescan_core::ProviderId::ALL {
        if credentials.get(id).is_some() {
            println!("{} token resolves.", id);
        }
    }

    println!("Configuration is valid.");
    Ok(())
}

/// Show the configuration file path.
pub fn path(path: &Path) -> ClientResult<()> {
    println!("config: {}", path.display());
    Ok(())
}

fn masked(config: &ClientConfig) -> ClientConfig {
    let mut config = config.clone();
    for settings in [config.gmail.as_mut(), config.outlook.as_mut()]
        .into_iter()
        .flatten()
    {
        if let Some(ref token) = settings.token
            && !token.starts_with("pass::")
            && !token.starts_with("env::")
        {
            settings.token = Some("<redacted>".to_string());
        }
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_inline_tokens_only() {
        let config: ClientConfig = toml::from_str(
            "[gmail]\ntoken = \"ya29.secret\"\n\n[outlook]\ntoken = \"pass::mail/graph\"\n",
        )
        .unwrap();

        let dumped = toml::to_string_pretty(&masked(&config)).unwrap();
        assert!(!dumped.contains("ya29.secret"));
        assert!(dumped.contains("<redacted>"));
        assert!(dumped.contains("pass::mail/graph"));
    }

    #[test]
    fn validate_rejects_zero_timeout() {
        let config: ClientConfig = toml::from_str("[scan]\nprovider_timeout_secs = 0\n").unwrap();
        assert!(matches!(validate(&config), Err(ClientError::Config(_))));
    }

    #[test]
    fn validate_rejects_bad_base_url() {
        let config: ClientConfig =
            toml::from_str("[gmail]\nbase_url = \"ftp://example.com\"\n").unwrap();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn validate_accepts_defaults() {
        assert!(validate(&ClientConfig::default()).is_ok());
    }
}
