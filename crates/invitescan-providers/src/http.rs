//! Shared HTTP plumbing for the REST adapters.
//!
//! Status handling is the same for both mail APIs, so it lives here instead
//! of being repeated in every request method.

use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;

use crate::config::AdapterConfig;
use crate::error::{ProviderError, ProviderResult};

/// Builds the HTTP client for an adapter.
pub(crate) fn build_client(config: &AdapterConfig) -> ProviderResult<reqwest::Client> {
    config.validate()?;
    reqwest::Client::builder()
        .timeout(config.request_timeout)
        .user_agent(config.user_agent.clone())
        .build()
        .map_err(|e| {
            ProviderError::configuration(format!("failed to create HTTP client: {}", e))
                .with_source(e)
        })
}

/// Maps a transport failure to a network error.
pub(crate) fn send_error(e: reqwest::Error) -> ProviderError {
    let message = if e.is_timeout() {
        "request timeout".to_string()
    } else if e.is_connect() {
        format!("connection failed: {}", e)
    } else {
        format!("request failed: {}", e)
    };
    ProviderError::network(message).with_source(e)
}

/// Checks the status and decodes a JSON body.
///
/// `what` names the resource for error messages ("message", "attachment").
pub(crate) async fn read_json<T: DeserializeOwned>(
    response: Response,
    what: &str,
) -> ProviderResult<T> {
    let response = check_status(response, what).await?;

    let body = response
        .text()
        .await
        .map_err(|e| ProviderError::network(format!("failed to read response: {}", e)))?;

    serde_json::from_str(&body).map_err(|e| {
        ProviderError::invalid_response(format!("failed to parse {} response: {}", what, e))
    })
}

async fn check_status(response: Response, what: &str) -> ProviderResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    match status {
        StatusCode::UNAUTHORIZED => Err(ProviderError::authentication(
            "access token expired or invalid",
        )),
        StatusCode::FORBIDDEN => Err(ProviderError::authorization(format!(
            "access denied to {}",
            what
        ))),
        StatusCode::NOT_FOUND => Err(ProviderError::not_found(format!("{} not found", what))),
        StatusCode::TOO_MANY_REQUESTS => {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok());
            Err(ProviderError::rate_limited(format!(
                "rate limit exceeded{}",
                retry_after
                    .map(|s| format!(", retry after {} seconds", s))
                    .unwrap_or_default()
            )))
        }
        _ if status.is_client_error() => {
            let body = response.text().await.unwrap_or_default();
            Err(ProviderError::bad_request(format!(
                "API error ({}): {}",
                status, body
            )))
        }
        _ => {
            let body = response.text().await.unwrap_or_default();
            Err(ProviderError::server(format!(
                "API error ({}): {}",
                status, body
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderErrorCode;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Debug, serde::Deserialize)]
    struct Health {
        ok: bool,
    }

    async fn fetch(server: &MockServer) -> ProviderResult<Health> {
        let client = build_client(&AdapterConfig::gmail().with_base_url(server.uri())).unwrap();
        let response = client
            .get(format!("{}/health", server.uri()))
            .send()
            .await
            .map_err(send_error)?;
        read_json(response, "health").await
    }

    async fn respond_with(template: ResponseTemplate) -> ProviderResult<Health> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(template)
            .mount(&server)
            .await;
        fetch(&server).await
    }

    #[tokio::test]
    async fn decodes_success_body() {
        let health = respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "ok": true })),
        )
        .await
        .unwrap();
        assert!(health.ok);
    }

    #[tokio::test]
    async fn maps_status_codes() {
        let cases = [
            (401, ProviderErrorCode::AuthenticationFailed),
            (403, ProviderErrorCode::AuthorizationFailed),
            (404, ProviderErrorCode::NotFound),
            (400, ProviderErrorCode::BadRequest),
            (503, ProviderErrorCode::ServerError),
        ];
        for (status, code) in cases {
            let err = respond_with(ResponseTemplate::new(status)).await.unwrap_err();
            assert_eq!(err.code(), code, "status {}", status);
        }
    }

    #[tokio::test]
    async fn rate_limit_reports_retry_after() {
        let err = respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "30"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::RateLimited);
        assert!(err.message().contains("retry after 30 seconds"));
    }

    #[tokio::test]
    async fn malformed_body_is_invalid_response() {
        let err = respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::InvalidResponse);
    }

    #[test]
    fn bad_config_fails_client_build() {
        let err = build_client(&AdapterConfig::gmail().with_max_results(0)).unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::ConfigurationError);
    }
}
