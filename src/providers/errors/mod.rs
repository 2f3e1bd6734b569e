use crate::errors::{RelayError, RelayResult};
use crate::providers::base::ProviderMetrics;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tracing::{error, warn};

/// Common error handling utilities for completion providers.
///
/// Maps HTTP status codes and error bodies onto typed [`RelayError`]s so the
/// relay pipeline can tell rate limits from auth failures from malformed
/// responses without inspecting strings.
pub struct ProviderErrorHandler;

impl ProviderErrorHandler {
    /// Parse an API error body into a typed error.
    ///
    /// Understands both `{"error": {"type", "message"}}` (OpenAI style) and
    /// `{"error": {"status", "message"}}` (Google style).
    pub fn parse_api_error(status: u16, error_text: &str) -> RelayError {
        let retryable = matches!(status, 500 | 502 | 503 | 504);

        if let Ok(error_json) = serde_json::from_str::<Value>(error_text)
            && let Some(err) = error_json.get("error")
        {
            let error_type = err
                .get("type")
                .or_else(|| err.get("status"))
                .and_then(|v| v.as_str())
                .unwrap_or("unknown");
            let error_msg = err
                .get("message")
                .and_then(|v| v.as_str())
                .unwrap_or("Unknown error");

            return RelayError::Provider {
                message: format!("API error ({}): {}", error_type, error_msg),
                retryable,
            };
        }

        RelayError::Provider {
            message: format!("API error ({}): {}", status, error_text),
            retryable,
        }
    }

    /// Log and handle provider errors consistently
    pub fn log_error(e: &RelayError, provider_name: &str, operation: &str) {
        error!(
            "{} provider error during {}: {}",
            provider_name, operation, e
        );
    }

    fn record_error(metrics: &Arc<Mutex<ProviderMetrics>>) {
        if let Ok(mut m) = metrics.lock() {
            m.error_count += 1;
        }
    }

    /// Check HTTP status and return a typed error if the response is not successful.
    /// On error, consumes the response body to extract error details.
    pub async fn check_http_status(
        resp: reqwest::Response,
        provider: &str,
    ) -> RelayResult<reqwest::Response> {
        if resp.status().is_success() {
            return Ok(resp);
        }

        let status = resp.status();
        let retry_after = resp
            .headers()
            .get("retry-after")
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok());

        let error_text = resp
            .text()
            .await
            .unwrap_or_else(|_| "unknown error".to_string());

        let err = match status.as_u16() {
            429 => {
                if let Some(seconds) = retry_after {
                    warn!("{} rate limit hit, retry after {}s", provider, seconds);
                } else {
                    warn!("{} rate limit hit", provider);
                }
                RelayError::RateLimit { retry_after }
            }
            401 | 403 => {
                warn!("{} authentication error (status: {})", provider, status);
                RelayError::Auth(format!(
                    "{} rejected the credentials (status {}). Check the API key.",
                    provider, status
                ))
            }
            code => Self::parse_api_error(code, &error_text),
        };
        Self::log_error(&err, provider, "complete");
        Err(err)
    }

    /// Check an HTTP response for errors (rate limit, auth, generic API errors).
    /// Returns the response body as JSON on success, or a typed error on failure.
    pub async fn check_response(
        resp: reqwest::Response,
        provider: &str,
        metrics: &Arc<Mutex<ProviderMetrics>>,
    ) -> RelayResult<Value> {
        let resp = match Self::check_http_status(resp, provider).await {
            Ok(resp) => resp,
            Err(e) => {
                Self::record_error(metrics);
                return Err(e);
            }
        };

        let json: Value = match resp.json().await {
            Ok(json) => json,
            Err(e) => {
                Self::record_error(metrics);
                let err = RelayError::MalformedResponse(format!(
                    "failed to parse {} response: {}",
                    provider,
                    e.without_url()
                ));
                Self::log_error(&err, provider, "complete");
                return Err(err);
            }
        };

        // Check for API-level errors in the JSON body
        if let Some(error_val) = json.get("error") {
            Self::record_error(metrics);
            let error_text = serde_json::json!({ "error": error_val }).to_string();
            let err = Self::parse_api_error(200, &error_text);
            Self::log_error(&err, provider, "complete");
            return Err(err);
        }

        Ok(json)
    }
}
