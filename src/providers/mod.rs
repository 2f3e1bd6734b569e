pub mod base;
pub mod errors;
pub mod gemini;
pub mod openai;

use reqwest::Client;
use std::time::Duration;

/// Connect timeout for provider HTTP clients (seconds).
pub(crate) const PROVIDER_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Build a `reqwest::Client` with the provider's overall request timeout.
pub(crate) fn provider_http_client(timeout_secs: u64) -> Client {
    Client::builder()
        .connect_timeout(Duration::from_secs(PROVIDER_CONNECT_TIMEOUT_SECS))
        .timeout(Duration::from_secs(timeout_secs.max(1)))
        .build()
        .unwrap_or_else(|_| Client::new())
}
