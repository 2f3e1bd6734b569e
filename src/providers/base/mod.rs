use crate::errors::{RelayError, RelayResult};
use async_trait::async_trait;
use tracing::{debug, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".into(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".into(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompletionResponse {
    pub content: Option<String>,
    /// Input token count reported by the provider (if available).
    pub input_tokens: Option<u64>,
    /// Output token count reported by the provider (if available).
    pub output_tokens: Option<u64>,
}

impl CompletionResponse {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            input_tokens: None,
            output_tokens: None,
        }
    }
}

/// Parameters for a completion request.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub messages: Vec<Message>,
    pub model: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Metrics for provider operations
#[derive(Debug, Clone, Default)]
pub struct ProviderMetrics {
    pub request_count: u64,
    pub token_count: u64,
    pub error_count: u64,
}

/// Configuration for retry behavior
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: usize,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 0,
            initial_delay_ms: 1000,
            max_delay_ms: 10000,
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    pub fn with_retries(max_retries: usize) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }
}

#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, req: CompletionRequest) -> RelayResult<CompletionResponse>;

    /// Human-readable provider name, used in logs and the health document.
    fn name(&self) -> &str;

    fn default_model(&self) -> &str;

    /// Return accumulated provider metrics (requests, tokens, errors).
    /// Default returns zeroed metrics for providers that don't track them.
    fn metrics(&self) -> ProviderMetrics {
        ProviderMetrics::default()
    }

    /// Complete with retry on transient errors. `max_retries == 0` makes
    /// exactly one attempt.
    async fn complete_with_retry(
        &self,
        req: CompletionRequest,
        retry_config: &RetryConfig,
    ) -> RelayResult<CompletionResponse> {
        let mut attempt = 0;
        loop {
            debug!("sending completion request (attempt {})", attempt);
            let err = match self.complete(req.clone()).await {
                Ok(response) => return Ok(response),
                Err(e) => e,
            };

            if !err.is_retryable() || attempt >= retry_config.max_retries {
                return Err(err);
            }
            warn!(
                "completion attempt {}/{} failed: {}",
                attempt + 1,
                retry_config.max_retries + 1,
                err
            );

            // Use retry_after from rate limit if available, otherwise exponential backoff
            let delay_ms = if let RelayError::RateLimit {
                retry_after: Some(secs),
            } = &err
            {
                secs.saturating_mul(1000).min(retry_config.max_delay_ms)
            } else {
                let base = (retry_config.initial_delay_ms as f64
                    * retry_config.backoff_multiplier.powi(attempt as i32))
                .min(retry_config.max_delay_ms as f64) as u64;
                // Add up to 25% jitter to avoid thundering herd
                base + (base as f64 * 0.25 * fastrand::f64()) as u64
            };
            tokio::time::sleep(std::time::Duration::from_millis(delay_ms)).await;
            attempt += 1;
        }
    }
}
