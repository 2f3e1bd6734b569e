use thiserror::Error;

/// Typed error hierarchy for chatrelay.
///
/// Use at module boundaries (provider calls, game lookups, channel delivery, config
/// validation). Internal/leaf functions can continue using `anyhow::Result`; the
/// `Internal` variant allows seamless conversion via the `?` operator.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    Input(String),

    #[error("Provider error: {message}")]
    Provider { message: String, retryable: bool },

    #[error("Rate limit exceeded")]
    RateLimit { retry_after: Option<u64> },

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Upstream timed out: {0}")]
    Timeout(String),

    #[error("Malformed upstream response: {0}")]
    MalformedResponse(String),

    #[error("Channel error: {channel}: {message}")]
    Transport { channel: String, message: String },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type RelayResult<T> = std::result::Result<T, RelayError>;

impl RelayError {
    /// Whether this error is transient and the operation may be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Provider { retryable, .. } => *retryable,
            Self::RateLimit { .. } | Self::Timeout(_) | Self::Internal(_) => true,
            Self::Config(_)
            | Self::Input(_)
            | Self::Auth(_)
            | Self::MalformedResponse(_)
            | Self::Transport { .. } => false,
        }
    }

    /// Short diagnostic tag that is safe to show to an end user.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "configuration error",
            Self::Input(_) => "invalid input",
            Self::Provider { .. } | Self::Internal(_) => "upstream error",
            Self::RateLimit { .. } => "rate limited",
            Self::Auth(_) => "auth error",
            Self::Timeout(_) => "timeout",
            Self::MalformedResponse(_) => "bad response",
            Self::Transport { .. } => "delivery error",
        }
    }
}

impl From<reqwest::Error> for RelayError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            return Self::Timeout("HTTP request exceeded the client timeout".to_string());
        }
        if e.is_decode() {
            return Self::MalformedResponse(e.to_string());
        }
        let retryable = e.is_connect() || e.is_request();
        Self::Provider {
            message: format!("request failed: {}", e.without_url()),
            retryable,
        }
    }
}
