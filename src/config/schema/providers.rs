use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Gemini,
    #[serde(alias = "openai-compatible")]
    OpenAI,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::OpenAI => "openai",
        }
    }

    /// Env var consulted for this provider's API key.
    pub fn api_key_env(&self) -> &'static str {
        match self {
            Self::Gemini => "CHATRELAY_GEMINI_API_KEY",
            Self::OpenAI => "CHATRELAY_OPENAI_API_KEY",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_temperature() -> f32 {
    0.7
}

// Stays under TWILIO_WEBHOOK_DEADLINE_SECS so a timeout still reaches the sender
fn default_timeout_secs() -> u64 {
    12
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub kind: ProviderKind,
    #[serde(default, rename = "apiKey")]
    pub api_key: String,
    /// Empty means the provider's default model.
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default, rename = "baseUrl")]
    pub base_url: Option<String>,
    #[serde(default, rename = "systemPrompt")]
    pub system_prompt: Option<String>,
    #[serde(default = "default_max_tokens", rename = "maxTokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_timeout_secs", rename = "timeoutSecs")]
    pub timeout_secs: u64,
    #[serde(default, rename = "maxRetries")]
    pub max_retries: usize,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::default(),
            api_key: String::new(),
            model: None,
            base_url: None,
            system_prompt: None,
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
            max_retries: 0,
        }
    }
}

redact_debug!(
    ProviderConfig,
    kind,
    redact(api_key),
    model,
    base_url,
    system_prompt,
    max_tokens,
    temperature,
    timeout_secs,
    max_retries,
);
