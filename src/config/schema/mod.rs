/// Implements `Debug` for a config struct, masking secret fields.
///
/// `field` prints the value as-is; `redact(field)` prints `[empty]` or
/// `[REDACTED]` for a `String` secret.
macro_rules! redact_debug {
    (@field $builder:ident, $self:ident, redact($field:ident)) => {
        $builder.field(
            stringify!($field),
            &if $self.$field.is_empty() {
                "[empty]"
            } else {
                "[REDACTED]"
            },
        );
    };
    (@field $builder:ident, $self:ident, $field:ident) => {
        $builder.field(stringify!($field), &$self.$field);
    };

    (@fields $builder:ident, $self:ident,) => {};
    (@fields $builder:ident, $self:ident, redact($field:ident), $($rest:tt)*) => {
        redact_debug!(@field $builder, $self, redact($field));
        redact_debug!(@fields $builder, $self, $($rest)*);
    };
    (@fields $builder:ident, $self:ident, $field:ident, $($rest:tt)*) => {
        redact_debug!(@field $builder, $self, $field);
        redact_debug!(@fields $builder, $self, $($rest)*);
    };

    ($struct_name:ident, $($fields:tt)*) => {
        impl std::fmt::Debug for $struct_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                let mut builder = f.debug_struct(stringify!($struct_name));
                redact_debug!(@fields builder, self, $($fields)*);
                builder.finish()
            }
        }
    };
}

// Declared after the macro so they can use `redact_debug!`
mod channels;
mod providers;

pub use channels::*;
pub use providers::*;

use crate::errors::RelayError;
use crate::game::{ClashClient, PlayerLookup};
use crate::providers::base::{CompletionProvider, RetryConfig};
use crate::providers::gemini::GeminiProvider;
use crate::providers::openai::OpenAIProvider;
use crate::relay::RelayConfig;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Gateway
// ---------------------------------------------------------------------------

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

// ---------------------------------------------------------------------------
// Relay behavior
// ---------------------------------------------------------------------------

fn default_command_prefix() -> String {
    "/".to_string()
}

fn default_history_window() -> usize {
    20
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Number of prior turns replayed into each prompt.
    #[serde(default = "default_history_window")]
    pub window: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            window: default_history_window(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelaySettings {
    #[serde(default = "default_command_prefix", rename = "commandPrefix")]
    pub command_prefix: String,
    /// Group conversations stay silent until toggled on.
    #[serde(default = "default_true", rename = "requireActivation")]
    pub require_activation: bool,
    #[serde(default, rename = "activeByDefault")]
    pub active_by_default: bool,
    #[serde(default)]
    pub history: HistoryConfig,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            command_prefix: default_command_prefix(),
            require_activation: true,
            active_by_default: false,
            history: HistoryConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Game lookup
// ---------------------------------------------------------------------------

fn default_proxy_url() -> String {
    crate::game::clash::DEFAULT_PROXY_URL.to_string()
}

#[derive(Clone, Serialize, Deserialize)]
pub struct GameConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default, rename = "apiToken")]
    pub api_token: String,
    #[serde(default = "default_proxy_url", rename = "proxyUrl")]
    pub proxy_url: String,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_token: String::new(),
            proxy_url: default_proxy_url(),
        }
    }
}

redact_debug!(GameConfig, enabled, redact(api_token), proxy_url,);

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub relay: RelaySettings,
    #[serde(default)]
    pub channels: ChannelsConfig,
    #[serde(default)]
    pub game: GameConfig,
}

impl Config {
    /// Validate configuration values. The error names the first offending key.
    pub fn validate(&self) -> Result<(), RelayError> {
        self.validate_gateway()?;
        self.validate_provider()?;
        self.validate_relay()?;
        self.validate_channels()?;
        self.validate_game()?;
        Ok(())
    }

    fn validate_gateway(&self) -> Result<(), RelayError> {
        if self.gateway.port == 0 {
            return Err(RelayError::Config("gateway.port must be > 0".into()));
        }
        if self.gateway.port < 1024 {
            warn!(
                "gateway.port {} is a privileged port (< 1024), may require elevated permissions",
                self.gateway.port
            );
        }
        Ok(())
    }

    fn validate_provider(&self) -> Result<(), RelayError> {
        let p = &self.provider;
        if p.api_key.trim().is_empty() {
            return Err(RelayError::Config(format!(
                "provider.apiKey is required (or set {})",
                p.kind.api_key_env()
            )));
        }
        if p.max_tokens == 0 {
            return Err(RelayError::Config("provider.maxTokens must be > 0".into()));
        }
        if !p.temperature.is_finite() || !(0.0..=2.0).contains(&p.temperature) {
            return Err(RelayError::Config(
                "provider.temperature must be a finite number between 0.0 and 2.0".into(),
            ));
        }
        if p.timeout_secs == 0 {
            return Err(RelayError::Config(
                "provider.timeoutSecs must be > 0".into(),
            ));
        }
        if p.max_retries > 10 {
            return Err(RelayError::Config(
                "provider.maxRetries is unreasonably large (> 10)".into(),
            ));
        }
        if let Some(url) = &p.base_url
            && !url.starts_with("http://")
            && !url.starts_with("https://")
        {
            return Err(RelayError::Config(
                "provider.baseUrl must start with http:// or https://".into(),
            ));
        }
        Ok(())
    }

    fn validate_relay(&self) -> Result<(), RelayError> {
        let r = &self.relay;
        if r.command_prefix.is_empty() || r.command_prefix.chars().any(char::is_whitespace) {
            return Err(RelayError::Config(
                "relay.commandPrefix must be non-empty and contain no whitespace".into(),
            ));
        }
        if r.history.enabled && r.history.window == 0 {
            return Err(RelayError::Config(
                "relay.history.window must be > 0 when history is enabled".into(),
            ));
        }
        Ok(())
    }

    fn validate_channels(&self) -> Result<(), RelayError> {
        let twilio = &self.channels.twilio;
        if twilio.enabled {
            if !twilio.webhook_path.starts_with('/') {
                return Err(RelayError::Config(
                    "channels.twilio.webhookPath must start with '/'".into(),
                ));
            }
            if twilio.webhook_path.starts_with("/api/") {
                return Err(RelayError::Config(
                    "channels.twilio.webhookPath must not be under /api/".into(),
                ));
            }
            if self.provider.timeout_secs >= TWILIO_WEBHOOK_DEADLINE_SECS {
                warn!(
                    "provider.timeoutSecs {} is not below Twilio's {}s webhook deadline; slow replies will be lost",
                    self.provider.timeout_secs, TWILIO_WEBHOOK_DEADLINE_SECS
                );
            }
        }
        let discord = &self.channels.discord;
        if discord.enabled && discord.token.trim().is_empty() {
            return Err(RelayError::Config(
                "channels.discord.token is required when Discord is enabled (or set CHATRELAY_DISCORD_TOKEN)"
                    .into(),
            ));
        }
        Ok(())
    }

    fn validate_game(&self) -> Result<(), RelayError> {
        let g = &self.game;
        if g.enabled {
            if g.api_token.trim().is_empty() {
                return Err(RelayError::Config(
                    "game.apiToken is required when player lookup is enabled (or set CHATRELAY_COC_API_TOKEN)"
                        .into(),
                ));
            }
            if !g.proxy_url.starts_with("http://") && !g.proxy_url.starts_with("https://") {
                return Err(RelayError::Config(
                    "game.proxyUrl must start with http:// or https://".into(),
                ));
            }
        }
        Ok(())
    }

    /// Build the completion provider selected by `provider.kind`.
    pub fn create_provider(&self) -> Arc<dyn CompletionProvider> {
        let p = &self.provider;
        let model = p.model.clone().filter(|m| !m.is_empty());
        match p.kind {
            ProviderKind::Gemini => Arc::new(GeminiProvider::new(
                p.api_key.clone(),
                model,
                p.base_url.clone(),
                p.timeout_secs,
            )),
            ProviderKind::OpenAI => Arc::new(OpenAIProvider::new(
                p.api_key.clone(),
                model,
                p.base_url.clone(),
                p.timeout_secs,
            )),
        }
    }

    /// Player lookup client, if enabled.
    pub fn create_player_lookup(&self) -> Option<Arc<dyn PlayerLookup>> {
        if !self.game.enabled {
            return None;
        }
        Some(Arc::new(ClashClient::new(
            self.game.api_token.clone(),
            Some(self.game.proxy_url.clone()),
            self.provider.timeout_secs,
        )))
    }

    pub fn relay_config(&self) -> RelayConfig {
        RelayConfig {
            command_prefix: self.relay.command_prefix.clone(),
            require_activation: self.relay.require_activation,
            history_enabled: self.relay.history.enabled,
            history_window: self.relay.history.window,
            system_prompt: self.provider.system_prompt.clone().filter(|s| !s.is_empty()),
            model: self.provider.model.clone().filter(|m| !m.is_empty()),
            max_tokens: self.provider.max_tokens,
            temperature: self.provider.temperature,
            provider_timeout: Duration::from_secs(self.provider.timeout_secs),
            retry: RetryConfig::with_retries(self.provider.max_retries),
        }
    }
}
