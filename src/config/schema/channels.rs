use serde::{Deserialize, Serialize};

/// Twilio drops a webhook that has not answered within this many seconds.
pub const TWILIO_WEBHOOK_DEADLINE_SECS: u64 = 15;

fn default_webhook_path() -> String {
    "/twilio/webhook".to_string()
}

/// Twilio SMS/WhatsApp webhook. Enabled by default since it only adds a route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwilioConfig {
    #[serde(default = "super::default_true")]
    pub enabled: bool,
    #[serde(default = "default_webhook_path", rename = "webhookPath")]
    pub webhook_path: String,
}

impl Default for TwilioConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            webhook_path: default_webhook_path(),
        }
    }
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct DiscordConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub token: String,
}

redact_debug!(DiscordConfig, enabled, redact(token),);

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChannelsConfig {
    #[serde(default)]
    pub twilio: TwilioConfig,
    #[serde(default)]
    pub discord: DiscordConfig,
}
