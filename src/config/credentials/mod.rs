use super::schema::Config;
use tracing::{debug, warn};

macro_rules! define_credentials {
    ($( $name:literal, $env:literal => $($path:ident).+ );* $(;)?) => {
        /// (slot name, env var name) pairs.
        pub const CREDENTIAL_ENV_VARS: &[(&str, &str)] = &[$(($name, $env)),*];

        /// Current value of a credential field by slot name.
        pub fn get_credential_value<'a>(config: &'a Config, name: &str) -> Option<&'a str> {
            match name {
                $($name => Some(config.$($path).+.as_str()),)*
                _ => None,
            }
        }

        fn apply_credential_overrides(config: &mut Config, lookup: &impl Fn(&str) -> Option<String>) {
            $(
                if let Some(val) = lookup($env).filter(|v| !v.is_empty()) {
                    debug!("credential {} taken from {}", $name, $env);
                    config.$($path).+ = val;
                }
            )*
        }
    };
}

define_credentials! {
    "provider-api-key", "CHATRELAY_PROVIDER_API_KEY" => provider.api_key;
    "discord-token",    "CHATRELAY_DISCORD_TOKEN"    => channels.discord.token;
    "coc-api-token",    "CHATRELAY_COC_API_TOKEN"    => game.api_token;
}

pub const PORT_ENV: &str = "CHATRELAY_PORT";

/// Apply environment variable overrides.
///
/// Any `CHATRELAY_*` variable that is set and non-empty overwrites the
/// matching config field. The provider key is also read from the
/// kind-specific variable (`CHATRELAY_GEMINI_API_KEY` or
/// `CHATRELAY_OPENAI_API_KEY`), which wins over the generic one.
pub fn apply_env_overrides(config: &mut Config) {
    apply_overrides_from(config, |name| std::env::var(name).ok());
}

/// Same as [`apply_env_overrides`] with a custom variable source.
pub fn apply_overrides_from(config: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    apply_credential_overrides(config, &lookup);

    let kind_env = config.provider.kind.api_key_env();
    if let Some(key) = lookup(kind_env).filter(|v| !v.is_empty()) {
        debug!("credential provider-api-key taken from {}", kind_env);
        config.provider.api_key = key;
    }

    if let Some(port) = lookup(PORT_ENV).filter(|v| !v.is_empty()) {
        match port.parse::<u16>() {
            Ok(port) => config.gateway.port = port,
            Err(_) => warn!("ignoring {}={:?}: not a valid port", PORT_ENV, port),
        }
    }
}
