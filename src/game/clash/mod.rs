use crate::errors::{RelayError, RelayResult};
use crate::game::{PlayerLookup, PlayerSummary};
use crate::providers::errors::ProviderErrorHandler;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::debug;

pub const DEFAULT_PROXY_URL: &str = "https://cocproxy.royaleapi.dev";

/// Clash of Clans API client, normally pointed at a static-IP proxy.
pub struct ClashClient {
    api_token: String,
    base_url: String,
    client: Client,
}

impl ClashClient {
    pub fn new(api_token: String, base_url: Option<String>, timeout_secs: u64) -> Self {
        Self {
            api_token,
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_PROXY_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            client: crate::providers::provider_http_client(timeout_secs),
        }
    }

    /// Tags are case-insensitive and always start with `#`.
    pub fn normalize_tag(tag: &str) -> String {
        let trimmed = tag.trim().trim_start_matches('#').to_uppercase();
        format!("#{}", trimmed)
    }

    fn player_url(&self, tag: &str) -> String {
        format!(
            "{}/v1/players/{}",
            self.base_url,
            urlencoding::encode(&Self::normalize_tag(tag))
        )
    }
}

#[async_trait]
impl PlayerLookup for ClashClient {
    async fn fetch_player(&self, tag: &str) -> RelayResult<Option<PlayerSummary>> {
        let url = self.player_url(tag);
        debug!("clash: fetching player {}", Self::normalize_tag(tag));

        let resp = self
            .client
            .get(&url)
            .bearer_auth(&self.api_token)
            .send()
            .await?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let resp = ProviderErrorHandler::check_http_status(resp, "Clash").await?;
        let json: Value = resp.json().await.map_err(|e| {
            RelayError::MalformedResponse(format!("clash player body: {}", e.without_url()))
        })?;

        let Some(name) = json["name"].as_str() else {
            return Ok(None);
        };
        Ok(Some(PlayerSummary {
            name: name.to_string(),
            town_hall_level: json["townHallLevel"].as_u64().map(|v| v as u32),
            trophies: json["trophies"].as_u64().map(|v| v as u32),
        }))
    }
}
