//! Game-data lookups exposed as chat commands.

pub mod clash;

use crate::errors::RelayResult;
use async_trait::async_trait;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerSummary {
    pub name: String,
    pub town_hall_level: Option<u32>,
    pub trophies: Option<u32>,
}

impl PlayerSummary {
    /// One-line reply shown to the user.
    pub fn format_reply(&self) -> String {
        let th = self
            .town_hall_level
            .map_or_else(|| "?".to_string(), |v| v.to_string());
        let trophies = self
            .trophies
            .map_or_else(|| "?".to_string(), |v| v.to_string());
        format!("🏆 {} | TH: {} | Trophies: {}", self.name, th, trophies)
    }
}

#[async_trait]
pub trait PlayerLookup: Send + Sync {
    /// Fetch a player by tag. `Ok(None)` means the tag does not exist.
    async fn fetch_player(&self, tag: &str) -> RelayResult<Option<PlayerSummary>>;
}

pub use clash::ClashClient;
