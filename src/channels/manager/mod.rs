use crate::channels::base::{BaseChannel, UpstreamStatus};
#[cfg(feature = "channel-discord")]
use crate::channels::discord::DiscordChannel;
use crate::config::Config;
use crate::relay::RelayPipeline;
use anyhow::Result;
use std::sync::Arc;

/// Owns the event-stream channels and their lifecycle.
pub struct ChannelManager {
    channels: Vec<Box<dyn BaseChannel>>,
}

impl ChannelManager {
    pub fn new(config: &Config, pipeline: &Arc<RelayPipeline>) -> Self {
        let mut channels: Vec<Box<dyn BaseChannel>> = Vec::new();

        #[cfg(feature = "channel-discord")]
        if config.channels.discord.enabled {
            tracing::debug!("Initializing Discord channel...");
            channels.push(Box::new(DiscordChannel::new(
                config.channels.discord.clone(),
                pipeline.clone(),
            )));
            tracing::info!("Discord channel enabled");
        }
        #[cfg(not(feature = "channel-discord"))]
        {
            let _ = pipeline;
            if config.channels.discord.enabled {
                tracing::warn!("Discord is enabled in config but this build lacks channel-discord");
            }
        }

        Self { channels }
    }

    pub fn with_channels(channels: Vec<Box<dyn BaseChannel>>) -> Self {
        Self { channels }
    }

    pub fn enabled_channels(&self) -> Vec<&str> {
        self.channels.iter().map(|c| c.name()).collect()
    }

    /// Connection status for `name`, or a disabled flag if no such channel runs.
    pub fn status(&self, name: &str) -> UpstreamStatus {
        self.channels
            .iter()
            .find(|c| c.name() == name)
            .map_or_else(UpstreamStatus::disabled, |c| c.status())
    }

    pub async fn start_all(&mut self) -> Result<()> {
        for channel in &mut self.channels {
            let name = channel.name().to_string();
            tracing::info!("Starting channel: {}", name);
            if let Err(e) = channel.start().await {
                tracing::error!("Failed to start channel {}: {}", name, e);
                return Err(anyhow::anyhow!("Failed to start channel {}: {}", name, e));
            }
            tracing::info!("Channel {} started", name);
        }
        Ok(())
    }

    /// Stop every channel, continuing past failures.
    pub async fn stop_all(&mut self) -> Result<()> {
        let mut first_err = None;
        for channel in &mut self.channels {
            if let Err(e) = channel.stop().await {
                tracing::warn!("Failed to stop channel {}: {}", channel.name(), e);
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
