use crate::bus::{ChannelType, InboundMessage};
use crate::channels::base::{BaseChannel, UpstreamStatus};
use crate::config::DiscordConfig;
use crate::errors::RelayError;
use crate::relay::RelayPipeline;
use anyhow::Result;
use async_trait::async_trait;
use serenity::async_trait as serenity_async_trait;
use serenity::model::channel::Message as DiscordMessage;
use serenity::model::event::ResumedEvent;
use serenity::model::gateway::{GatewayIntents, Ready};
use serenity::prelude::*;
use std::sync::Arc;

struct Handler {
    pipeline: Arc<RelayPipeline>,
    status: UpstreamStatus,
}

/// Messages posted inside a guild are shared contexts; DMs are one-to-one.
fn inbound_from(author_id: &str, channel_id: &str, content: &str, in_guild: bool) -> InboundMessage {
    InboundMessage::new(ChannelType::Discord, author_id, channel_id, content).in_group(in_guild)
}

#[serenity_async_trait]
impl EventHandler for Handler {
    async fn message(&self, ctx: Context, msg: DiscordMessage) {
        if msg.author.bot {
            return;
        }

        let inbound = inbound_from(
            &msg.author.id.to_string(),
            &msg.channel_id.to_string(),
            &msg.content,
            msg.guild_id.is_some(),
        );
        let chunks = self.pipeline.handle_inbound(&inbound).await;

        for chunk in chunks {
            if let Err(e) = msg.channel_id.say(&ctx.http, &chunk).await {
                let err = RelayError::Transport {
                    channel: "discord".to_string(),
                    message: format!("send to {} failed: {}", msg.channel_id, e),
                };
                // Remaining chunks would arrive out of context; drop them
                tracing::error!("{}", err);
                break;
            }
        }
    }

    async fn ready(&self, _: Context, ready: Ready) {
        self.status.set_connected(true);
        tracing::info!(
            "Discord bot connected as {} (id: {})",
            ready.user.name,
            ready.user.id
        );
    }

    async fn resume(&self, _: Context, _: ResumedEvent) {
        self.status.set_connected(true);
        tracing::info!("Discord session resumed");
    }
}

pub struct DiscordChannel {
    config: DiscordConfig,
    pipeline: Arc<RelayPipeline>,
    status: UpstreamStatus,
    client_handle: Option<tokio::task::JoinHandle<()>>,
}

impl DiscordChannel {
    pub fn new(config: DiscordConfig, pipeline: Arc<RelayPipeline>) -> Self {
        Self {
            config,
            pipeline,
            status: UpstreamStatus::enabled(),
            client_handle: None,
        }
    }
}

#[async_trait]
impl BaseChannel for DiscordChannel {
    fn name(&self) -> &str {
        "discord"
    }

    fn status(&self) -> UpstreamStatus {
        self.status.clone()
    }

    async fn start(&mut self) -> Result<()> {
        if self.config.token.is_empty() {
            return Err(anyhow::anyhow!("Discord token is empty"));
        }

        let handler = Handler {
            pipeline: self.pipeline.clone(),
            status: self.status.clone(),
        };

        tracing::info!("Connecting to Discord gateway...");
        let mut client = Client::builder(
            &self.config.token,
            GatewayIntents::GUILD_MESSAGES
                | GatewayIntents::DIRECT_MESSAGES
                | GatewayIntents::MESSAGE_CONTENT,
        )
        .event_handler(handler)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create Discord client: {}", e))?;

        // Keep the client alive by running start() in a spawned task
        let status = self.status.clone();
        let shard_manager = client.shard_manager.clone();
        let handle = tokio::spawn(async move {
            if let Err(why) = client.start().await {
                tracing::error!("Discord client connection error: {:?}", why);
                shard_manager.shutdown_all().await;
            }
            status.set_connected(false);
        });

        self.client_handle = Some(handle);
        tracing::info!("Discord channel started; connection will be established in background");
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        if let Some(handle) = self.client_handle.take() {
            handle.abort();
        }
        self.status.set_connected(false);
        Ok(())
    }
}
