//! The relay pipeline: commands, activation, history, provider call, chunking.

pub mod chunk;
pub mod commands;

pub use chunk::{ChunkError, chunk};
pub use commands::{Command, ToggleMode};

use crate::bus::{ConversationKey, InboundMessage};
use crate::errors::RelayError;
use crate::game::PlayerLookup;
use crate::providers::base::{CompletionProvider, CompletionRequest, Message, RetryConfig};
use crate::session::{Role, SessionManager};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const NO_CONTENT_REPLY: &str = "🤔 I got an empty reply. Try rephrasing your message.";
pub const PLAYER_NOT_FOUND_REPLY: &str = "❌ Player not found. Check the tag.";
pub const PLAYER_LOOKUP_DISABLED_REPLY: &str = "Player lookup is not configured.";

/// Reply sent in place of a completion when the upstream call fails.
pub fn failure_reply(err: &RelayError) -> String {
    format!("⚠️ Sorry, I couldn't get a reply right now ({}).", err.kind())
}

/// Runtime knobs for [`RelayPipeline`], built from the `relay` and `provider`
/// config sections.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub command_prefix: String,
    /// Stay silent in group contexts until the conversation is toggled on.
    pub require_activation: bool,
    pub history_enabled: bool,
    pub history_window: usize,
    pub system_prompt: Option<String>,
    pub model: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub provider_timeout: Duration,
    pub retry: RetryConfig,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            command_prefix: "/".to_string(),
            require_activation: true,
            history_enabled: true,
            history_window: 20,
            system_prompt: None,
            model: None,
            max_tokens: 1024,
            temperature: 0.7,
            provider_timeout: Duration::from_secs(12),
            retry: RetryConfig::default(),
        }
    }
}

pub struct RelayPipeline {
    provider: Arc<dyn CompletionProvider>,
    sessions: Arc<SessionManager>,
    lookup: Option<Arc<dyn PlayerLookup>>,
    config: RelayConfig,
}

impl RelayPipeline {
    pub fn new(
        provider: Arc<dyn CompletionProvider>,
        sessions: Arc<SessionManager>,
        config: RelayConfig,
    ) -> Self {
        Self {
            provider,
            sessions,
            lookup: None,
            config,
        }
    }

    #[must_use]
    pub fn with_player_lookup(mut self, lookup: Arc<dyn PlayerLookup>) -> Self {
        self.lookup = Some(lookup);
        self
    }

    pub fn provider(&self) -> &Arc<dyn CompletionProvider> {
        &self.provider
    }

    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Turn one inbound message into the chunks to send back.
    ///
    /// Never fails: upstream errors become a single apology chunk. An empty
    /// result means the message was deliberately ignored.
    pub async fn handle_inbound(&self, msg: &InboundMessage) -> Vec<String> {
        let limit = msg.channel.max_message_len();
        let key = msg.conversation_key();
        let text = msg.content.trim();
        debug!(
            "relay: {} message on {} ({} chars, group={})",
            msg.channel,
            key,
            text.chars().count(),
            msg.is_group
        );

        if text.is_empty() {
            return render(&commands::help_text(&self.config.command_prefix), limit);
        }

        if let Some(cmd) = Command::parse(text, &self.config.command_prefix) {
            let reply = self.run_command(cmd, &key).await;
            return render(&reply, limit);
        }

        if msg.is_group && self.config.require_activation && !self.sessions.is_active(&key) {
            debug!("relay: suppressed reply on inactive {}", key);
            return Vec::new();
        }

        let reply = self.complete(&key, &msg.content).await;
        render(&reply, limit)
    }

    async fn run_command(&self, cmd: Command, key: &ConversationKey) -> String {
        let prefix = &self.config.command_prefix;
        match cmd {
            Command::Help => commands::help_text(prefix),
            Command::Clear => {
                if self.sessions.clear(key).await {
                    info!("relay: cleared history for {}", key);
                    "🧹 Conversation cleared.".to_string()
                } else {
                    "Nothing to clear.".to_string()
                }
            }
            Command::Toggle(ToggleMode::Flip) => {
                let now = self.sessions.toggle(key);
                info!("relay: {} toggled {}", key, on_off(now));
                format!("Replies are now {} in this chat.", on_off(now))
            }
            Command::Toggle(ToggleMode::Set(active)) => {
                let previous = self.sessions.set_active(key, active);
                if previous == active {
                    format!("Replies are already {} in this chat.", on_off(active))
                } else {
                    info!("relay: {} toggled {}", key, on_off(active));
                    format!("Replies are now {} in this chat.", on_off(active))
                }
            }
            Command::Toggle(ToggleMode::Invalid(_)) => commands::toggle_usage(prefix),
            Command::Player(None) => commands::player_usage(prefix),
            Command::Player(Some(tag)) => self.lookup_player(&tag).await,
            Command::Unknown(name) => commands::unknown_text(prefix, &name),
        }
    }

    async fn lookup_player(&self, tag: &str) -> String {
        let Some(lookup) = &self.lookup else {
            return PLAYER_LOOKUP_DISABLED_REPLY.to_string();
        };
        match lookup.fetch_player(tag).await {
            Ok(Some(player)) => player.format_reply(),
            Ok(None) => PLAYER_NOT_FOUND_REPLY.to_string(),
            Err(e) => {
                warn!("relay: player lookup failed: {}", e);
                failure_reply(&e)
            }
        }
    }

    /// Run one completion for `key`, holding its session lock throughout so
    /// exchanges on the same conversation are applied in order.
    async fn complete(&self, key: &ConversationKey, text: &str) -> String {
        let session = self.sessions.session(key);
        let mut session = session.lock().await;

        let mut messages = Vec::new();
        if let Some(prompt) = &self.config.system_prompt {
            messages.push(Message::system(prompt.clone()));
        }
        if self.config.history_enabled {
            for turn in session.history(self.config.history_window) {
                messages.push(match turn.role {
                    Role::User => Message::user(turn.content.clone()),
                    Role::Assistant => Message::assistant(turn.content.clone()),
                });
            }
        }
        messages.push(Message::user(text));

        let req = CompletionRequest {
            messages,
            model: self.config.model.clone(),
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        let timeout = self.config.provider_timeout;
        let result = match tokio::time::timeout(
            timeout,
            self.provider.complete_with_retry(req, &self.config.retry),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(RelayError::Timeout(format!(
                "no reply within {}ms",
                timeout.as_millis()
            ))),
        };

        match result {
            Ok(response) => {
                let Some(reply) = response.content.filter(|c| !c.trim().is_empty()) else {
                    warn!("relay: {} returned empty content for {}", self.provider.name(), key);
                    return NO_CONTENT_REPLY.to_string();
                };
                if self.config.history_enabled {
                    session.record_exchange(text, &reply);
                }
                debug!("relay: reply for {} ({} chars)", key, reply.chars().count());
                reply
            }
            Err(e) => {
                warn!(
                    "relay: {} failed for {}: {}",
                    self.provider.name(),
                    key,
                    e
                );
                failure_reply(&e)
            }
        }
    }
}

fn on_off(active: bool) -> &'static str {
    if active { "on" } else { "off" }
}

fn render(text: &str, limit: usize) -> Vec<String> {
    chunk(text, limit).unwrap_or_else(|_| vec![text.to_string()])
}
