use crate::bus::ChannelType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Identifier for the context a reply is scoped to.
///
/// Opaque outside this module: two keys are equal iff they came from the same
/// channel and chat.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationKey(String);

impl ConversationKey {
    pub fn new(channel: ChannelType, chat_id: &str) -> Self {
        Self(format!("{}:{}", channel, chat_id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ConversationKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
    pub channel: ChannelType,
    pub sender_id: String,
    pub chat_id: String,
    pub content: String,
    /// Shared contexts (guild channels, group conversations) need explicit
    /// activation before the bot replies unsolicited.
    pub is_group: bool,
    pub timestamp: DateTime<Utc>,
    pub metadata: HashMap<String, serde_json::Value>,
}

impl InboundMessage {
    pub fn new(
        channel: ChannelType,
        sender_id: impl Into<String>,
        chat_id: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            channel,
            sender_id: sender_id.into(),
            chat_id: chat_id.into(),
            content: content.into(),
            is_group: false,
            timestamp: Utc::now(),
            metadata: HashMap::new(),
        }
    }

    #[must_use]
    pub fn in_group(mut self, is_group: bool) -> Self {
        self.is_group = is_group;
        self
    }

    pub fn conversation_key(&self) -> ConversationKey {
        ConversationKey::new(self.channel, &self.chat_id)
    }
}
