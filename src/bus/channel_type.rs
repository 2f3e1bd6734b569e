use serde::{Deserialize, Serialize};

/// Channel type enumeration for type-safe channel identification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelType {
    Twilio,
    Discord,
    Http,
}

impl ChannelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelType::Twilio => "twilio",
            ChannelType::Discord => "discord",
            ChannelType::Http => "http",
        }
    }

    /// Hard per-message length limit of the transport, in characters.
    pub fn max_message_len(&self) -> usize {
        match self {
            ChannelType::Twilio => 1600,
            ChannelType::Discord => 2000,
            ChannelType::Http => 4096,
        }
    }
}

impl std::str::FromStr for ChannelType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "twilio" => Ok(ChannelType::Twilio),
            "discord" => Ok(ChannelType::Discord),
            "http" => Ok(ChannelType::Http),
            _ => Err(format!("Unknown channel type: {}", s)),
        }
    }
}

impl std::fmt::Display for ChannelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
