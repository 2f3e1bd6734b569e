pub mod base;
#[cfg(feature = "channel-discord")]
pub mod discord;
pub mod manager;
#[cfg(feature = "channel-twilio")]
pub mod twilio;

pub use base::{BaseChannel, UpstreamState, UpstreamStatus};
pub use manager::ChannelManager;
