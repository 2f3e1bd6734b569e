use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// A long-lived event-stream connection (as opposed to webhook ingress,
/// which is served by the gateway router).
#[async_trait]
pub trait BaseChannel: Send + Sync {
    fn name(&self) -> &str;

    async fn start(&mut self) -> anyhow::Result<()>;
    async fn stop(&mut self) -> anyhow::Result<()>;

    /// Connection status shared with the health endpoint.
    fn status(&self) -> UpstreamStatus;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamState {
    Disabled,
    Disconnected,
    Connected,
}

impl UpstreamState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::Disconnected => "disconnected",
            Self::Connected => "connected",
        }
    }
}

/// Cheap, cloneable connection flag for one upstream.
#[derive(Debug, Clone)]
pub struct UpstreamStatus {
    enabled: bool,
    connected: Arc<AtomicBool>,
}

impl UpstreamStatus {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            connected: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Enabled but not yet connected.
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            connected: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::Release);
    }

    pub fn state(&self) -> UpstreamState {
        if !self.enabled {
            UpstreamState::Disabled
        } else if self.connected.load(Ordering::Acquire) {
            UpstreamState::Connected
        } else {
            UpstreamState::Disconnected
        }
    }
}

impl Default for UpstreamStatus {
    fn default() -> Self {
        Self::disabled()
    }
}
