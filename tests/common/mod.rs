// Shared test helpers; not all items are used by every test binary.
#![allow(unused)]

use async_trait::async_trait;
use chatrelay::bus::{ChannelType, InboundMessage};
use chatrelay::errors::{RelayError, RelayResult};
use chatrelay::providers::base::{
    CompletionProvider, CompletionRequest, CompletionResponse, Message, ProviderMetrics,
};
use chatrelay::relay::{RelayConfig, RelayPipeline};
use chatrelay::session::SessionManager;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub messages: Vec<Message>,
    pub model: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
}

pub struct MockProvider {
    responses: Mutex<VecDeque<RelayResult<CompletionResponse>>>,
    pub calls: Mutex<Vec<RecordedCall>>,
    pub default_response: String,
}

impl MockProvider {
    pub fn new() -> Arc<Self> {
        Self::with_responses(Vec::new())
    }

    pub fn with_responses(responses: Vec<RelayResult<CompletionResponse>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(VecDeque::from(responses)),
            calls: Mutex::new(Vec::new()),
            default_response: "Mock response".to_string(),
        })
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionProvider for MockProvider {
    async fn complete(&self, req: CompletionRequest) -> RelayResult<CompletionResponse> {
        self.calls.lock().unwrap().push(RecordedCall {
            messages: req.messages,
            model: req.model,
            temperature: req.temperature,
            max_tokens: req.max_tokens,
        });

        let response = self.responses.lock().unwrap().pop_front();
        response.unwrap_or_else(|| Ok(text_response(&self.default_response)))
    }

    fn name(&self) -> &str {
        "mock"
    }

    fn default_model(&self) -> &str {
        "mock-model"
    }

    fn metrics(&self) -> ProviderMetrics {
        ProviderMetrics {
            request_count: self.calls.lock().unwrap().len() as u64,
            ..ProviderMetrics::default()
        }
    }
}

pub fn text_response(content: &str) -> CompletionResponse {
    CompletionResponse::text(content)
}

pub fn pipeline_with(provider: Arc<MockProvider>, config: RelayConfig) -> Arc<RelayPipeline> {
    Arc::new(RelayPipeline::new(
        provider,
        Arc::new(SessionManager::default()),
        config,
    ))
}

pub fn pipeline(provider: Arc<MockProvider>) -> Arc<RelayPipeline> {
    pipeline_with(provider, RelayConfig::default())
}

pub fn discord_group(chat: &str, text: &str) -> InboundMessage {
    InboundMessage::new(ChannelType::Discord, "user-1", chat, text).in_group(true)
}

pub fn sms(from: &str, text: &str) -> InboundMessage {
    InboundMessage::new(ChannelType::Twilio, from, from, text)
}
