use crate::errors::{RelayError, RelayResult};
use crate::providers::base::{
    CompletionProvider, CompletionRequest, CompletionResponse, ProviderMetrics,
};
use crate::providers::errors::ProviderErrorHandler;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};

const BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Client for any OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenAIProvider {
    api_key: String,
    default_model: String,
    base_url: String,
    client: Client,
    metrics: Arc<Mutex<ProviderMetrics>>,
}

impl OpenAIProvider {
    pub fn new(
        api_key: String,
        default_model: Option<String>,
        base_url: Option<String>,
        timeout_secs: u64,
    ) -> Self {
        Self {
            api_key,
            default_model: default_model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: base_url
                .unwrap_or_else(|| BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            client: super::provider_http_client(timeout_secs),
            metrics: Arc::new(Mutex::new(ProviderMetrics::default())),
        }
    }

    fn parse_response(json: &Value) -> RelayResult<CompletionResponse> {
        let choice = json["choices"]
            .as_array()
            .and_then(|arr| arr.first())
            .ok_or_else(|| {
                RelayError::MalformedResponse("no choices in OpenAI response".to_string())
            })?;

        let content = choice["message"]["content"]
            .as_str()
            .map(std::string::ToString::to_string);

        Ok(CompletionResponse {
            content,
            input_tokens: json["usage"]["prompt_tokens"].as_u64(),
            output_tokens: json["usage"]["completion_tokens"].as_u64(),
        })
    }
}

#[async_trait]
impl CompletionProvider for OpenAIProvider {
    async fn complete(&self, req: CompletionRequest) -> RelayResult<CompletionResponse> {
        let messages: Vec<Value> = req
            .messages
            .iter()
            .map(|m| json!({"role": m.role, "content": m.content}))
            .collect();

        let payload = json!({
            "model": req.model.as_deref().unwrap_or(&self.default_model),
            "messages": messages,
            "max_tokens": req.max_tokens,
            "temperature": req.temperature,
        });

        if let Ok(mut metrics) = self.metrics.lock() {
            metrics.request_count += 1;
        }

        let resp = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if let Ok(mut m) = self.metrics.lock() {
                    m.error_count += 1;
                }
                RelayError::from(e)
            })?;

        let json = ProviderErrorHandler::check_response(resp, "OpenAI", &self.metrics).await?;

        if let Some(tokens) = json["usage"]["total_tokens"].as_u64()
            && let Ok(mut metrics) = self.metrics.lock()
        {
            metrics.token_count += tokens;
        }

        Self::parse_response(&json)
    }

    fn name(&self) -> &str {
        "openai"
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }

    fn metrics(&self) -> ProviderMetrics {
        self.metrics
            .lock()
            .map(|m| m.clone())
            .unwrap_or_default()
    }
}
