use crate::errors::{RelayError, RelayResult};
use crate::providers::base::{
    CompletionProvider, CompletionRequest, CompletionResponse, ProviderMetrics,
};
use crate::providers::errors::ProviderErrorHandler;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};

const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-2.0-flash";

pub struct GeminiProvider {
    api_key: String,
    default_model: String,
    base_url: String,
    client: Client,
    metrics: Arc<Mutex<ProviderMetrics>>,
}

impl GeminiProvider {
    pub fn new(
        api_key: String,
        default_model: Option<String>,
        base_url: Option<String>,
        timeout_secs: u64,
    ) -> Self {
        Self {
            api_key,
            default_model: default_model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: base_url.unwrap_or_else(|| BASE_URL.to_string()),
            client: super::provider_http_client(timeout_secs),
            metrics: Arc::new(Mutex::new(ProviderMetrics::default())),
        }
    }

    fn build_payload(req: &CompletionRequest) -> Value {
        // Gemini has no system role; system text goes into systemInstruction
        let system_text: Vec<&str> = req
            .messages
            .iter()
            .filter(|m| m.role == "system")
            .map(|m| m.content.as_str())
            .collect();

        let contents: Vec<Value> = req
            .messages
            .iter()
            .filter(|m| m.role != "system")
            .map(|msg| {
                let role = if msg.role == "assistant" {
                    "model"
                } else {
                    "user"
                };
                json!({
                    "role": role,
                    "parts": [{"text": msg.content}]
                })
            })
            .collect();

        let mut payload = json!({
            "contents": contents,
            "generationConfig": {
                "maxOutputTokens": req.max_tokens,
                "temperature": req.temperature,
            },
        });
        if !system_text.is_empty() {
            payload["systemInstruction"] = json!({
                "parts": [{"text": system_text.join("\n\n")}]
            });
        }
        payload
    }

    fn parse_response(json: &Value) -> RelayResult<CompletionResponse> {
        let Some(candidate) = json["candidates"].as_array().and_then(|arr| arr.first()) else {
            // A blocked prompt is a valid, empty answer rather than a broken response
            if json["promptFeedback"]["blockReason"].is_string() {
                return Ok(CompletionResponse {
                    content: None,
                    input_tokens: None,
                    output_tokens: None,
                });
            }
            return Err(RelayError::MalformedResponse(
                "no candidates in Gemini response".to_string(),
            ));
        };

        let content = candidate["content"]["parts"].as_array().and_then(|parts| {
            let text: String = parts.iter().filter_map(|p| p["text"].as_str()).collect();
            (!text.is_empty()).then_some(text)
        });

        let usage = &json["usageMetadata"];
        Ok(CompletionResponse {
            content,
            input_tokens: usage["promptTokenCount"].as_u64(),
            output_tokens: usage["candidatesTokenCount"].as_u64(),
        })
    }
}

#[async_trait]
impl CompletionProvider for GeminiProvider {
    async fn complete(&self, req: CompletionRequest) -> RelayResult<CompletionResponse> {
        let payload = Self::build_payload(&req);
        let model_name = req.model.as_deref().unwrap_or(&self.default_model);
        let url = format!("{}/models/{}:generateContent", self.base_url, model_name);

        if let Ok(mut metrics) = self.metrics.lock() {
            metrics.request_count += 1;
        }

        let resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if let Ok(mut m) = self.metrics.lock() {
                    m.error_count += 1;
                }
                RelayError::from(e)
            })?;

        let json = ProviderErrorHandler::check_response(resp, "Gemini", &self.metrics).await?;

        if let Some(tokens) = json["usageMetadata"]["totalTokenCount"].as_u64()
            && let Ok(mut metrics) = self.metrics.lock()
        {
            metrics.token_count += tokens;
        }

        Self::parse_response(&json)
    }

    fn name(&self) -> &str {
        "gemini"
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
