//! Twilio SMS/WhatsApp webhook ingress. Replies are returned inline as TwiML.

use crate::bus::{ChannelType, InboundMessage};
use crate::errors::{RelayError, RelayResult};
use crate::relay::RelayPipeline;
use axum::Router;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>";

/// Router serving `POST {webhook_path}`.
pub fn router(webhook_path: &str, pipeline: Arc<RelayPipeline>) -> Router {
    Router::new()
        .route(webhook_path, post(webhook_handler))
        .with_state(pipeline)
}

/// Build an inbound message from a form-encoded webhook body.
///
/// Conversations API posts carry `ConversationSid`, which may be a group, and
/// the conversation is keyed on it. Plain SMS/WhatsApp posts are keyed on the
/// sender.
pub fn parse_webhook(body: &str) -> RelayResult<InboundMessage> {
    let params: HashMap<String, String> = form_urlencoded::parse(body.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let sender = params
        .get("From")
        .or_else(|| params.get("Author"))
        .filter(|s| !s.is_empty())
        .ok_or_else(|| RelayError::Input("webhook has no From or Author field".to_string()))?;
    let text = params.get("Body").map_or("", String::as_str);
    let conversation = params.get("ConversationSid").filter(|s| !s.is_empty());
    let chat_id = conversation.unwrap_or(sender);

    let mut msg = InboundMessage::new(ChannelType::Twilio, sender, chat_id, text)
        .in_group(conversation.is_some());
    if let Some(to) = params.get("To") {
        msg.metadata
            .insert("to".to_string(), serde_json::Value::String(to.clone()));
    }
    Ok(msg)
}

/// Render chunks as a TwiML document with one `<Message>` per chunk.
pub fn render_twiml(chunks: &[String]) -> String {
    let mut twiml = String::from(XML_DECLARATION);
    twiml.push_str("<Response>");
    for chunk in chunks {
        twiml.push_str("<Message>");
        twiml.push_str(&html_escape::encode_text(chunk));
        twiml.push_str("</Message>");
    }
    twiml.push_str("</Response>");
    twiml
}

fn twiml_response(chunks: &[String]) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/xml")],
        render_twiml(chunks),
    )
        .into_response()
}

async fn webhook_handler(State(pipeline): State<Arc<RelayPipeline>>, body: String) -> Response {
    let msg = match parse_webhook(&body) {
        Ok(msg) => msg,
        Err(e) => {
            warn!("twilio webhook: {}", e);
            return twiml_response(&[]);
        }
    };
    debug!(
        "twilio webhook: from={}, body_len={}, group={}",
        msg.sender_id,
        msg.content.len(),
        msg.is_group
    );

    let chunks = pipeline.handle_inbound(&msg).await;
    twiml_response(&chunks)
}

#[cfg(test)]
mod tests;
