use super::*;
use crate::providers::base::{CompletionProvider, CompletionRequest, CompletionResponse};
use crate::relay::RelayConfig;
use crate::session::SessionManager;
use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use tower::ServiceExt;

struct FixedProvider(RelayResult<String>);

#[async_trait]
impl CompletionProvider for FixedProvider {
    async fn complete(&self, _req: CompletionRequest) -> RelayResult<CompletionResponse> {
        match &self.0 {
            Ok(text) => Ok(CompletionResponse::text(text.clone())),
            Err(_) => Err(RelayError::Provider {
                message: "boom".to_string(),
                retryable: false,
            }),
        }
    }

    fn name(&self) -> &str {
        "fixed"
    }

    fn default_model(&self) -> &str {
        "fixed"
    }
}

fn app(reply: RelayResult<String>) -> Router {
    let pipeline = Arc::new(RelayPipeline::new(
        Arc::new(FixedProvider(reply)),
        Arc::new(SessionManager::default()),
        RelayConfig::default(),
    ));
    router("/twilio/webhook", pipeline)
}

async fn post_form(app: Router, body: &str) -> (StatusCode, String, String) {
    let req = Request::builder()
        .method("POST")
        .uri("/twilio/webhook")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let content_type = resp
        .headers()
        .get("content-type")
        .map(|v| v.to_str().unwrap().to_string())
        .unwrap_or_default();
    let bytes = axum::body::to_bytes(resp.into_body(), 1 << 20).await.unwrap();
    (status, content_type, String::from_utf8(bytes.to_vec()).unwrap())
}

#[test]
fn test_parse_sms_webhook() {
    let msg = parse_webhook("From=%2B15551234567&To=%2B15557654321&Body=Hello+there").unwrap();
    assert_eq!(msg.sender_id, "+15551234567");
    assert_eq!(msg.chat_id, "+15551234567");
    assert_eq!(msg.content, "Hello there");
    assert!(!msg.is_group);
    assert_eq!(msg.metadata["to"], "+15557654321");
}

#[test]
fn test_parse_conversation_webhook_is_group() {
    let msg = parse_webhook("Author=alice&ConversationSid=CH123&Body=hi").unwrap();
    assert_eq!(msg.sender_id, "alice");
    assert_eq!(msg.chat_id, "CH123");
    assert!(msg.is_group);
    assert_eq!(msg.conversation_key().as_str(), "twilio:CH123");
}

#[test]
fn test_parse_webhook_without_sender() {
    assert!(matches!(parse_webhook("Body=hi"), Err(RelayError::Input(_))));
    assert!(parse_webhook("From=&Body=hi").is_err());
}

#[test]
fn test_render_twiml_escapes_markup() {
    let twiml = render_twiml(&["a < b & c".to_string(), "<script>".to_string()]);
    assert!(twiml.starts_with(XML_DECLARATION));
    assert!(twiml.contains("<Message>a &lt; b &amp; c</Message>"));
    assert!(twiml.contains("<Message>&lt;script&gt;</Message>"));
    assert_eq!(twiml.matches("<Message>").count(), 2);
}

#[test]
fn test_render_empty_twiml() {
    let twiml = render_twiml(&[]);
    assert!(twiml.ends_with("<Response></Response>"));
    assert!(!twiml.contains("<Message>"));
}

#[tokio::test]
async fn test_webhook_replies_with_twiml() {
    let (status, content_type, body) =
        post_form(app(Ok("hi back".to_string())), "From=%2B1555&Body=hello").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type, "text/xml");
    assert!(body.contains("<Message>hi back</Message>"));
}

#[tokio::test]
async fn test_webhook_provider_failure_still_200() {
    let (status, _, body) =
        post_form(app(Err(RelayError::Input(String::new()))), "From=%2B1555&Body=hello").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("(upstream error)"));
    assert_eq!(body.matches("<Message>").count(), 1);
}

#[tokio::test]
async fn test_webhook_long_reply_split_into_messages() {
    let long = "x".repeat(3500);
    let (_, _, body) = post_form(app(Ok(long)), "From=%2B1555&Body=hello").await;
    assert_eq!(body.matches("<Message>").count(), 3);
}

#[tokio::test]
async fn test_webhook_inactive_group_gets_empty_response() {
    let (status, _, body) = post_form(
        app(Ok("unused".to_string())),
        "Author=bob&ConversationSid=CH9&Body=hello",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.ends_with("<Response></Response>"));
}

#[tokio::test]
async fn test_webhook_malformed_body_still_200() {
    let (status, _, body) = post_form(app(Ok("x".to_string())), "garbage").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.ends_with("<Response></Response>"));
}
