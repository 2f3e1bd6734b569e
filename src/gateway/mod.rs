//! HTTP listener: health, JSON chat API and (when enabled) the Twilio webhook.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::{DefaultBodyLimit, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::bus::{ChannelType, InboundMessage};
use crate::channels::UpstreamStatus;
use crate::relay::RelayPipeline;

/// Max request body for every route: 1 MB.
pub const MAX_BODY_SIZE: usize = 1_048_576;

#[derive(Clone)]
pub struct GatewayState {
    pipeline: Arc<RelayPipeline>,
    discord: UpstreamStatus,
}

impl GatewayState {
    pub fn new(pipeline: Arc<RelayPipeline>, discord: UpstreamStatus) -> Self {
        Self { pipeline, discord }
    }
}

/// Request body for POST /api/chat.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    /// Conversation to continue. A fresh one is started when omitted.
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub chunks: Vec<String>,
    pub session_id: String,
}

/// Build the HTTP router, merging any extra ingress routes (e.g. Twilio).
pub fn build_router(state: GatewayState, extra: Option<Router>) -> Router {
    let mut router = Router::new()
        .route("/api/chat", post(chat_handler))
        .route("/api/health", get(health_handler))
        .with_state(state);

    if let Some(extra) = extra {
        router = router.merge(extra);
    }

    router.layer(DefaultBodyLimit::max(MAX_BODY_SIZE))
}

/// POST /api/chat: relay one message and return the reply chunks.
async fn chat_handler(
    State(state): State<GatewayState>,
    Json(body): Json<ChatRequest>,
) -> impl IntoResponse {
    let session_id = body
        .session_id
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    debug!(
        "HTTP API chat request: session={}, content_len={}",
        session_id,
        body.message.len()
    );

    let msg = InboundMessage::new(ChannelType::Http, "http-api", &session_id, body.message);
    let chunks = state.pipeline.handle_inbound(&msg).await;

    Json(ChatResponse { chunks, session_id })
}

/// GET /api/health: liveness plus upstream and provider status.
async fn health_handler(State(state): State<GatewayState>) -> impl IntoResponse {
    let provider = state.pipeline.provider();
    let metrics = provider.metrics();
    Json(serde_json::json!({
        "status": "ok",
        "version": crate::VERSION,
        "upstream": {
            "discord": state.discord.state().as_str()
        },
        "provider": {
            "name": provider.name(),
            "requests": metrics.request_count,
            "errors": metrics.error_count
        }
    }))
}

/// Bind `host:port` and serve `app` until `shutdown` resolves.
///
/// Returns the bound address (useful with port 0) and the server task.
pub async fn start<F>(
    host: &str,
    port: u16,
    app: Router,
    shutdown: F,
) -> Result<(SocketAddr, tokio::task::JoinHandle<()>)>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind HTTP listener on {}", addr))?;
    let local = listener.local_addr()?;
    info!("HTTP listening on {}", local);

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
        {
            error!("HTTP server error: {}", e);
        }
    });

    Ok((local, handle))
}
