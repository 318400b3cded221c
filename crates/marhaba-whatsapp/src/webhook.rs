// SPDX-FileCopyrightText: 2026 Marhaba Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inbound Gallabox webhook server.
//!
//! Accepts `message:in:new` events, verifies the HMAC-SHA256 signature when
//! a secret is configured, deduplicates by message id inside a rolling
//! window, and forwards normalized messages to the pipeline channel.

use std::sync::Arc;

use axum::Router;
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use hmac::{Hmac, Mac};
use marhaba_core::error::MarhabaError;
use marhaba_core::types::InboundMessage;
use serde::Deserialize;
use serde_json::json;
use sha2::Sha256;
use tokio::sync::mpsc;
use tower_http::cors::CorsLayer;
use tracing::{debug, info, warn};

type HmacSha256 = Hmac<Sha256>;

/// Shared state for webhook handlers.
#[derive(Clone)]
pub struct WebhookState {
    /// Normalized inbound messages flow to the pipeline through here.
    pub inbound_tx: mpsc::Sender<InboundMessage>,
    /// Signature secret; verification is skipped when unset.
    pub secret: Option<String>,
    /// Seen message ids with their arrival time.
    pub dedup: Arc<DashMap<String, DateTime<Utc>>>,
    /// How long a message id stays deduplicated.
    pub dedup_window: Duration,
}

impl WebhookState {
    pub fn new(
        inbound_tx: mpsc::Sender<InboundMessage>,
        secret: Option<String>,
        dedup_window: Duration,
    ) -> Self {
        Self {
            inbound_tx,
            secret,
            dedup: Arc::new(DashMap::new()),
            dedup_window,
        }
    }

    /// True when this id was already seen inside the window. Records the id
    /// and prunes stale entries as a side effect.
    fn is_duplicate(&self, message_id: &str) -> bool {
        let now = Utc::now();
        let cutoff = now - self.dedup_window;
        self.dedup.retain(|_, seen| *seen > cutoff);
        self.dedup.insert(message_id.to_string(), now).is_some()
    }
}

#[derive(Debug, Deserialize)]
struct WebhookEvent {
    #[serde(default)]
    event: String,
    #[serde(default)]
    data: Option<MessageData>,
}

#[derive(Debug, Deserialize)]
struct MessageData {
    #[serde(default)]
    from: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(rename = "type", default)]
    message_type: String,
    #[serde(default)]
    text: Option<TextBody>,
    #[serde(rename = "messageId", default)]
    message_id: String,
}

#[derive(Debug, Deserialize)]
struct TextBody {
    #[serde(default)]
    body: String,
}

/// Build the webhook router.
pub fn router(state: WebhookState) -> Router {
    Router::new()
        .route("/webhook/gallabox", post(receive_event).get(verify_endpoint))
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind and serve the webhook until the process stops.
pub async fn serve(host: &str, port: u16, state: WebhookState) -> Result<(), MarhabaError> {
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| MarhabaError::Channel {
            message: format!("failed to bind webhook to {addr}: {e}"),
            source: Some(Box::new(e)),
        })?;
    info!("webhook server listening on {addr}");
    axum::serve(listener, router(state))
        .await
        .map_err(|e| MarhabaError::Channel {
            message: format!("webhook server error: {e}"),
            source: Some(Box::new(e)),
        })
}

async fn health() -> Response {
    axum::Json(json!({ "status": "ok" })).into_response()
}

#[derive(Debug, Deserialize)]
struct VerifyParams {
    #[serde(rename = "hub.challenge", default)]
    challenge: Option<String>,
}

/// Challenge echo used by channel providers to confirm the endpoint.
async fn verify_endpoint(Query(params): Query<VerifyParams>) -> Response {
    match params.challenge {
        Some(challenge) => challenge.into_response(),
        None => axum::Json(json!({ "status": "ok", "message": "webhook endpoint active" }))
            .into_response(),
    }
}

async fn receive_event(
    State(state): State<WebhookState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if let Some(secret) = &state.secret {
        let signature = headers
            .get("x-gallabox-signature")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        if !verify_signature(secret, &body, signature) {
            warn!("webhook signature verification failed");
            return (StatusCode::UNAUTHORIZED, "invalid signature").into_response();
        }
    }

    let event: WebhookEvent = match serde_json::from_slice(&body) {
        Ok(event) => event,
        Err(e) => {
            warn!(error = %e, "malformed webhook payload");
            return (StatusCode::BAD_REQUEST, "malformed payload").into_response();
        }
    };

    if event.event != "message:in:new" {
        debug!(event = %event.event, "ignoring webhook event");
        return axum::Json(json!({ "status": "ignored" })).into_response();
    }

    let Some(data) = event.data else {
        return axum::Json(json!({ "status": "ignored" })).into_response();
    };
    if data.message_type != "text" {
        debug!(message_type = %data.message_type, "ignoring non-text message");
        return axum::Json(json!({ "status": "ignored" })).into_response();
    }

    let text = data.text.map(|t| t.body).unwrap_or_default();
    if text.is_empty() || data.from.is_empty() {
        return axum::Json(json!({ "status": "ignored" })).into_response();
    }

    if !data.message_id.is_empty() && state.is_duplicate(&data.message_id) {
        info!(message_id = %data.message_id, "duplicate webhook delivery dropped");
        return axum::Json(json!({ "status": "duplicate" })).into_response();
    }

    let message = InboundMessage {
        from: data.from,
        name: data.name.unwrap_or_else(|| "User".to_string()),
        text,
        message_id: data.message_id,
    };

    if state.inbound_tx.send(message).await.is_err() {
        warn!("pipeline channel closed, dropping inbound message");
        return (StatusCode::SERVICE_UNAVAILABLE, "pipeline unavailable").into_response();
    }

    axum::Json(json!({ "status": "received" })).into_response()
}

fn verify_signature(secret: &str, body: &[u8], signature: &str) -> bool {
    let Ok(decoded) = hex::decode(signature) else {
        return false;
    };
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(body);
    mac.verify_slice(&decoded).is_ok()
}
