// SPDX-FileCopyrightText: 2026 Marhaba Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound WhatsApp messages through the Gallabox API.

use std::time::Duration;

use async_trait::async_trait;
use marhaba_core::error::MarhabaError;
use marhaba_core::traits::MessagingClient;
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::json;
use tracing::{debug, info, warn};

/// Sends WhatsApp text messages via Gallabox.
///
/// Retries transient failures (429, 500, 502, 503) once after a short delay.
#[derive(Debug, Clone)]
pub struct GallaboxSender {
    client: reqwest::Client,
    base_url: String,
    channel_id: String,
    max_retries: u32,
}

impl GallaboxSender {
    pub fn new(
        base_url: &str,
        api_key: &str,
        api_secret: &str,
        channel_id: &str,
        timeout: Duration,
        max_retries: u32,
    ) -> Result<Self, MarhabaError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "apiKey",
            HeaderValue::from_str(api_key)
                .map_err(|e| MarhabaError::Config(format!("invalid Gallabox api key: {e}")))?,
        );
        headers.insert(
            "apiSecret",
            HeaderValue::from_str(api_secret)
                .map_err(|e| MarhabaError::Config(format!("invalid Gallabox api secret: {e}")))?,
        );
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| MarhabaError::Channel {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            channel_id: channel_id.to_string(),
            max_retries,
        })
    }

    /// Overrides the base URL (for testing with wiremock).
    #[cfg(test)]
    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl MessagingClient for GallaboxSender {
    fn name(&self) -> &str {
        "whatsapp"
    }

    async fn send_text(&self, to: &str, body: &str) -> Result<(), MarhabaError> {
        let url = format!("{}/devapi/messages/whatsapp", self.base_url);
        let payload = json!({
            "channelId": self.channel_id,
            "channelType": "whatsapp",
            "recipient": { "name": "User", "phone": to },
            "whatsapp": {
                "type": "text",
                "text": { "body": body, "previewUrl": true }
            }
        });

        let mut last_error = None;
        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, to, "retrying WhatsApp send after transient error");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }

            let response = self
                .client
                .post(&url)
                .json(&payload)
                .send()
                .await
                .map_err(|e| MarhabaError::Channel {
                    message: format!("WhatsApp send failed: {e}"),
                    source: Some(Box::new(e)),
                })?;

            let status = response.status();
            debug!(status = %status, to, attempt, "WhatsApp send response");

            if status.is_success() {
                info!(to, chars = body.chars().count(), "WhatsApp message sent");
                return Ok(());
            }

            let transient = matches!(status.as_u16(), 429 | 500 | 502 | 503);
            let text = response.text().await.unwrap_or_default();
            if transient && attempt < self.max_retries {
                last_error = Some(MarhabaError::Channel {
                    message: format!("Gallabox returned {status}: {text}"),
                    source: None,
                });
                continue;
            }
            return Err(MarhabaError::Channel {
                message: format!("Gallabox returned {status}: {text}"),
                source: None,
            });
        }

        Err(last_error.unwrap_or_else(|| MarhabaError::Channel {
            message: "WhatsApp send failed after retries".into(),
            source: None,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sender(server: &MockServer) -> GallaboxSender {
        GallaboxSender::new(
            "https://api.gallabox.com",
            "key",
            "secret",
            "channel-1",
            Duration::from_secs(5),
            1,
        )
        .unwrap()
        .with_base_url(server.uri())
    }

    #[tokio::test]
    async fn send_text_posts_payload_with_auth_headers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/devapi/messages/whatsapp"))
            .and(header("apiKey", "key"))
            .and(header("apiSecret", "secret"))
            .and(body_partial_json(json!({
                "channelId": "channel-1",
                "recipient": { "phone": "+971500000001" },
                "whatsapp": { "text": { "body": "hello" } }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "ok" })))
            .expect(1)
            .mount(&server)
            .await;

        sender(&server).send_text("+971500000001", "hello").await.unwrap();
    }

    #[tokio::test]
    async fn send_text_retries_on_transient_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/devapi/messages/whatsapp"))
            .respond_with(ResponseTemplate::new(429))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/devapi/messages/whatsapp"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "ok" })))
            .mount(&server)
            .await;

        sender(&server).send_text("+971500000001", "retry me").await.unwrap();
    }

    #[tokio::test]
    async fn send_text_fails_on_client_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/devapi/messages/whatsapp"))
            .respond_with(ResponseTemplate::new(403))
            .expect(1)
            .mount(&server)
            .await;

        let err = sender(&server).send_text("+971500000001", "x").await.unwrap_err();
        assert!(matches!(err, MarhabaError::Channel { .. }));
    }
}
