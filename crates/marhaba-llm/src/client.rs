// SPDX-FileCopyrightText: 2026 Marhaba Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OpenAI chat-completions client implementing [`IntentModel`].
//!
//! Classification asks for JSON output and degrades to the fallback intent
//! when the model returns something unparsable, so a flaky model never
//! breaks the pipeline.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use marhaba_core::error::MarhabaError;
use marhaba_core::traits::IntentModel;
use marhaba_core::types::{HistoryTurn, Intent, IntentClassification, Language, Priority};
use reqwest::header::{HeaderMap, HeaderValue};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, warn};

const CLASSIFY_SYSTEM_PROMPT: &str = r#"You are an AI assistant for a Dubai luxury real estate brokerage.

Classify the customer's intent:
- property_inquiry: looking for properties
- schedule_viewing: wants to see a property
- create_ticket: reporting a technical issue
- check_status: asking about a support ticket
- update_ticket: adding to an existing ticket
- close_ticket: closing a resolved ticket
- general_inquiry: greetings, anything else

Respond with JSON only:
{"intent": "...", "confidence": 0.0-1.0, "entities": {"ticket_key": "SUP-123 or null", "priority": "High/Medium/Low or null", "keywords": ["..."]}}"#;

/// OpenAI-compatible chat completions client.
#[derive(Debug, Clone)]
pub struct OpenAiModel {
    client: reqwest::Client,
    base_url: String,
    model: String,
    max_retries: u32,
}

impl OpenAiModel {
    pub fn new(
        base_url: &str,
        api_key: &str,
        model: &str,
        timeout: Duration,
        max_retries: u32,
    ) -> Result<Self, MarhabaError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "authorization",
            HeaderValue::from_str(&format!("Bearer {api_key}"))
                .map_err(|e| MarhabaError::Config(format!("invalid model API key: {e}")))?,
        );
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| MarhabaError::Model {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            max_retries,
        })
    }

    /// Overrides the base URL (for testing with wiremock).
    #[cfg(test)]
    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    /// One chat-completions call, returning the first choice's content.
    async fn complete(&self, messages: Value, json_mode: bool) -> Result<String, MarhabaError> {
        let url = format!("{}/chat/completions", self.base_url);
        let mut payload = json!({
            "model": self.model,
            "messages": messages,
            "temperature": 0.2,
        });
        if json_mode {
            payload["response_format"] = json!({ "type": "json_object" });
        }

        let mut last_error = None;
        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, "retrying model request after transient error");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }

            let response = self
                .client
                .post(&url)
                .json(&payload)
                .send()
                .await
                .map_err(|e| MarhabaError::Model {
                    message: format!("model request failed: {e}"),
                    source: Some(Box::new(e)),
                })?;

            let status = response.status();
            debug!(status = %status, attempt, "model response received");

            if status.is_success() {
                let body: ChatResponse =
                    response.json().await.map_err(|e| MarhabaError::Model {
                        message: format!("failed to parse model response: {e}"),
                        source: Some(Box::new(e)),
                    })?;
                return body
                    .choices
                    .into_iter()
                    .next()
                    .map(|c| c.message.content)
                    .ok_or_else(|| MarhabaError::Model {
                        message: "model returned no choices".into(),
                        source: None,
                    });
            }

            let transient = matches!(status.as_u16(), 429 | 500 | 502 | 503);
            let text = response.text().await.unwrap_or_default();
            if transient && attempt < self.max_retries {
                last_error = Some(MarhabaError::Model {
                    message: format!("model API returned {status}: {text}"),
                    source: None,
                });
                continue;
            }
            return Err(MarhabaError::Model {
                message: format!("model API returned {status}: {text}"),
                source: None,
            });
        }

        Err(last_error.unwrap_or_else(|| MarhabaError::Model {
            message: "model request failed after retries".into(),
            source: None,
        }))
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: String,
}

/// Parse the classification JSON, degrading to the fallback on any shape
/// the model gets wrong.
fn parse_classification(raw: &str) -> IntentClassification {
    let Ok(value) = serde_json::from_str::<Value>(raw) else {
        warn!("model returned non-JSON classification, using fallback");
        return IntentClassification::fallback();
    };

    let intent = value["intent"]
        .as_str()
        .and_then(|s| Intent::from_str(s).ok())
        .unwrap_or(Intent::GeneralInquiry);
    let confidence = value["confidence"].as_f64().unwrap_or(0.0) as f32;

    let entities = value["entities"]
        .as_object()
        .map(|obj| {
            obj.iter()
                .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                .collect()
        })
        .unwrap_or_default();

    let ticket_key = value
        .pointer("/entities/ticket_key")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty() && *s != "null")
        .map(str::to_string);

    let priority = value
        .pointer("/entities/priority")
        .and_then(Value::as_str)
        .and_then(|s| match s.to_lowercase().as_str() {
            "lowest" => Some(Priority::Lowest),
            "low" => Some(Priority::Low),
            "medium" => Some(Priority::Medium),
            "high" => Some(Priority::High),
            "highest" | "critical" | "urgent" => Some(Priority::Highest),
            _ => None,
        });

    IntentClassification {
        intent,
        confidence,
        entities,
        ticket_key,
        priority,
    }
}

#[async_trait]
impl IntentModel for OpenAiModel {
    async fn classify_intent(
        &self,
        message: &str,
        history: &[HistoryTurn],
    ) -> Result<IntentClassification, MarhabaError> {
        let mut history_text = String::new();
        if !history.is_empty() {
            history_text.push_str("Recent conversation:\n");
            for turn in history {
                let content: String = turn.content.chars().take(100).collect();
                history_text.push_str(&format!("- {}: {content}\n", turn.role));
            }
        }

        let messages = json!([
            { "role": "system", "content": CLASSIFY_SYSTEM_PROMPT },
            { "role": "user", "content": format!("Message: \"{message}\"\n\n{history_text}\nClassify intent (JSON only):") },
        ]);

        let raw = self.complete(messages, true).await?;
        Ok(parse_classification(&raw))
    }

    async fn translate(&self, text: &str, target: Language) -> Result<String, MarhabaError> {
        let target_name = match target {
            Language::English => "English",
            Language::Arabic => "Arabic",
            Language::Mixed => "English",
        };
        let messages = json!([
            {
                "role": "system",
                "content": format!(
                    "You are a professional translator for a Dubai real estate brokerage. \
                     Translate the user's message to {target_name}. \
                     Keep names, ticket keys, and numbers unchanged. Respond with the translation only."
                )
            },
            { "role": "user", "content": text },
        ]);
        let translated = self.complete(messages, false).await?;
        Ok(translated.trim().to_string())
    }

    async fn ticket_summary(
        &self,
        message: &str,
        reporter: &str,
        team: &str,
    ) -> Result<String, MarhabaError> {
        let messages = json!([
            {
                "role": "system",
                "content": "Write a one-line support ticket summary (max 80 characters) for the \
                            issue described. No quotes, no trailing period."
            },
            {
                "role": "user",
                "content": format!("Reporter: {reporter}\nTeam: {team}\nIssue: {message}")
            },
        ]);
        let summary = self.complete(messages, false).await?;
        Ok(summary.trim().trim_matches('"').to_string())
    }

    async fn ticket_description(
        &self,
        message: &str,
        reporter: &str,
    ) -> Result<String, MarhabaError> {
        let messages = json!([
            {
                "role": "system",
                "content": "Write a concise support ticket description from the customer's \
                            message. Include what is broken and any business impact mentioned. \
                            Plain text, no markdown headers."
            },
            {
                "role": "user",
                "content": format!("Reported via WhatsApp by {reporter}:\n{message}")
            },
        ]);
        let description = self.complete(messages, false).await?;
        Ok(description.trim().to_string())
    }
}
