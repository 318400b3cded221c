// SPDX-FileCopyrightText: 2026 Marhaba Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Jira Cloud REST API (v2).
//!
//! Provides [`JiraClient`] which handles request construction, basic-auth
//! headers, and transient error retry, and implements [`TicketClient`] for
//! the pipeline.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use marhaba_core::error::MarhabaError;
use marhaba_core::traits::TicketClient;
use marhaba_core::types::{Priority, TicketReceipt, TicketRequest, TicketStatus, TicketSummary};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Method, StatusCode};
use serde_json::{Value, json};
use tracing::{debug, info, warn};

/// HTTP client for Jira Cloud communication.
///
/// Manages authentication headers, connection pooling, and retry logic
/// for transient errors (429, 500, 502, 503).
#[derive(Debug, Clone)]
pub struct JiraClient {
    client: reqwest::Client,
    base_url: String,
    max_retries: u32,
}

impl JiraClient {
    /// Creates a new Jira API client with basic auth.
    pub fn new(
        base_url: &str,
        email: &str,
        api_token: &str,
        timeout: Duration,
        max_retries: u32,
    ) -> Result<Self, MarhabaError> {
        let credentials = BASE64.encode(format!("{email}:{api_token}"));
        let mut headers = HeaderMap::new();
        headers.insert(
            "authorization",
            HeaderValue::from_str(&format!("Basic {credentials}")).map_err(|e| {
                MarhabaError::Config(format!("invalid Jira credentials header: {e}"))
            })?,
        );
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| MarhabaError::Tracker {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_retries,
        })
    }

    /// Overrides the base URL (for testing with wiremock).
    #[cfg(test)]
    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    /// Sends a request, retrying transient failures with a 1-second delay.
    async fn request(
        &self,
        method: Method,
        path: &str,
        query: Option<&[(&str, &str)]>,
        body: Option<&Value>,
    ) -> Result<Option<Value>, MarhabaError> {
        let url = format!("{}{path}", self.base_url);
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, path, "retrying Jira request after transient error");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }

            let mut req = self.client.request(method.clone(), &url);
            if let Some(query) = query {
                req = req.query(query);
            }
            if let Some(body) = body {
                req = req.json(body);
            }

            let response = req.send().await.map_err(|e| MarhabaError::Tracker {
                message: format!("Jira request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

            let status = response.status();
            debug!(status = %status, path, attempt, "Jira response received");

            if status.is_success() {
                if status == StatusCode::NO_CONTENT {
                    return Ok(None);
                }
                let text = response.text().await.map_err(|e| MarhabaError::Tracker {
                    message: format!("failed to read Jira response body: {e}"),
                    source: Some(Box::new(e)),
                })?;
                if text.is_empty() {
                    return Ok(None);
                }
                let value =
                    serde_json::from_str(&text).map_err(|e| MarhabaError::Tracker {
                        message: format!("failed to parse Jira response: {e}"),
                        source: Some(Box::new(e)),
                    })?;
                return Ok(Some(value));
            }

            let transient = matches!(status.as_u16(), 429 | 500 | 502 | 503);
            let text = response.text().await.unwrap_or_default();
            if transient && attempt < self.max_retries {
                warn!(status = %status, body = %text, "transient Jira error, will retry");
                last_error = Some(MarhabaError::Tracker {
                    message: format!("Jira returned {status}: {text}"),
                    source: None,
                });
                continue;
            }

            return Err(MarhabaError::Tracker {
                message: format!("Jira returned {status}: {text}"),
                source: None,
            });
        }

        Err(last_error.unwrap_or_else(|| MarhabaError::Tracker {
            message: "Jira request failed after retries".into(),
            source: None,
        }))
    }

    /// Resolves the transition id whose target matches a done-like status.
    async fn find_close_transition(&self, key: &str) -> Result<Option<String>, MarhabaError> {
        let path = format!("/rest/api/2/issue/{key}/transitions");
        let body = self
            .request(Method::GET, &path, None, None)
            .await?
            .unwrap_or_default();
        let transitions = body["transitions"].as_array().cloned().unwrap_or_default();
        for t in transitions {
            let name = t["name"].as_str().unwrap_or_default().to_lowercase();
            if matches!(name.as_str(), "done" | "close" | "closed" | "resolve" | "resolved") {
                return Ok(t["id"].as_str().map(str::to_string));
            }
        }
        Ok(None)
    }

    pub fn browse_url(&self, key: &str) -> String {
        format!("{}/browse/{key}", self.base_url)
    }
}

fn field_str(value: &Value, pointer: &str) -> Option<String> {
    value.pointer(pointer).and_then(Value::as_str).map(str::to_string)
}

#[async_trait]
impl TicketClient for JiraClient {
    async fn create(&self, request: &TicketRequest) -> Result<TicketReceipt, MarhabaError> {
        let payload = json!({
            "fields": {
                "project": { "key": request.project_key },
                "summary": request.summary,
                "description": request.description,
                "issuetype": { "name": "Task" },
                "priority": { "name": request.priority.to_string() },
            }
        });

        let body = self
            .request(Method::POST, "/rest/api/2/issue", None, Some(&payload))
            .await?
            .ok_or_else(|| MarhabaError::Tracker {
                message: "Jira create returned an empty body".into(),
                source: None,
            })?;

        let key = field_str(&body, "/key").ok_or_else(|| MarhabaError::Tracker {
            message: format!("Jira create response missing issue key: {body}"),
            source: None,
        })?;

        info!(key = %key, summary = %request.summary, "Jira ticket created");
        Ok(TicketReceipt {
            key,
            summary: request.summary.clone(),
        })
    }

    async fn update(
        &self,
        key: &str,
        comment: Option<&str>,
        priority: Option<Priority>,
    ) -> Result<(), MarhabaError> {
        if let Some(priority) = priority {
            let payload = json!({
                "fields": { "priority": { "name": priority.to_string() } }
            });
            let path = format!("/rest/api/2/issue/{key}");
            self.request(Method::PUT, &path, None, Some(&payload)).await?;
        }
        if let Some(comment) = comment {
            let payload = json!({ "body": comment });
            let path = format!("/rest/api/2/issue/{key}/comment");
            self.request(Method::POST, &path, None, Some(&payload)).await?;
        }
        info!(key = %key, "Jira ticket updated");
        Ok(())
    }

    async fn close(&self, key: &str) -> Result<(), MarhabaError> {
        let transition_id =
            self.find_close_transition(key)
                .await?
                .ok_or_else(|| MarhabaError::Tracker {
                    message: format!("no close transition available for {key}"),
                    source: None,
                })?;
        let payload = json!({ "transition": { "id": transition_id } });
        let path = format!("/rest/api/2/issue/{key}/transitions");
        self.request(Method::POST, &path, None, Some(&payload)).await?;
        info!(key = %key, "Jira ticket closed");
        Ok(())
    }

    async fn status(&self, key: &str) -> Result<TicketStatus, MarhabaError> {
        let path = format!("/rest/api/2/issue/{key}");
        let body = self
            .request(Method::GET, &path, None, None)
            .await?
            .ok_or_else(|| MarhabaError::Tracker {
                message: format!("Jira issue {key} returned an empty body"),
                source: None,
            })?;

        Ok(TicketStatus {
            key: key.to_string(),
            summary: field_str(&body, "/fields/summary").unwrap_or_default(),
            status: field_str(&body, "/fields/status/name").unwrap_or_default(),
            priority: field_str(&body, "/fields/priority/name")
                .unwrap_or_else(|| "None".to_string()),
            assignee: field_str(&body, "/fields/assignee/displayName")
                .unwrap_or_else(|| "Unassigned".to_string()),
            url: self.browse_url(key),
        })
    }

    async fn search_by_reporter(
        &self,
        phone: &str,
        limit: usize,
    ) -> Result<Vec<TicketSummary>, MarhabaError> {
        // Tickets carry the reporter phone in the description.
        let jql = format!("description ~ \"{phone}\" ORDER BY created DESC");
        let limit = limit.to_string();
        let query = [
            ("jql", jql.as_str()),
            ("maxResults", limit.as_str()),
            ("fields", "summary,status"),
        ];
        let body = self
            .request(Method::GET, "/rest/api/2/search", Some(&query), None)
            .await?
            .unwrap_or_default();

        let issues = body["issues"].as_array().cloned().unwrap_or_default();
        Ok(issues
            .iter()
            .map(|issue| TicketSummary {
                key: field_str(issue, "/key").unwrap_or_default(),
                summary: field_str(issue, "/fields/summary").unwrap_or_default(),
                status: field_str(issue, "/fields/status/name").unwrap_or_default(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> JiraClient {
        JiraClient::new(
            "https://example.atlassian.net",
            "bot@example.com",
            "token",
            Duration::from_secs(5),
            1,
        )
        .unwrap()
        .with_base_url(server.uri())
    }

    #[tokio::test]
    async fn create_sends_fields_and_returns_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/api/2/issue"))
            .and(header_exists("authorization"))
            .and(body_partial_json(json!({
                "fields": {
                    "project": { "key": "SUP" },
                    "summary": "Salesforce sync failing",
                    "priority": { "name": "High" },
                }
            })))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(json!({ "key": "SUP-101" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let receipt = client(&server)
            .create(&TicketRequest {
                summary: "Salesforce sync failing".into(),
                description: "Reported via WhatsApp by +97150".into(),
                project_key: "SUP".into(),
                priority: Priority::High,
            })
            .await
            .unwrap();
        assert_eq!(receipt.key, "SUP-101");
    }

    #[tokio::test]
    async fn create_retries_transient_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/api/2/issue"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/rest/api/2/issue"))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(json!({ "key": "SUP-102" })),
            )
            .mount(&server)
            .await;

        let receipt = client(&server)
            .create(&TicketRequest {
                summary: "retry me".into(),
                description: "d".into(),
                project_key: "SUP".into(),
                priority: Priority::Medium,
            })
            .await
            .unwrap();
        assert_eq!(receipt.key, "SUP-102");
    }

    #[tokio::test]
    async fn auth_failure_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/api/2/issue"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;

        let err = client(&server)
            .create(&TicketRequest {
                summary: "s".into(),
                description: "d".into(),
                project_key: "SUP".into(),
                priority: Priority::Medium,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, MarhabaError::Tracker { .. }));
    }

    #[tokio::test]
    async fn status_maps_fields() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/api/2/issue/SUP-7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "key": "SUP-7",
                "fields": {
                    "summary": "Dashboard broken",
                    "status": { "name": "In Progress" },
                    "priority": { "name": "High" },
                    "assignee": { "displayName": "Layla" },
                }
            })))
            .mount(&server)
            .await;

        let status = client(&server).status("SUP-7").await.unwrap();
        assert_eq!(status.summary, "Dashboard broken");
        assert_eq!(status.status, "In Progress");
        assert_eq!(status.assignee, "Layla");
        assert!(status.url.ends_with("/browse/SUP-7"));
    }

    #[tokio::test]
    async fn status_defaults_missing_assignee() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/api/2/issue/SUP-8"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "key": "SUP-8",
                "fields": { "summary": "s", "status": { "name": "To Do" } }
            })))
            .mount(&server)
            .await;

        let status = client(&server).status("SUP-8").await.unwrap();
        assert_eq!(status.assignee, "Unassigned");
        assert_eq!(status.priority, "None");
    }

    #[tokio::test]
    async fn close_uses_done_transition() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/api/2/issue/SUP-9/transitions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "transitions": [
                    { "id": "11", "name": "In Progress" },
                    { "id": "31", "name": "Done" },
                ]
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/rest/api/2/issue/SUP-9/transitions"))
            .and(body_partial_json(json!({ "transition": { "id": "31" } })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        client(&server).close("SUP-9").await.unwrap();
    }

    #[tokio::test]
    async fn update_sends_priority_and_comment() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/rest/api/2/issue/SUP-10"))
            .and(body_partial_json(json!({
                "fields": { "priority": { "name": "Highest" } }
            })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/rest/api/2/issue/SUP-10/comment"))
            .and(body_partial_json(json!({ "body": "user follow-up" })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": "1" })))
            .expect(1)
            .mount(&server)
            .await;

        client(&server)
            .update("SUP-10", Some("user follow-up"), Some(Priority::Highest))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn search_returns_summaries() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/api/2/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "issues": [
                    { "key": "SUP-5", "fields": { "summary": "a", "status": { "name": "Done" } } },
                    { "key": "SUP-6", "fields": { "summary": "b", "status": { "name": "To Do" } } },
                ]
            })))
            .mount(&server)
            .await;

        let results = client(&server)
            .search_by_reporter("+971500000001", 5)
            .await
            .unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].key, "SUP-5");
        assert_eq!(results[1].status, "To Do");
    }
}
