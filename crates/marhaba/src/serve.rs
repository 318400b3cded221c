// SPDX-FileCopyrightText: 2026 Marhaba Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `marhaba serve` command implementation.
//!
//! Wires the webhook server to the message pipeline: inbound WhatsApp events
//! flow through an mpsc channel into per-message processing tasks, with the
//! Jira tracker and the intent model as outbound collaborators.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::Duration;
use marhaba_classify::VipDetector;
use marhaba_config::MarhabaConfig;
use marhaba_core::error::MarhabaError;
use marhaba_jira::JiraClient;
use marhaba_llm::OpenAiModel;
use marhaba_pipeline::{MessagePipeline, PipelineSettings, Templates};
use marhaba_session::{PendingDraftStore, SessionStore};
use marhaba_whatsapp::{GallaboxSender, WebhookState};
use tokio::sync::mpsc;
use tracing::{error, info};

/// Inbound messages buffered between the webhook and the pipeline.
const INBOUND_QUEUE_DEPTH: usize = 256;

/// Runs the `marhaba serve` command.
///
/// Starts the webhook server and drains inbound messages until the process
/// receives a shutdown signal.
pub async fn run_serve(config: MarhabaConfig) -> Result<(), MarhabaError> {
    init_tracing(&config.agent.log_level);

    info!(agent = %config.agent.name, "starting marhaba serve");

    let sessions = Arc::new(SessionStore::new(
        Duration::minutes(config.pipeline.session_timeout_minutes as i64),
        config.pipeline.max_history,
        config.pipeline.max_sessions,
        Duration::seconds(config.pipeline.sweep_interval_secs as i64),
    ));
    let drafts = Arc::new(PendingDraftStore::new(Duration::minutes(
        config.pipeline.confirmation_window_minutes as i64,
    )));

    let tickets = Arc::new(JiraClient::new(
        &require(&config.jira.base_url, "jira.base_url")?,
        &require(&config.jira.email, "jira.email")?,
        &require(&config.jira.api_token, "jira.api_token")?,
        StdDuration::from_secs(config.jira.request_timeout_secs),
        config.jira.max_retries,
    )?);

    let messaging = Arc::new(GallaboxSender::new(
        &require(&config.whatsapp.api_base, "whatsapp.api_base")?,
        &require(&config.whatsapp.api_key, "whatsapp.api_key")?,
        &require(&config.whatsapp.api_secret, "whatsapp.api_secret")?,
        &require(&config.whatsapp.channel_id, "whatsapp.channel_id")?,
        StdDuration::from_secs(config.whatsapp.request_timeout_secs),
        config.whatsapp.max_retries,
    )?);

    let model = Arc::new(OpenAiModel::new(
        &config.llm.base_url,
        &require(&config.llm.api_key, "llm.api_key")?,
        &config.llm.model,
        StdDuration::from_secs(config.llm.request_timeout_secs),
        config.llm.max_retries,
    )?);

    let settings = PipelineSettings {
        project_key: config.jira.project_key.clone(),
        intent_confidence_threshold: config.pipeline.intent_confidence_threshold,
        history_context_turns: config.pipeline.history_context_turns,
        frustration_window: Duration::minutes(config.pipeline.frustration_window_minutes as i64),
    };

    let pipeline = Arc::new(MessagePipeline::new(
        sessions,
        drafts,
        tickets,
        messaging,
        model,
        Arc::new(VipDetector::new()),
        Templates::new(&config.business.email, &config.business.website),
        settings,
    ));

    let (inbound_tx, mut inbound_rx) = mpsc::channel(INBOUND_QUEUE_DEPTH);
    let state = WebhookState::new(
        inbound_tx,
        config.whatsapp.webhook_secret.clone(),
        Duration::seconds(config.whatsapp.dedup_window_secs as i64),
    );

    let host = config.whatsapp.webhook_host.clone();
    let port = config.whatsapp.webhook_port;
    let mut server = tokio::spawn(async move {
        marhaba_whatsapp::serve(&host, port, state).await
    });

    loop {
        tokio::select! {
            maybe_message = inbound_rx.recv() => {
                let Some(message) = maybe_message else {
                    info!("inbound channel closed, stopping");
                    break;
                };
                let pipeline = Arc::clone(&pipeline);
                tokio::spawn(async move {
                    pipeline.process(&message).await;
                });
            }
            result = &mut server => {
                match result {
                    Ok(Ok(())) => info!("webhook server stopped"),
                    Ok(Err(e)) => {
                        error!(error = %e, "webhook server failed");
                        return Err(e);
                    }
                    Err(e) => {
                        error!(error = %e, "webhook server task panicked");
                        return Err(MarhabaError::Internal(format!(
                            "webhook server task failed: {e}"
                        )));
                    }
                }
                break;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown signal received");
                server.abort();
                break;
            }
        }
    }

    info!("marhaba serve stopped");
    Ok(())
}

fn require(value: &Option<String>, key: &str) -> Result<String, MarhabaError> {
    value
        .clone()
        .ok_or_else(|| MarhabaError::Config(format!("{key} is required to serve")))
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("marhaba={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
