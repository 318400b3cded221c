// SPDX-FileCopyrightText: 2026 Marhaba Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Intent routing: turns a classified message into exactly one reply
//! and one [`ProcessOutcome`].

use std::sync::Arc;

use marhaba_classify::TeamDetector;
use marhaba_core::error::MarhabaError;
use marhaba_core::traits::{IntentModel, MessagingClient, TicketClient};
use marhaba_core::types::{
    ConversationState, Intent, IntentClassification, Language, MessageRole, Priority,
    ProcessAction, ProcessOutcome, SentimentReport, VipAssessment,
};
use marhaba_session::{PendingDraft, PendingDraftStore, SessionStore};
use regex::Regex;
use tracing::{info, warn};

use crate::templates::{TemplateKey, Templates};

/// How many tickets a key-less status check lists.
const RECENT_TICKETS_LIMIT: usize = 5;

/// Everything routing needs to know about the message being handled.
pub struct RouteContext<'a> {
    pub phone: &'a str,
    pub name: &'a str,
    /// English text used for classification and ticket content.
    pub text: &'a str,
    pub language: Language,
    pub vip: &'a VipAssessment,
    pub sentiment: &'a SentimentReport,
}

pub struct IntentRouter {
    sessions: Arc<SessionStore>,
    drafts: Arc<PendingDraftStore>,
    tickets: Arc<dyn TicketClient>,
    messaging: Arc<dyn MessagingClient>,
    model: Arc<dyn IntentModel>,
    teams: TeamDetector,
    templates: Templates,
    ticket_key_pattern: Regex,
    project_key: String,
}

impl IntentRouter {
    pub fn new(
        sessions: Arc<SessionStore>,
        drafts: Arc<PendingDraftStore>,
        tickets: Arc<dyn TicketClient>,
        messaging: Arc<dyn MessagingClient>,
        model: Arc<dyn IntentModel>,
        templates: Templates,
        project_key: &str,
    ) -> Self {
        Self {
            sessions,
            drafts,
            tickets,
            messaging,
            model,
            teams: TeamDetector::new(),
            templates,
            ticket_key_pattern: Regex::new(r"(?i)\b([A-Z]{2,}-\d+)\b")
                .expect("ticket key pattern is valid"),
            project_key: project_key.to_string(),
        }
    }

    pub async fn route(
        &self,
        ctx: &RouteContext<'_>,
        classification: &IntentClassification,
    ) -> Result<ProcessOutcome, MarhabaError> {
        match classification.intent {
            Intent::CreateTicket => self.create_ticket(ctx, Some(classification)).await,
            Intent::CheckStatus => self.check_status(ctx, classification).await,
            Intent::UpdateTicket => self.update_ticket(ctx, classification).await,
            Intent::CloseTicket => self.close_ticket(ctx, classification).await,
            Intent::PropertyInquiry | Intent::ScheduleViewing => self.property_redirect(ctx).await,
            Intent::GeneralInquiry => self.general_inquiry(ctx).await,
        }
    }

    /// Build a ticket draft, store it, and send the confirmation preview.
    ///
    /// Also the direct entry point for messages the technical-query heuristic
    /// catches without a model round trip.
    pub async fn create_ticket(
        &self,
        ctx: &RouteContext<'_>,
        classification: Option<&IntentClassification>,
    ) -> Result<ProcessOutcome, MarhabaError> {
        let team = self.teams.detect(ctx.text).team;

        let summary = match self.model.ticket_summary(ctx.text, ctx.name, &team).await {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, "summary generation failed, using heuristic summary");
                heuristic_summary(ctx.text, &team)
            }
        };
        let description = match self.model.ticket_description(ctx.text, ctx.name).await {
            Ok(d) => format!("{d}\n\nReporter: {} ({})", ctx.name, ctx.phone),
            Err(e) => {
                warn!(error = %e, "description generation failed, using raw message");
                format!(
                    "Reported via WhatsApp by {} ({}):\n\n{}",
                    ctx.name, ctx.phone, ctx.text
                )
            }
        };

        let priority = self.pick_priority(ctx, classification);
        let draft = PendingDraft::new(
            ctx.phone,
            &summary,
            &description,
            &self.project_key,
            priority,
            &team,
        );

        let preview = self.templates.render(
            TemplateKey::ConfirmTicket,
            ctx.language,
            &[
                ("summary", &draft.summary),
                ("team", &draft.team),
                ("priority", &draft.priority.to_string()),
            ],
        );

        self.drafts.store(draft);
        self.sessions
            .update_state(ctx.phone, ConversationState::SupportTicket);
        self.reply(ctx.phone, &preview).await?;
        info!(phone = %ctx.phone, team = %team, priority = %priority, "ticket draft awaiting confirmation");

        Ok(ProcessOutcome::new(
            Some(Intent::CreateTicket),
            ProcessAction::AwaitingConfirmation,
        ))
    }

    async fn check_status(
        &self,
        ctx: &RouteContext<'_>,
        classification: &IntentClassification,
    ) -> Result<ProcessOutcome, MarhabaError> {
        let Some(key) = self.ticket_key(ctx.text, classification) else {
            return self.list_recent_tickets(ctx).await;
        };

        match self.tickets.status(&key).await {
            Ok(status) => {
                let text = self.templates.render(
                    TemplateKey::TicketStatus,
                    ctx.language,
                    &[
                        ("ticket_key", &status.key),
                        ("summary", &status.summary),
                        ("status", &status.status),
                        ("priority", &status.priority),
                        ("assignee", &status.assignee),
                        ("url", &status.url),
                    ],
                );
                self.reply(ctx.phone, &text).await?;
                Ok(
                    ProcessOutcome::new(Some(Intent::CheckStatus), ProcessAction::StatusSent)
                        .with_ticket_key(status.key),
                )
            }
            Err(e) => self.ticket_failure(ctx, Intent::CheckStatus, e).await,
        }
    }

    async fn list_recent_tickets(
        &self,
        ctx: &RouteContext<'_>,
    ) -> Result<ProcessOutcome, MarhabaError> {
        let recent = match self.tickets.search_by_reporter(ctx.phone, RECENT_TICKETS_LIMIT).await {
            Ok(recent) => recent,
            Err(e) => return self.ticket_failure(ctx, Intent::CheckStatus, e).await,
        };

        if recent.is_empty() {
            let text = self
                .templates
                .render(TemplateKey::RequestTicketKey, ctx.language, &[]);
            self.reply(ctx.phone, &text).await?;
            return Ok(ProcessOutcome::new(
                Some(Intent::CheckStatus),
                ProcessAction::RequestedTicketKey,
            ));
        }

        let lines: Vec<String> = recent
            .iter()
            .map(|t| format!("• *{}* [{}] {}", t.key, t.status, t.summary))
            .collect();
        let text = self.templates.render(
            TemplateKey::TicketList,
            ctx.language,
            &[("tickets", &lines.join("\n"))],
        );
        self.reply(ctx.phone, &text).await?;
        Ok(ProcessOutcome::new(
            Some(Intent::CheckStatus),
            ProcessAction::StatusSent,
        ))
    }

    async fn update_ticket(
        &self,
        ctx: &RouteContext<'_>,
        classification: &IntentClassification,
    ) -> Result<ProcessOutcome, MarhabaError> {
        let Some(key) = self.ticket_key(ctx.text, classification) else {
            return self.request_key(ctx, Intent::UpdateTicket).await;
        };

        let comment = format!("Update from {} via WhatsApp:\n{}", ctx.name, ctx.text);
        match self
            .tickets
            .update(&key, Some(&comment), classification.priority)
            .await
        {
            Ok(()) => {
                let text = self.templates.render(
                    TemplateKey::TicketUpdated,
                    ctx.language,
                    &[("ticket_key", &key)],
                );
                self.reply(ctx.phone, &text).await?;
                Ok(
                    ProcessOutcome::new(Some(Intent::UpdateTicket), ProcessAction::TicketUpdated)
                        .with_ticket_key(key),
                )
            }
            Err(e) => self.ticket_failure(ctx, Intent::UpdateTicket, e).await,
        }
    }

    async fn close_ticket(
        &self,
        ctx: &RouteContext<'_>,
        classification: &IntentClassification,
    ) -> Result<ProcessOutcome, MarhabaError> {
        let Some(key) = self.ticket_key(ctx.text, classification) else {
            return self.request_key(ctx, Intent::CloseTicket).await;
        };

        match self.tickets.close(&key).await {
            Ok(()) => {
                let text = self.templates.render(
                    TemplateKey::TicketClosed,
                    ctx.language,
                    &[("ticket_key", &key)],
                );
                self.reply(ctx.phone, &text).await?;
                Ok(
                    ProcessOutcome::new(Some(Intent::CloseTicket), ProcessAction::TicketClosed)
                        .with_ticket_key(key),
                )
            }
            Err(e) => self.ticket_failure(ctx, Intent::CloseTicket, e).await,
        }
    }

    /// Direct entry point for the real-estate heuristic as well as the
    /// property intents.
    pub async fn property_redirect(
        &self,
        ctx: &RouteContext<'_>,
    ) -> Result<ProcessOutcome, MarhabaError> {
        let text = self
            .templates
            .render(TemplateKey::PropertyRedirect, ctx.language, &[]);
        self.sessions
            .update_state(ctx.phone, ConversationState::PropertySearch);
        self.reply(ctx.phone, &text).await?;
        Ok(ProcessOutcome::new(
            Some(Intent::PropertyInquiry),
            ProcessAction::RedirectedToSales,
        ))
    }

    async fn general_inquiry(&self, ctx: &RouteContext<'_>) -> Result<ProcessOutcome, MarhabaError> {
        let key = if ctx.vip.is_vip {
            TemplateKey::VipGreeting
        } else {
            TemplateKey::Greeting
        };
        let text = self
            .templates
            .render(key, ctx.language, &[("name", ctx.name)]);
        self.reply(ctx.phone, &text).await?;
        Ok(ProcessOutcome::new(
            Some(Intent::GeneralInquiry),
            ProcessAction::Responded,
        ))
    }

    async fn request_key(
        &self,
        ctx: &RouteContext<'_>,
        intent: Intent,
    ) -> Result<ProcessOutcome, MarhabaError> {
        let text = self
            .templates
            .render(TemplateKey::RequestTicketKey, ctx.language, &[]);
        self.reply(ctx.phone, &text).await?;
        Ok(ProcessOutcome::new(
            Some(intent),
            ProcessAction::RequestedTicketKey,
        ))
    }

    async fn ticket_failure(
        &self,
        ctx: &RouteContext<'_>,
        intent: Intent,
        error: MarhabaError,
    ) -> Result<ProcessOutcome, MarhabaError> {
        warn!(phone = %ctx.phone, intent = %intent, error = %error, "tracker call failed");
        let text = self.templates.render(TemplateKey::Error, ctx.language, &[]);
        self.reply(ctx.phone, &text).await?;
        let mut outcome = ProcessOutcome::new(Some(intent), ProcessAction::Failed);
        outcome.error = Some(error.to_string());
        Ok(outcome)
    }

    /// Prefer the classifier's extracted key, fall back to a pattern scan of
    /// the raw message. Keys are normalized to uppercase.
    fn ticket_key(&self, text: &str, classification: &IntentClassification) -> Option<String> {
        if let Some(key) = &classification.ticket_key {
            return Some(key.to_uppercase());
        }
        self.ticket_key_pattern
            .captures(text)
            .map(|c| c[1].to_uppercase())
    }

    fn pick_priority(
        &self,
        ctx: &RouteContext<'_>,
        classification: Option<&IntentClassification>,
    ) -> Priority {
        if let Some(p) = classification.and_then(|c| c.priority) {
            return p;
        }
        if ctx.vip.auto_escalate || ctx.sentiment.escalate {
            return Priority::High;
        }
        Priority::Medium
    }

    async fn reply(&self, phone: &str, text: &str) -> Result<(), MarhabaError> {
        self.messaging.send_text(phone, text).await?;
        self.sessions.append_message(phone, MessageRole::Agent, text);
        Ok(())
    }
}

fn heuristic_summary(text: &str, team: &str) -> String {
    let mut head: String = text.chars().take(60).collect();
    if text.chars().count() > 60 {
        head.push('…');
    }
    format!("[{team}] {head}")
}
