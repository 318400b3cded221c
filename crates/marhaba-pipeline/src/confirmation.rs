// SPDX-FileCopyrightText: 2026 Marhaba Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pending-draft confirmation state machine.
//!
//! While a ticket draft is awaiting confirmation, every incoming message is
//! decided here first. Precedence: an explicit confirm or cancel token always
//! wins; only a message with two or more new-issue keywords and neither token
//! abandons the draft and falls through as a fresh issue. Anything else is a
//! modification that amends the draft and resends the preview.

use std::sync::Arc;

use marhaba_core::error::MarhabaError;
use marhaba_core::traits::{MessagingClient, TicketClient};
use marhaba_core::types::{
    Intent, Language, MessageRole, ProcessAction, ProcessOutcome, TicketRequest,
};
use marhaba_session::{PendingDraft, PendingDraftStore, SessionStore};
use tracing::{info, warn};

use crate::templates::{TemplateKey, Templates};

/// Single-word confirmation tokens, matched against whole words.
const CONFIRM_TOKENS: &[&str] = &[
    "yes", "confirm", "create", "ok", "okay", "sure", "proceed", "correct", "right", "good",
    "yeah", "yep", "y", "نعم", "موافق", "تمام",
];

/// Single-word cancellation tokens, matched against whole words.
const CANCEL_TOKENS: &[&str] = &["cancel", "no", "stop", "لا", "إلغاء"];

/// Technical keywords that signal the user switched to a new issue.
const NEW_ISSUE_KEYWORDS: &[&str] = &[
    "salesforce", "dashboard", "login", "password", "website", "laptop", "keyboard", "error",
    "not working", "down", "report", "data", "sync", "campaign", "urgent", "api", "crm",
    "system", "database", "server", "access",
];

/// What the user's reply means for the pending draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationDecision {
    Confirm,
    Cancel,
    /// Two or more new-issue keywords with no confirm/cancel token.
    NewIssueOverride,
    Modify,
}

/// Classify a reply against a pending draft.
pub fn decide(message: &str) -> ConfirmationDecision {
    let lower = message.to_lowercase();
    let tokens: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect();

    let is_confirm = tokens.iter().any(|t| CONFIRM_TOKENS.contains(t));
    let is_cancel = tokens.iter().any(|t| CANCEL_TOKENS.contains(t));
    let issue_count = NEW_ISSUE_KEYWORDS
        .iter()
        .filter(|k| lower.contains(*k))
        .count();

    if issue_count >= 2 && !is_confirm && !is_cancel {
        ConfirmationDecision::NewIssueOverride
    } else if is_confirm {
        ConfirmationDecision::Confirm
    } else if is_cancel {
        ConfirmationDecision::Cancel
    } else {
        ConfirmationDecision::Modify
    }
}

/// Result of running the confirmation handler.
pub enum ConfirmationResult {
    /// Terminal: a reply was sent and processing stops here.
    Handled(ProcessOutcome),
    /// The draft was abandoned for a new issue; reprocess the message.
    OverriddenByNewIssue,
}

/// Executes confirmation decisions against the stores and the tracker.
pub struct ConfirmationHandler {
    sessions: Arc<SessionStore>,
    drafts: Arc<PendingDraftStore>,
    tickets: Arc<dyn TicketClient>,
    messaging: Arc<dyn MessagingClient>,
    templates: Templates,
}

impl ConfirmationHandler {
    pub fn new(
        sessions: Arc<SessionStore>,
        drafts: Arc<PendingDraftStore>,
        tickets: Arc<dyn TicketClient>,
        messaging: Arc<dyn MessagingClient>,
        templates: Templates,
    ) -> Self {
        Self {
            sessions,
            drafts,
            tickets,
            messaging,
            templates,
        }
    }

    pub async fn handle(
        &self,
        phone: &str,
        message: &str,
        language: Language,
        mut draft: PendingDraft,
    ) -> Result<ConfirmationResult, MarhabaError> {
        match decide(message) {
            ConfirmationDecision::NewIssueOverride => {
                info!(phone = %phone, "new issue detected, abandoning pending draft");
                self.drafts.clear(phone);
                let ack = self.templates.render(TemplateKey::NewIssueAck, language, &[]);
                self.reply(phone, &ack).await?;
                Ok(ConfirmationResult::OverriddenByNewIssue)
            }
            ConfirmationDecision::Confirm => self.confirm(phone, language, draft).await,
            ConfirmationDecision::Cancel => {
                self.drafts.clear(phone);
                let text = self.templates.render(TemplateKey::Cancelled, language, &[]);
                self.reply(phone, &text).await?;
                Ok(ConfirmationResult::Handled(ProcessOutcome::new(
                    Some(Intent::CreateTicket),
                    ProcessAction::Cancelled,
                )))
            }
            ConfirmationDecision::Modify => {
                draft.amend(message);
                let preview = self.templates.render(
                    TemplateKey::ConfirmTicket,
                    language,
                    &[
                        ("summary", &draft.summary),
                        ("team", &draft.team),
                        ("priority", &draft.priority.to_string()),
                    ],
                );
                self.drafts.store(draft);
                self.reply(phone, &preview).await?;
                Ok(ConfirmationResult::Handled(ProcessOutcome::new(
                    Some(Intent::CreateTicket),
                    ProcessAction::UpdatedPreview,
                )))
            }
        }
    }

    async fn confirm(
        &self,
        phone: &str,
        language: Language,
        draft: PendingDraft,
    ) -> Result<ConfirmationResult, MarhabaError> {
        let request = TicketRequest {
            summary: draft.summary.clone(),
            description: draft.description.clone(),
            project_key: draft.project_key.clone(),
            priority: draft.priority,
        };

        match self.tickets.create(&request).await {
            Ok(receipt) => {
                self.drafts.clear(phone);
                self.sessions.record_ticket(phone, &receipt.key);
                let text = self.templates.render(
                    TemplateKey::TicketCreated,
                    language,
                    &[("ticket_key", &receipt.key), ("summary", &receipt.summary)],
                );
                self.reply(phone, &text).await?;
                info!(phone = %phone, key = %receipt.key, "ticket created from confirmed draft");
                Ok(ConfirmationResult::Handled(
                    ProcessOutcome::new(Some(Intent::CreateTicket), ProcessAction::TicketCreated)
                        .with_ticket_key(receipt.key),
                ))
            }
            Err(e) => {
                // The draft survives so the user can retry with another
                // "yes" once the tracker recovers.
                warn!(phone = %phone, error = %e, "ticket creation failed, keeping draft");
                let text = self.templates.render(TemplateKey::Error, language, &[]);
                self.reply(phone, &text).await?;
                let mut outcome =
                    ProcessOutcome::new(Some(Intent::CreateTicket), ProcessAction::Failed);
                outcome.error = Some(e.to_string());
                Ok(ConfirmationResult::Handled(outcome))
            }
        }
    }

    async fn reply(&self, phone: &str, text: &str) -> Result<(), MarhabaError> {
        self.messaging.send_text(phone, text).await?;
        self.sessions.append_message(phone, MessageRole::Agent, text);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_yes_confirms() {
        assert_eq!(decide("yes"), ConfirmationDecision::Confirm);
        assert_eq!(decide("Yes please"), ConfirmationDecision::Confirm);
        assert_eq!(decide("نعم"), ConfirmationDecision::Confirm);
    }

    #[test]
    fn plain_no_cancels() {
        assert_eq!(decide("no"), ConfirmationDecision::Cancel);
        assert_eq!(decide("cancel that"), ConfirmationDecision::Cancel);
        assert_eq!(decide("لا"), ConfirmationDecision::Cancel);
    }

    #[test]
    fn confirm_token_vetoes_new_issue_override() {
        // Two issue keywords present, but the leading "yes" wins.
        assert_eq!(
            decide("yes, by the way salesforce is down and dashboard is broken"),
            ConfirmationDecision::Confirm
        );
    }

    #[test]
    fn cancel_token_vetoes_new_issue_override() {
        assert_eq!(
            decide("no, actually the salesforce dashboard thing"),
            ConfirmationDecision::Cancel
        );
    }

    #[test]
    fn two_issue_keywords_without_tokens_override() {
        assert_eq!(
            decide("my laptop keyboard stopped responding"),
            ConfirmationDecision::NewIssueOverride
        );
        assert_eq!(
            decide("the salesforce sync broke again"),
            ConfirmationDecision::NewIssueOverride
        );
    }

    #[test]
    fn single_issue_keyword_is_a_modification() {
        assert_eq!(
            decide("also mention the error happens on mobile"),
            ConfirmationDecision::Modify
        );
    }

    #[test]
    fn free_text_is_a_modification() {
        assert_eq!(
            decide("please add that it started on Monday"),
            ConfirmationDecision::Modify
        );
    }

    #[test]
    fn token_matching_ignores_substrings() {
        // "y" and "no" must not match inside other words.
        assert_eq!(decide("it is not ready yet"), ConfirmationDecision::Modify);
    }
}
