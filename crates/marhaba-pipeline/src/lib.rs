// SPDX-FileCopyrightText: 2026 Marhaba Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end message processing: language detection, translation, session
//! bookkeeping, heuristic screening, confirmation handling, and intent
//! routing.
//!
//! One inbound message produces exactly one [`ProcessOutcome`]. Messages from
//! the same phone number are serialized behind a per-user lock so the
//! confirmation state machine never races itself.

pub mod confirmation;
pub mod router;
pub mod templates;

use std::sync::Arc;

use chrono::Duration;
use dashmap::DashMap;
use marhaba_classify::{LanguageDetector, QueryTypeDetector, SentimentAnalyzer, VipDetector};
use marhaba_core::error::MarhabaError;
use marhaba_core::traits::{IntentModel, MessagingClient, TicketClient};
use marhaba_core::types::{
    HistoryTurn, InboundMessage, Intent, IntentClassification, Language, MessageRole,
    ProcessAction, ProcessOutcome,
};
use marhaba_session::{PendingDraftStore, SessionStore};
use tokio::sync::Mutex;
use tracing::{info, warn};

pub use confirmation::{ConfirmationDecision, ConfirmationHandler, ConfirmationResult, decide};
pub use router::{IntentRouter, RouteContext};
pub use templates::{TemplateKey, Templates};

/// Tunables the pipeline reads at every message.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Tracker project tickets are filed under.
    pub project_key: String,
    /// Model classifications below this confidence degrade to
    /// `general_inquiry`.
    pub intent_confidence_threshold: f32,
    /// How many history turns accompany a classification request.
    pub history_context_turns: usize,
    /// Sliding window for the repeat-frustration urgency bump.
    pub frustration_window: Duration,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            project_key: "SUP".to_string(),
            intent_confidence_threshold: 0.4,
            history_context_turns: 5,
            frustration_window: Duration::minutes(30),
        }
    }
}

pub struct MessagePipeline {
    sessions: Arc<SessionStore>,
    drafts: Arc<PendingDraftStore>,
    model: Arc<dyn IntentModel>,
    router: IntentRouter,
    confirmation: ConfirmationHandler,
    language: LanguageDetector,
    sentiment: SentimentAnalyzer,
    vip: Arc<VipDetector>,
    queries: QueryTypeDetector,
    settings: PipelineSettings,
    // Serializes processing per phone number.
    user_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl MessagePipeline {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        sessions: Arc<SessionStore>,
        drafts: Arc<PendingDraftStore>,
        tickets: Arc<dyn TicketClient>,
        messaging: Arc<dyn MessagingClient>,
        model: Arc<dyn IntentModel>,
        vip: Arc<VipDetector>,
        templates: Templates,
        settings: PipelineSettings,
    ) -> Self {
        let router = IntentRouter::new(
            Arc::clone(&sessions),
            Arc::clone(&drafts),
            Arc::clone(&tickets),
            Arc::clone(&messaging),
            Arc::clone(&model),
            templates.clone(),
            &settings.project_key,
        );
        let confirmation = ConfirmationHandler::new(
            Arc::clone(&sessions),
            Arc::clone(&drafts),
            tickets,
            messaging,
            templates,
        );
        Self {
            sessions,
            drafts,
            model,
            router,
            confirmation,
            language: LanguageDetector::new(),
            sentiment: SentimentAnalyzer::new(settings.frustration_window),
            vip,
            queries: QueryTypeDetector::new(),
            settings,
            user_locks: DashMap::new(),
        }
    }

    /// Process one inbound message to completion.
    ///
    /// Never returns an error: failures are reported inside the outcome so
    /// the webhook loop keeps draining regardless.
    pub async fn process(&self, message: &InboundMessage) -> ProcessOutcome {
        let lock = self.user_lock(&message.from);
        let _guard = lock.lock().await;
        // A strong count of 1 means only the map holds the lock, so no task
        // is using it. Our own entry stays at 2 through the `lock` clone.
        self.user_locks.retain(|_, l| Arc::strong_count(l) > 1);

        match self.process_inner(message).await {
            Ok(outcome) => {
                if let Some(intent) = outcome.intent {
                    self.sessions.record_topic(&message.from, intent);
                }
                info!(
                    phone = %message.from,
                    action = %outcome.action,
                    intent = ?outcome.intent,
                    "message processed"
                );
                outcome
            }
            Err(e) => {
                warn!(phone = %message.from, error = %e, "message processing failed");
                ProcessOutcome {
                    intent: None,
                    action: ProcessAction::Failed,
                    response_sent: false,
                    ticket_key: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    async fn process_inner(
        &self,
        message: &InboundMessage,
    ) -> Result<ProcessOutcome, MarhabaError> {
        self.sessions.sweep();

        let detected = self.language.detect(&message.text);
        let session = self
            .sessions
            .get_or_create(&message.from, Some(&message.name));
        self.sessions.set_language(&message.from, detected.language);

        // Classification and ticket content work on English text; the user's
        // original words still go into the history verbatim.
        let english = self.english_text(&message.text, detected.language).await;
        self.sessions
            .append_message(&message.from, MessageRole::User, &message.text);

        let sentiment = self.sentiment.analyze(&english, &message.from);
        let vip = self
            .vip
            .assess(&english, &message.from, session.vip.as_ref());
        self.sessions.set_vip(&message.from, vip.clone());

        let ctx = RouteContext {
            phone: &message.from,
            name: &message.name,
            text: &english,
            language: detected.language,
            vip: &vip,
            sentiment: &sentiment,
        };

        // A pending draft owns the conversation until resolved or abandoned.
        if let Some(draft) = self.drafts.get(&message.from) {
            match self
                .confirmation
                .handle(&message.from, &english, detected.language, draft)
                .await?
            {
                ConfirmationResult::Handled(outcome) => return Ok(outcome),
                ConfirmationResult::OverriddenByNewIssue => {
                    // Fall through and treat this message as a fresh issue.
                }
            }
        }

        // Heuristic screens skip the model entirely.
        if self.queries.is_technical(&english) {
            return self.router.create_ticket(&ctx, None).await;
        }
        if self.queries.is_property(&english) {
            return self.router.property_redirect(&ctx).await;
        }

        let classification = self.classify(&english, &session.history).await;
        self.router.route(&ctx, &classification).await
    }

    async fn english_text(&self, text: &str, language: Language) -> String {
        if language == Language::English {
            return text.to_string();
        }
        match self.model.translate(text, Language::English).await {
            Ok(translated) => translated,
            Err(e) => {
                warn!(error = %e, "translation failed, classifying original text");
                text.to_string()
            }
        }
    }

    async fn classify(
        &self,
        english: &str,
        history: &[marhaba_session::StoredMessage],
    ) -> IntentClassification {
        let turns: Vec<HistoryTurn> = history
            .iter()
            .rev()
            .take(self.settings.history_context_turns)
            .rev()
            .map(|m| HistoryTurn {
                role: m.role,
                content: m.content.clone(),
            })
            .collect();

        let mut classification = match self.model.classify_intent(english, &turns).await {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "intent classification failed, using fallback");
                IntentClassification::fallback()
            }
        };

        if classification.confidence < self.settings.intent_confidence_threshold {
            info!(
                intent = %classification.intent,
                confidence = classification.confidence,
                "classification below threshold, degrading to general inquiry"
            );
            classification.intent = Intent::GeneralInquiry;
        }
        classification
    }

    /// Number of per-user locks currently tracked.
    pub fn user_lock_count(&self) -> usize {
        self.user_locks.len()
    }

    fn user_lock(&self, phone: &str) -> Arc<Mutex<()>> {
        self.user_locks
            .entry(phone.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}
