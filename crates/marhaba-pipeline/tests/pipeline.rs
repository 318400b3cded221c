// SPDX-FileCopyrightText: 2026 Marhaba Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end pipeline tests with mocked collaborators.

use std::sync::Arc;

use chrono::Duration;
use marhaba_classify::VipDetector;
use marhaba_core::types::{
    InboundMessage, Intent, IntentClassification, Priority, ProcessAction, TicketStatus, VipTier,
};
use marhaba_pipeline::{MessagePipeline, PipelineSettings, Templates};
use marhaba_session::{PendingDraftStore, SessionStore};
use marhaba_test_utils::{MockMessaging, MockModel, MockTickets};

const PHONE: &str = "+971500000001";

struct Harness {
    pipeline: MessagePipeline,
    messaging: Arc<MockMessaging>,
    tickets: Arc<MockTickets>,
    model: Arc<MockModel>,
    drafts: Arc<PendingDraftStore>,
    vip: Arc<VipDetector>,
}

fn harness() -> Harness {
    let sessions = Arc::new(SessionStore::new(
        Duration::minutes(30),
        50,
        1000,
        Duration::minutes(5),
    ));
    let drafts = Arc::new(PendingDraftStore::new(Duration::minutes(60)));
    let messaging = Arc::new(MockMessaging::new());
    let tickets = Arc::new(MockTickets::new());
    let model = Arc::new(MockModel::new());
    let vip = Arc::new(VipDetector::new());

    let pipeline = MessagePipeline::new(
        Arc::clone(&sessions),
        Arc::clone(&drafts),
        Arc::clone(&tickets) as _,
        Arc::clone(&messaging) as _,
        Arc::clone(&model) as _,
        Arc::clone(&vip),
        Templates::new("sales@example.com", "https://example.com"),
        PipelineSettings::default(),
    );

    Harness {
        pipeline,
        messaging,
        tickets,
        model,
        drafts,
        vip,
    }
}

fn msg(text: &str) -> InboundMessage {
    InboundMessage {
        from: PHONE.to_string(),
        name: "Amira".to_string(),
        text: text.to_string(),
        message_id: format!("m-{}", text.len()),
    }
}

#[tokio::test]
async fn plain_greeting_gets_a_greeting_reply() {
    let h = harness();
    let outcome = h.pipeline.process(&msg("hi")).await;

    assert_eq!(outcome.action, ProcessAction::Responded);
    assert_eq!(outcome.intent, Some(Intent::GeneralInquiry));
    let body = h.messaging.last_body().await.unwrap();
    assert!(body.contains("Hello Amira"));
}

#[tokio::test]
async fn registered_vip_gets_the_vip_greeting() {
    let h = harness();
    h.vip.register(PHONE, "Amira", VipTier::Platinum);

    let outcome = h.pipeline.process(&msg("hello")).await;
    assert_eq!(outcome.action, ProcessAction::Responded);
    let body = h.messaging.last_body().await.unwrap();
    assert!(body.contains("VIP"));
}

#[tokio::test]
async fn technical_message_creates_a_draft_without_the_model() {
    let h = harness();
    h.model.fail_calls(true);

    let outcome = h
        .pipeline
        .process(&msg("salesforce sync is broken, losing leads"))
        .await;

    assert_eq!(outcome.action, ProcessAction::AwaitingConfirmation);
    assert_eq!(outcome.intent, Some(Intent::CreateTicket));
    assert_eq!(h.tickets.created_count().await, 0);

    let draft = h.drafts.get(PHONE).expect("draft stored");
    assert_eq!(draft.project_key, "SUP");
    let body = h.messaging.last_body().await.unwrap();
    assert!(body.contains("Ticket Preview"));
    assert!(body.contains(&draft.summary));
}

#[tokio::test]
async fn confirming_a_draft_creates_exactly_one_ticket() {
    let h = harness();
    h.pipeline
        .process(&msg("salesforce sync is broken, losing leads"))
        .await;

    let outcome = h.pipeline.process(&msg("yes")).await;

    assert_eq!(outcome.action, ProcessAction::TicketCreated);
    assert_eq!(outcome.ticket_key.as_deref(), Some("SUP-1"));
    assert_eq!(h.tickets.created_count().await, 1);
    assert!(h.drafts.get(PHONE).is_none());
    let body = h.messaging.last_body().await.unwrap();
    assert!(body.contains("SUP-1"));
}

#[tokio::test]
async fn confirm_token_wins_over_new_issue_keywords() {
    let h = harness();
    h.pipeline
        .process(&msg("salesforce sync is broken, losing leads"))
        .await;

    let outcome = h
        .pipeline
        .process(&msg("yes, by the way salesforce is down and dashboard is broken"))
        .await;

    assert_eq!(outcome.action, ProcessAction::TicketCreated);
    assert_eq!(h.tickets.created_count().await, 1);
}

#[tokio::test]
async fn new_issue_abandons_the_draft_and_starts_a_fresh_one() {
    let h = harness();
    h.pipeline
        .process(&msg("salesforce sync is broken, losing leads"))
        .await;
    let first = h.drafts.get(PHONE).unwrap();

    let outcome = h
        .pipeline
        .process(&msg("my laptop keyboard stopped responding"))
        .await;

    // Acknowledged the switch, then previewed the new draft.
    assert_eq!(outcome.action, ProcessAction::AwaitingConfirmation);
    let sent = h.messaging.sent_messages().await;
    assert!(sent.iter().any(|(_, body)| body.contains("new issue")));

    let second = h.drafts.get(PHONE).unwrap();
    assert_ne!(first.summary, second.summary);
    assert!(second.description.contains("laptop keyboard"));
    assert_eq!(h.tickets.created_count().await, 0);
}

#[tokio::test]
async fn modifications_accumulate_in_the_description() {
    let h = harness();
    h.pipeline
        .process(&msg("salesforce sync is broken, losing leads"))
        .await;

    for addition in [
        "it started on monday",
        "affects the whole team",
        "worst during mornings",
    ] {
        let outcome = h.pipeline.process(&msg(addition)).await;
        assert_eq!(outcome.action, ProcessAction::UpdatedPreview);
    }

    let draft = h.drafts.get(PHONE).unwrap();
    assert_eq!(draft.description.matches("Additional Information:").count(), 3);
    // The fragments appear in the order they were sent.
    let first = draft.description.find("it started on monday").unwrap();
    let second = draft.description.find("affects the whole team").unwrap();
    let third = draft.description.find("worst during mornings").unwrap();
    assert!(first < second && second < third);
    assert_eq!(h.tickets.created_count().await, 0);
}

#[tokio::test]
async fn idle_user_locks_are_pruned() {
    let h = harness();
    for n in 0..5 {
        let message = InboundMessage {
            from: format!("+97150000000{n}"),
            name: "Amira".to_string(),
            text: "hi".to_string(),
            message_id: format!("m-{n}"),
        };
        h.pipeline.process(&message).await;
    }
    // Each pass drops the locks left behind by earlier, now idle users.
    assert_eq!(h.pipeline.user_lock_count(), 1);
}

#[tokio::test]
async fn failed_creation_keeps_the_draft_for_retry() {
    let h = harness();
    h.pipeline
        .process(&msg("salesforce sync is broken, losing leads"))
        .await;

    h.tickets.fail_creates(true);
    let outcome = h.pipeline.process(&msg("yes")).await;
    assert_eq!(outcome.action, ProcessAction::Failed);
    assert!(outcome.error.is_some());
    assert!(h.drafts.get(PHONE).is_some());

    h.tickets.fail_creates(false);
    let outcome = h.pipeline.process(&msg("yes")).await;
    assert_eq!(outcome.action, ProcessAction::TicketCreated);
    assert_eq!(h.tickets.created_count().await, 1);
}

#[tokio::test]
async fn cancelling_discards_the_draft() {
    let h = harness();
    h.pipeline
        .process(&msg("salesforce sync is broken, losing leads"))
        .await;

    let outcome = h.pipeline.process(&msg("no")).await;

    assert_eq!(outcome.action, ProcessAction::Cancelled);
    assert!(h.drafts.get(PHONE).is_none());
    assert_eq!(h.tickets.created_count().await, 0);
}

#[tokio::test]
async fn property_inquiry_redirects_to_sales() {
    let h = harness();
    let outcome = h
        .pipeline
        .process(&msg("I want to buy a 3 bedroom villa in Palm Jumeirah"))
        .await;

    assert_eq!(outcome.action, ProcessAction::RedirectedToSales);
    let body = h.messaging.last_body().await.unwrap();
    assert!(body.contains("sales@example.com"));
}

#[tokio::test]
async fn status_check_extracts_the_key_from_the_message() {
    let h = harness();
    h.tickets
        .seed_status(TicketStatus {
            key: "SUP-7".to_string(),
            summary: "Sync broken".to_string(),
            status: "In Progress".to_string(),
            priority: "High".to_string(),
            assignee: "Omar".to_string(),
            url: "https://tracker.example.com/browse/SUP-7".to_string(),
        })
        .await;
    h.model
        .push_classification(IntentClassification {
            intent: Intent::CheckStatus,
            confidence: 0.95,
            entities: Default::default(),
            ticket_key: None,
            priority: None,
        })
        .await;

    let outcome = h.pipeline.process(&msg("any update on sup-7?")).await;

    assert_eq!(outcome.action, ProcessAction::StatusSent);
    assert_eq!(outcome.ticket_key.as_deref(), Some("SUP-7"));
    let body = h.messaging.last_body().await.unwrap();
    assert!(body.contains("In Progress"));
}

#[tokio::test]
async fn status_check_without_key_or_history_requests_one() {
    let h = harness();
    h.model
        .push_classification(IntentClassification {
            intent: Intent::CheckStatus,
            confidence: 0.95,
            entities: Default::default(),
            ticket_key: None,
            priority: None,
        })
        .await;

    let outcome = h.pipeline.process(&msg("what happened to my request?")).await;

    assert_eq!(outcome.action, ProcessAction::RequestedTicketKey);
}

#[tokio::test]
async fn low_confidence_classification_degrades_to_general_inquiry() {
    let h = harness();
    h.model
        .push_classification(IntentClassification {
            intent: Intent::CloseTicket,
            confidence: 0.2,
            entities: Default::default(),
            ticket_key: None,
            priority: None,
        })
        .await;

    let outcome = h.pipeline.process(&msg("hmm about that thing")).await;

    assert_eq!(outcome.intent, Some(Intent::GeneralInquiry));
    assert_eq!(outcome.action, ProcessAction::Responded);
    assert_eq!(h.tickets.closed_keys().await.len(), 0);
}

#[tokio::test]
async fn arabic_message_gets_an_arabic_reply() {
    let h = harness();
    let outcome = h.pipeline.process(&msg("مرحبا كيف الحال")).await;

    assert_eq!(outcome.action, ProcessAction::Responded);
    let body = h.messaging.last_body().await.unwrap();
    assert!(body.contains("مرحباً"));
}

#[tokio::test]
async fn registered_vip_drafts_escalate_to_high_priority() {
    let h = harness();
    h.vip.register(PHONE, "Amira", VipTier::Diamond);

    h.pipeline
        .process(&msg("salesforce sync is broken, losing leads"))
        .await;

    let draft = h.drafts.get(PHONE).unwrap();
    assert_eq!(draft.priority, Priority::High);
}

#[tokio::test]
async fn close_ticket_with_key_closes_it() {
    let h = harness();
    h.model
        .push_classification(IntentClassification {
            intent: Intent::CloseTicket,
            confidence: 0.9,
            entities: Default::default(),
            ticket_key: Some("sup-12".to_string()),
            priority: None,
        })
        .await;

    let outcome = h.pipeline.process(&msg("please resolve my old request")).await;

    assert_eq!(outcome.action, ProcessAction::TicketClosed);
    assert_eq!(h.tickets.closed_keys().await, vec!["SUP-12".to_string()]);
}
