// SPDX-FileCopyrightText: 2026 Marhaba Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across collaborator traits and the Marhaba pipeline.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Conversation lifecycle states.
///
/// Advisory rather than a strict transition table: any state may move to any
/// other, except `Closed`, which is terminal and triggers archival.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ConversationState {
    Greeting,
    Inquiry,
    Qualification,
    PropertySearch,
    ViewingSchedule,
    Negotiation,
    Documentation,
    SupportTicket,
    Closed,
}

impl ConversationState {
    /// `Closed` is terminal; a closed session is archived and never reused.
    pub fn is_terminal(self) -> bool {
        matches!(self, ConversationState::Closed)
    }
}

/// Who authored a stored conversation message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    User,
    Agent,
    System,
}

/// Detected message language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    English,
    Arabic,
    /// Romanized Arabic ("Arabish") written in Latin script.
    Mixed,
}

impl Language {
    pub fn as_str(self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Arabic => "ar",
            Language::Mixed => "mixed",
        }
    }
}

/// Ticket priority levels, matching the tracker's priority scheme.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "PascalCase")]
pub enum Priority {
    Lowest,
    Low,
    Medium,
    High,
    Highest,
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Priority::Lowest => "Lowest",
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
            Priority::Highest => "Highest",
        };
        write!(f, "{s}")
    }
}

/// The closed set of intents the router dispatches on.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    CreateTicket,
    CheckStatus,
    UpdateTicket,
    CloseTicket,
    PropertyInquiry,
    ScheduleViewing,
    GeneralInquiry,
}

/// A normalized inbound message as delivered by the transport adapter.
///
/// Duplicate `message_id`s are suppressed by the transport before the
/// pipeline sees them (at-most-once delivery into the core).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Sender phone number in E.164 form.
    pub from: String,
    /// Display name reported by the channel.
    pub name: String,
    /// Message body.
    pub text: String,
    /// Channel-assigned message id, used for dedup at the transport edge.
    pub message_id: String,
}

/// One turn of recent history handed to the intent model as context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryTurn {
    pub role: MessageRole,
    pub content: String,
}

/// Transient result of intent classification; never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentClassification {
    pub intent: Intent,
    /// 0.0 to 1.0.
    pub confidence: f32,
    #[serde(default)]
    pub entities: HashMap<String, String>,
    /// Ticket key the model extracted from the message, if any.
    #[serde(default)]
    pub ticket_key: Option<String>,
    /// Priority the model inferred, if any.
    #[serde(default)]
    pub priority: Option<Priority>,
}

impl IntentClassification {
    /// A low-confidence general inquiry -- the fallback for every failure
    /// mode of the model collaborator.
    pub fn fallback() -> Self {
        Self {
            intent: Intent::GeneralInquiry,
            confidence: 0.0,
            entities: HashMap::new(),
            ticket_key: None,
            priority: None,
        }
    }
}

/// Fields for a new ticket in the tracker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketRequest {
    pub summary: String,
    pub description: String,
    pub project_key: String,
    pub priority: Priority,
}

/// What the tracker returns on successful ticket creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketReceipt {
    pub key: String,
    pub summary: String,
}

/// Ticket status as reported by the tracker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketStatus {
    pub key: String,
    pub summary: String,
    pub status: String,
    pub priority: String,
    pub assignee: String,
    pub url: String,
}

/// One row of a reporter's recent tickets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketSummary {
    pub key: String,
    pub summary: String,
    pub status: String,
}

/// Sentiment categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

/// Output of the sentiment scorer.
#[derive(Debug, Clone)]
pub struct SentimentReport {
    pub sentiment: Sentiment,
    /// Normalized to [-1.0, 1.0].
    pub score: f32,
    /// 0 to 10.
    pub urgency: u8,
    pub escalate: bool,
    pub reason: Option<String>,
}

/// VIP tiers in ascending order of importance.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Display, EnumString, Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum VipTier {
    Standard,
    Gold,
    Platinum,
    Diamond,
}

/// Output of the VIP detector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VipAssessment {
    pub is_vip: bool,
    pub tier: VipTier,
    pub confidence: f32,
    pub indicators: Vec<String>,
    /// Platinum and diamond tiers escalate without further checks.
    pub auto_escalate: bool,
}

/// Terminal action taken by one `process()` pass, for logging and analytics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ProcessAction {
    Responded,
    AwaitingConfirmation,
    TicketCreated,
    Cancelled,
    UpdatedPreview,
    RedirectedToSales,
    StatusSent,
    RequestedTicketKey,
    TicketUpdated,
    TicketClosed,
    Failed,
}

/// Structured result returned by the pipeline for every processed message.
///
/// Never swallowed silently: every terminal path produces exactly one of
/// these along with exactly one outbound reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessOutcome {
    pub intent: Option<Intent>,
    pub action: ProcessAction,
    pub response_sent: bool,
    #[serde(default)]
    pub ticket_key: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ProcessOutcome {
    pub fn new(intent: Option<Intent>, action: ProcessAction) -> Self {
        Self {
            intent,
            action,
            response_sent: true,
            ticket_key: None,
            error: None,
        }
    }

    pub fn with_ticket_key(mut self, key: impl Into<String>) -> Self {
        self.ticket_key = Some(key.into());
        self
    }
}
