// SPDX-FileCopyrightText: 2026 Marhaba Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Marhaba WhatsApp concierge.
//!
//! This crate provides the foundational trait definitions, error types, and
//! common types used throughout the Marhaba workspace. All collaborator
//! adapters (messaging channel, ticket tracker, language model) implement
//! traits defined here.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::MarhabaError;
pub use traits::{IntentModel, MessagingClient, TicketClient};
pub use types::{
    ConversationState, HistoryTurn, InboundMessage, Intent, IntentClassification, Language,
    MessageRole, Priority, ProcessAction, ProcessOutcome, Sentiment, SentimentReport,
    TicketReceipt, TicketRequest, TicketStatus, TicketSummary, VipAssessment, VipTier,
};
