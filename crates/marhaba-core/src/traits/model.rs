// SPDX-FileCopyrightText: 2026 Marhaba Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Language model trait used for intent classification, ticket text
//! generation, and translation.

use async_trait::async_trait;

use crate::error::MarhabaError;
use crate::types::{HistoryTurn, IntentClassification, Language};

/// LLM-backed collaborator.
///
/// Implementations must never mutate session state; that is the pipeline's
/// responsibility. Every method has a rule-based fallback at the call site,
/// so a failing model degrades the experience instead of breaking it.
#[async_trait]
pub trait IntentModel: Send + Sync {
    /// Classifies the user's intent given the message and recent history.
    ///
    /// A malformed model response must yield a low-confidence
    /// `general_inquiry` classification, never an error.
    async fn classify_intent(
        &self,
        message: &str,
        history: &[HistoryTurn],
    ) -> Result<IntentClassification, MarhabaError>;

    /// Translates text into the target language.
    async fn translate(&self, text: &str, target: Language) -> Result<String, MarhabaError>;

    /// Generates a one-line ticket summary from the user's message.
    async fn ticket_summary(
        &self,
        message: &str,
        reporter: &str,
        team: &str,
    ) -> Result<String, MarhabaError>;

    /// Generates a full ticket description from the user's message.
    async fn ticket_description(
        &self,
        message: &str,
        reporter: &str,
    ) -> Result<String, MarhabaError>;
}
