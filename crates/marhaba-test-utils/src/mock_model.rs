// SPDX-FileCopyrightText: 2026 Marhaba Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock language model with pre-configured classifications.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use marhaba_core::error::MarhabaError;
use marhaba_core::traits::IntentModel;
use marhaba_core::types::{HistoryTurn, IntentClassification, Language};

/// Classifications are popped from a FIFO queue. When the queue is empty,
/// the low-confidence fallback classification is returned. Translation is
/// identity, and ticket text is derived from the message.
pub struct MockModel {
    classifications: Arc<Mutex<VecDeque<IntentClassification>>>,
    fail: AtomicBool,
}

impl MockModel {
    pub fn new() -> Self {
        Self {
            classifications: Arc::new(Mutex::new(VecDeque::new())),
            fail: AtomicBool::new(false),
        }
    }

    pub fn with_classifications(classifications: Vec<IntentClassification>) -> Self {
        Self {
            classifications: Arc::new(Mutex::new(VecDeque::from(classifications))),
            fail: AtomicBool::new(false),
        }
    }

    /// Add a classification to the end of the queue.
    pub async fn push_classification(&self, classification: IntentClassification) {
        self.classifications.lock().await.push_back(classification);
    }

    /// Make every subsequent call fail with a model error, exercising the
    /// rule-based fallbacks at the call sites.
    pub fn fail_calls(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), MarhabaError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(MarhabaError::Model {
                message: "mock model failure".to_string(),
                source: None,
            });
        }
        Ok(())
    }
}

impl Default for MockModel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IntentModel for MockModel {
    async fn classify_intent(
        &self,
        _message: &str,
        _history: &[HistoryTurn],
    ) -> Result<IntentClassification, MarhabaError> {
        self.check()?;
        Ok(self
            .classifications
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(IntentClassification::fallback))
    }

    async fn translate(&self, text: &str, _target: Language) -> Result<String, MarhabaError> {
        self.check()?;
        Ok(text.to_string())
    }

    async fn ticket_summary(
        &self,
        message: &str,
        _reporter: &str,
        team: &str,
    ) -> Result<String, MarhabaError> {
        self.check()?;
        Ok(format!("[{team}] {message}"))
    }

    async fn ticket_description(
        &self,
        message: &str,
        reporter: &str,
    ) -> Result<String, MarhabaError> {
        self.check()?;
        Ok(format!("{reporter} reports:\n{message}"))
    }
}
