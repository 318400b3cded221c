// SPDX-FileCopyrightText: 2026 Marhaba Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock messaging channel that captures outbound messages.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use marhaba_core::error::MarhabaError;
use marhaba_core::traits::MessagingClient;

/// Captures every `send_text` call for assertion in tests.
pub struct MockMessaging {
    sent: Arc<Mutex<Vec<(String, String)>>>,
    fail: AtomicBool,
}

impl MockMessaging {
    pub fn new() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            fail: AtomicBool::new(false),
        }
    }

    /// Make every subsequent send fail with a channel error.
    pub fn fail_sends(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// All `(to, body)` pairs sent so far.
    pub async fn sent_messages(&self) -> Vec<(String, String)> {
        self.sent.lock().await.clone()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    /// Body of the most recent message, if any.
    pub async fn last_body(&self) -> Option<String> {
        self.sent.lock().await.last().map(|(_, body)| body.clone())
    }
}

impl Default for MockMessaging {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessagingClient for MockMessaging {
    fn name(&self) -> &str {
        "mock-messaging"
    }

    async fn send_text(&self, to: &str, body: &str) -> Result<(), MarhabaError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(MarhabaError::Channel {
                message: "mock send failure".to_string(),
                source: None,
            });
        }
        self.sent
            .lock()
            .await
            .push((to.to_string(), body.to_string()));
        Ok(())
    }
}
