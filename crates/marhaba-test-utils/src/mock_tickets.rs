// SPDX-FileCopyrightText: 2026 Marhaba Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock ticket tracker that records every call.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use marhaba_core::error::MarhabaError;
use marhaba_core::traits::TicketClient;
use marhaba_core::types::{Priority, TicketReceipt, TicketRequest, TicketStatus, TicketSummary};

/// In-memory tracker double. Created tickets get sequential `SUP-n` keys.
pub struct MockTickets {
    created: Arc<Mutex<Vec<TicketRequest>>>,
    updates: Arc<Mutex<Vec<(String, Option<String>, Option<Priority>)>>>,
    closed: Arc<Mutex<Vec<String>>>,
    statuses: Arc<Mutex<HashMap<String, TicketStatus>>>,
    search_results: Arc<Mutex<Vec<TicketSummary>>>,
    next_key: AtomicU32,
    fail_create: AtomicBool,
}

impl MockTickets {
    pub fn new() -> Self {
        Self {
            created: Arc::new(Mutex::new(Vec::new())),
            updates: Arc::new(Mutex::new(Vec::new())),
            closed: Arc::new(Mutex::new(Vec::new())),
            statuses: Arc::new(Mutex::new(HashMap::new())),
            search_results: Arc::new(Mutex::new(Vec::new())),
            next_key: AtomicU32::new(1),
            fail_create: AtomicBool::new(false),
        }
    }

    /// Make every subsequent create fail with a tracker error.
    pub fn fail_creates(&self, fail: bool) {
        self.fail_create.store(fail, Ordering::SeqCst);
    }

    /// Seed a status for a key so `status()` succeeds.
    pub async fn seed_status(&self, status: TicketStatus) {
        self.statuses.lock().await.insert(status.key.clone(), status);
    }

    /// Seed the result list for `search_by_reporter`.
    pub async fn seed_search(&self, results: Vec<TicketSummary>) {
        *self.search_results.lock().await = results;
    }

    pub async fn created_tickets(&self) -> Vec<TicketRequest> {
        self.created.lock().await.clone()
    }

    pub async fn created_count(&self) -> usize {
        self.created.lock().await.len()
    }

    pub async fn updates(&self) -> Vec<(String, Option<String>, Option<Priority>)> {
        self.updates.lock().await.clone()
    }

    pub async fn closed_keys(&self) -> Vec<String> {
        self.closed.lock().await.clone()
    }
}

impl Default for MockTickets {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TicketClient for MockTickets {
    async fn create(&self, request: &TicketRequest) -> Result<TicketReceipt, MarhabaError> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(MarhabaError::Tracker {
                message: "mock create failure".to_string(),
                source: None,
            });
        }
        let n = self.next_key.fetch_add(1, Ordering::SeqCst);
        self.created.lock().await.push(request.clone());
        Ok(TicketReceipt {
            key: format!("SUP-{n}"),
            summary: request.summary.clone(),
        })
    }

    async fn update(
        &self,
        key: &str,
        comment: Option<&str>,
        priority: Option<Priority>,
    ) -> Result<(), MarhabaError> {
        self.updates
            .lock()
            .await
            .push((key.to_string(), comment.map(String::from), priority));
        Ok(())
    }

    async fn close(&self, key: &str) -> Result<(), MarhabaError> {
        self.closed.lock().await.push(key.to_string());
        Ok(())
    }

    async fn status(&self, key: &str) -> Result<TicketStatus, MarhabaError> {
        self.statuses
            .lock()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| MarhabaError::Tracker {
                message: format!("ticket {key} not found"),
                source: None,
            })
    }

    async fn search_by_reporter(&self, _phone: &str, _limit: usize) -> Result<Vec<TicketSummary>, MarhabaError> {
        Ok(self.search_results.lock().await.clone())
    }
}
