// SPDX-FileCopyrightText: 2026 Marhaba Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ticket tracker trait (Jira-style issue tracker).

use async_trait::async_trait;

use crate::error::MarhabaError;
use crate::types::{Priority, TicketReceipt, TicketRequest, TicketStatus, TicketSummary};

/// External issue tracker consumed by the intent handlers.
#[async_trait]
pub trait TicketClient: Send + Sync {
    /// Creates a ticket and returns its key.
    async fn create(&self, request: &TicketRequest) -> Result<TicketReceipt, MarhabaError>;

    /// Adds a comment and/or changes priority on an existing ticket.
    async fn update(
        &self,
        key: &str,
        comment: Option<&str>,
        priority: Option<Priority>,
    ) -> Result<(), MarhabaError>;

    /// Transitions a ticket to its closed state.
    async fn close(&self, key: &str) -> Result<(), MarhabaError>;

    /// Fetches the current status of a ticket.
    async fn status(&self, key: &str) -> Result<TicketStatus, MarhabaError>;

    /// Lists recent tickets filed by a reporter phone number.
    async fn search_by_reporter(
        &self,
        phone: &str,
        limit: usize,
    ) -> Result<Vec<TicketSummary>, MarhabaError>;
}
