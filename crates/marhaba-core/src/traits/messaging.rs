// SPDX-FileCopyrightText: 2026 Marhaba Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Messaging channel trait for outbound delivery (WhatsApp gateway, fakes).

use async_trait::async_trait;

use crate::error::MarhabaError;

/// Outbound side of a messaging channel.
///
/// The pipeline calls `send_text` exactly zero or one times per processed
/// message. Which concrete implementation is used (real gateway, sandbox,
/// in-memory fake) is a startup wiring decision, never a conditional import.
#[async_trait]
pub trait MessagingClient: Send + Sync {
    /// Adapter name for logs.
    fn name(&self) -> &str;

    /// Sends a plain text message to the given phone number.
    async fn send_text(&self, to: &str, body: &str) -> Result<(), MarhabaError>;
}
