// SPDX-FileCopyrightText: 2026 Marhaba Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WhatsApp channel integration via Gallabox.
//!
//! [`webhook`] receives and normalizes inbound events; [`sender`] delivers
//! outbound text messages.

pub mod sender;
pub mod webhook;

pub use sender::GallaboxSender;
pub use webhook::{WebhookState, router, serve};
