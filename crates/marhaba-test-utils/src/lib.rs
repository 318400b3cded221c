// SPDX-FileCopyrightText: 2026 Marhaba Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock collaborators for fast, deterministic, CI-runnable pipeline tests
//! without external services.
//!
//! - [`MockMessaging`] captures outbound messages for assertion
//! - [`MockTickets`] records tracker calls and mints sequential keys
//! - [`MockModel`] returns pre-configured classifications and ticket text

pub mod mock_messaging;
pub mod mock_model;
pub mod mock_tickets;

pub use mock_messaging::MockMessaging;
pub use mock_model::MockModel;
pub use mock_tickets::MockTickets;
