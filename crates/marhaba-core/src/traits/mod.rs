// SPDX-FileCopyrightText: 2026 Marhaba Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator traits for external systems.
//!
//! Each collaborator is consumed only through the narrow interface defined
//! here; the core never reimplements them. Concrete adapters live in their
//! own crates (`marhaba-whatsapp`, `marhaba-jira`, `marhaba-llm`) and test
//! fakes in `marhaba-test-utils`.

mod messaging;
mod model;
mod ticket;

pub use messaging::MessagingClient;
pub use model::IntentModel;
pub use ticket::TicketClient;
