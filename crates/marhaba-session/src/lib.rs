// SPDX-FileCopyrightText: 2026 Marhaba Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation session and pending-draft stores for the Marhaba agent.
//!
//! Both stores are in-memory and keyed by phone number. Sessions carry the
//! rolling conversation history and state machine; drafts hold ticket
//! previews awaiting user confirmation.

pub mod draft;
pub mod store;

pub use draft::{PendingDraft, PendingDraftStore};
pub use store::{
    ConversationSession, LogArchiver, SessionArchiver, SessionStore, StoredMessage, UserStats,
};
