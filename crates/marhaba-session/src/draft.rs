// SPDX-FileCopyrightText: 2026 Marhaba Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pending ticket drafts awaiting user confirmation.
//!
//! Each user holds at most one draft. Storing a new draft replaces any
//! existing one, and drafts silently lapse after the confirmation window.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use marhaba_core::types::Priority;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A ticket draft shown to the user and held until they confirm or cancel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingDraft {
    pub phone: String,
    pub summary: String,
    pub description: String,
    pub project_key: String,
    pub priority: Priority,
    /// Routed team label shown in the preview.
    pub team: String,
    pub created_at: DateTime<Utc>,
}

impl PendingDraft {
    pub fn new(
        phone: &str,
        summary: &str,
        description: &str,
        project_key: &str,
        priority: Priority,
        team: &str,
    ) -> Self {
        Self {
            phone: phone.to_string(),
            summary: summary.to_string(),
            description: description.to_string(),
            project_key: project_key.to_string(),
            priority,
            team: team.to_string(),
            created_at: Utc::now(),
        }
    }

    /// Append extra detail to the description and restart the confirmation
    /// window, so a user actively refining a draft never races the expiry.
    pub fn amend(&mut self, addition: &str) {
        self.description
            .push_str(&format!("\n\nAdditional Information:\n{addition}"));
        self.created_at = Utc::now();
    }
}

/// One-draft-per-user store with a confirmation window.
pub struct PendingDraftStore {
    drafts: DashMap<String, PendingDraft>,
    window: Duration,
}

impl PendingDraftStore {
    pub fn new(window: Duration) -> Self {
        Self {
            drafts: DashMap::new(),
            window,
        }
    }

    /// Store a draft, replacing any existing draft for the same user.
    pub fn store(&self, draft: PendingDraft) {
        debug!(phone = %draft.phone, summary = %draft.summary, "storing pending draft");
        self.drafts.insert(draft.phone.clone(), draft);
    }

    /// Get the live draft for a user. A draft past the confirmation window is
    /// evicted on access and `None` is returned.
    pub fn get(&self, phone: &str) -> Option<PendingDraft> {
        let expired = {
            let entry = self.drafts.get(phone)?;
            Utc::now() - entry.created_at > self.window
        };
        if expired {
            self.drafts.remove(phone);
            debug!(phone = %phone, "pending draft lapsed");
            return None;
        }
        self.drafts.get(phone).map(|e| e.clone())
    }

    /// Remove the draft for a user. Returns true if one was present.
    pub fn clear(&self, phone: &str) -> bool {
        self.drafts.remove(phone).is_some()
    }

    pub fn len(&self) -> usize {
        self.drafts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drafts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(phone: &str, summary: &str) -> PendingDraft {
        PendingDraft::new(
            phone,
            summary,
            "Reported via WhatsApp",
            "SUP",
            Priority::Medium,
            "IT Support",
        )
    }

    #[test]
    fn store_is_last_write_wins() {
        let store = PendingDraftStore::new(Duration::minutes(60));
        store.store(draft("+971500000001", "first issue"));
        store.store(draft("+971500000001", "second issue"));
        let current = store.get("+971500000001").unwrap();
        assert_eq!(current.summary, "second issue");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn expired_draft_is_evicted_on_get() {
        let store = PendingDraftStore::new(Duration::minutes(60));
        let mut d = draft("+971500000001", "stale issue");
        d.created_at = Utc::now() - Duration::minutes(61);
        store.store(d);

        assert!(store.get("+971500000001").is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn clear_reports_presence() {
        let store = PendingDraftStore::new(Duration::minutes(60));
        assert!(!store.clear("+971500000001"));
        store.store(draft("+971500000001", "issue"));
        assert!(store.clear("+971500000001"));
        assert!(!store.clear("+971500000001"));
    }

    #[test]
    fn amend_appends_and_refreshes_window() {
        let store = PendingDraftStore::new(Duration::minutes(60));
        let mut d = draft("+971500000001", "sync broken");
        d.created_at = Utc::now() - Duration::minutes(59);
        d.amend("it also fails on mobile");
        store.store(d);

        let current = store.get("+971500000001").unwrap();
        assert!(current.description.contains("Additional Information:"));
        assert!(current.description.contains("it also fails on mobile"));
        // Window restarted, so the draft is still live.
        assert!(Utc::now() - current.created_at < Duration::minutes(1));
    }
}
