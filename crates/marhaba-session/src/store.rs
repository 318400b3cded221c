// SPDX-FileCopyrightText: 2026 Marhaba Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory conversation session store keyed by phone number.
//!
//! Sessions expire after a configurable idle window. An expired session is
//! handed to the [`SessionArchiver`] exactly once, then replaced with a fresh
//! conversation under a new conversation id.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use marhaba_core::error::MarhabaError;
use marhaba_core::types::{ConversationState, Intent, Language, MessageRole, VipAssessment};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

/// A single message stored in session history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredMessage {
    pub role: MessageRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// The full per-user conversation session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSession {
    /// User phone number in E.164 form.
    pub phone: String,
    /// Display name from the messaging profile, if known.
    pub name: Option<String>,
    /// Stable id for the current conversation window.
    pub conversation_id: String,
    pub state: ConversationState,
    pub language: Language,
    pub history: Vec<StoredMessage>,
    /// Cached VIP assessment, refreshed by the classifier.
    pub vip: Option<VipAssessment>,
    /// Keys of tickets created during this conversation.
    pub active_tickets: Vec<String>,
    /// Intents seen this conversation, in first-seen order.
    pub topics: Vec<Intent>,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
}

impl ConversationSession {
    fn new(phone: &str, name: Option<&str>, now: DateTime<Utc>) -> Self {
        Self {
            phone: phone.to_string(),
            name: name.map(str::to_string),
            conversation_id: format!("{phone}_{}", Uuid::new_v4().simple()),
            state: ConversationState::Greeting,
            language: Language::English,
            history: Vec::new(),
            vip: None,
            active_tickets: Vec::new(),
            topics: Vec::new(),
            created_at: now,
            last_active: now,
        }
    }

    fn is_expired(&self, now: DateTime<Utc>, timeout: Duration) -> bool {
        now - self.last_active > timeout
    }
}

/// Aggregate statistics for one user, derived from the live session.
#[derive(Debug, Clone, Serialize)]
pub struct UserStats {
    pub phone: String,
    pub conversation_id: String,
    pub message_count: usize,
    pub user_message_count: usize,
    pub state: ConversationState,
    pub language: Language,
    pub is_vip: bool,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
}

/// Receives sessions that have been expired out of the store.
///
/// Called exactly once per expired session, either from `get_or_create`
/// (in-place rollover) or from `sweep` (removal).
pub trait SessionArchiver: Send + Sync {
    fn archive(&self, session: &ConversationSession);
}

/// Default archiver that records the expired session to the log.
pub struct LogArchiver;

impl SessionArchiver for LogArchiver {
    fn archive(&self, session: &ConversationSession) {
        info!(
            phone = %session.phone,
            conversation_id = %session.conversation_id,
            messages = session.history.len(),
            "archiving expired session"
        );
    }
}

/// Thread-safe session store with idle expiry and bounded history.
pub struct SessionStore {
    sessions: DashMap<String, ConversationSession>,
    archiver: Arc<dyn SessionArchiver>,
    session_timeout: Duration,
    max_history: usize,
    max_sessions: usize,
    sweep_interval: Duration,
    last_sweep: Mutex<Option<DateTime<Utc>>>,
}

impl SessionStore {
    pub fn new(
        session_timeout: Duration,
        max_history: usize,
        max_sessions: usize,
        sweep_interval: Duration,
    ) -> Self {
        Self::with_archiver(
            session_timeout,
            max_history,
            max_sessions,
            sweep_interval,
            Arc::new(LogArchiver),
        )
    }

    pub fn with_archiver(
        session_timeout: Duration,
        max_history: usize,
        max_sessions: usize,
        sweep_interval: Duration,
        archiver: Arc<dyn SessionArchiver>,
    ) -> Self {
        Self {
            sessions: DashMap::new(),
            archiver,
            session_timeout,
            max_history,
            max_sessions,
            sweep_interval,
            last_sweep: Mutex::new(None),
        }
    }

    /// Get the session for a phone number, creating it if absent.
    ///
    /// If the existing session has been idle past the timeout, it is archived
    /// and replaced with a fresh conversation. Calling this repeatedly for a
    /// live session returns the same conversation id.
    pub fn get_or_create(&self, phone: &str, name: Option<&str>) -> ConversationSession {
        let now = Utc::now();
        if !self.sessions.contains_key(phone) {
            self.evict_if_full(now);
        }
        let mut entry = self
            .sessions
            .entry(phone.to_string())
            .or_insert_with(|| ConversationSession::new(phone, name, now));

        if entry.is_expired(now, self.session_timeout) {
            self.archiver.archive(&entry);
            debug!(phone = %phone, old = %entry.conversation_id, "session expired, starting new conversation");
            *entry = ConversationSession::new(phone, name, now);
        } else {
            if entry.name.is_none() {
                entry.name = name.map(str::to_string);
            }
            entry.last_active = now;
        }
        entry.clone()
    }

    /// Get the current session without creating or reviving one.
    pub fn get(&self, phone: &str) -> Option<ConversationSession> {
        let entry = self.sessions.get(phone)?;
        if entry.is_expired(Utc::now(), self.session_timeout) {
            return None;
        }
        Some(entry.clone())
    }

    /// Append a message to the session history, creating the session if
    /// absent and trimming oldest-first to the history cap.
    pub fn append_message(&self, phone: &str, role: MessageRole, content: &str) {
        let now = Utc::now();
        if !self.sessions.contains_key(phone) {
            self.evict_if_full(now);
        }
        let mut entry = self
            .sessions
            .entry(phone.to_string())
            .or_insert_with(|| ConversationSession::new(phone, None, now));
        entry.history.push(StoredMessage {
            role,
            content: content.to_string(),
            timestamp: now,
        });
        if entry.history.len() > self.max_history {
            let excess = entry.history.len() - self.max_history;
            entry.history.drain(..excess);
        }
        entry.last_active = now;
    }

    /// Transition the conversation state, recording the change as a system
    /// message in the history for auditability.
    pub fn update_state(&self, phone: &str, new_state: ConversationState) -> bool {
        let Some(mut entry) = self.sessions.get_mut(phone) else {
            return false;
        };
        let old = entry.state;
        if old == new_state {
            return true;
        }
        entry.state = new_state;
        let note = format!("state changed: {old} -> {new_state}");
        entry.history.push(StoredMessage {
            role: MessageRole::System,
            content: note,
            timestamp: Utc::now(),
        });
        if entry.history.len() > self.max_history {
            let excess = entry.history.len() - self.max_history;
            entry.history.drain(..excess);
        }
        true
    }

    pub fn set_language(&self, phone: &str, language: Language) {
        if let Some(mut entry) = self.sessions.get_mut(phone) {
            entry.language = language;
        }
    }

    /// Cache a VIP assessment on the session so later messages skip rescoring.
    pub fn set_vip(&self, phone: &str, assessment: VipAssessment) {
        if let Some(mut entry) = self.sessions.get_mut(phone) {
            entry.vip = Some(assessment);
        }
    }

    /// Record a ticket key created during this conversation. Idempotent.
    pub fn record_ticket(&self, phone: &str, key: &str) -> bool {
        let Some(mut entry) = self.sessions.get_mut(phone) else {
            return false;
        };
        if !entry.active_tickets.iter().any(|k| k == key) {
            entry.active_tickets.push(key.to_string());
        }
        true
    }

    /// Record an intent topic seen this conversation. Idempotent.
    pub fn record_topic(&self, phone: &str, intent: Intent) -> bool {
        let Some(mut entry) = self.sessions.get_mut(phone) else {
            return false;
        };
        if !entry.topics.contains(&intent) {
            entry.topics.push(intent);
        }
        true
    }

    pub fn stats(&self, phone: &str) -> Option<UserStats> {
        let entry = self.sessions.get(phone)?;
        Some(UserStats {
            phone: entry.phone.clone(),
            conversation_id: entry.conversation_id.clone(),
            message_count: entry.history.len(),
            user_message_count: entry
                .history
                .iter()
                .filter(|m| m.role == MessageRole::User)
                .count(),
            state: entry.state,
            language: entry.language,
            is_vip: entry.vip.as_ref().is_some_and(|v| v.is_vip),
            created_at: entry.created_at,
            last_active: entry.last_active,
        })
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Archive and remove all expired sessions.
    ///
    /// Throttled: runs at most once per sweep interval, returning `None`
    /// when skipped and `Some(count)` when a pass actually ran.
    pub fn sweep(&self) -> Option<usize> {
        let now = Utc::now();
        {
            let mut last = self.last_sweep.lock().expect("sweep lock poisoned");
            if let Some(prev) = *last
                && now - prev < self.sweep_interval
            {
                return None;
            }
            *last = Some(now);
        }

        let expired: Vec<String> = self
            .sessions
            .iter()
            .filter(|e| e.is_expired(now, self.session_timeout))
            .map(|e| e.key().clone())
            .collect();

        let mut archived = 0;
        for phone in expired {
            // remove_if re-checks under the shard lock so a session revived
            // between the scan and here is left alone.
            if let Some((_, session)) = self
                .sessions
                .remove_if(&phone, |_, s| s.is_expired(now, self.session_timeout))
            {
                self.archiver.archive(&session);
                archived += 1;
            }
        }
        if archived > 0 {
            info!(archived, "session sweep complete");
        }
        Some(archived)
    }

    /// Serialize all live sessions to JSON.
    pub fn export_json(&self) -> Result<String, MarhabaError> {
        let sessions: Vec<ConversationSession> =
            self.sessions.iter().map(|e| e.clone()).collect();
        serde_json::to_string_pretty(&sessions)
            .map_err(|e| MarhabaError::Internal(format!("session export failed: {e}")))
    }

    /// Load sessions from a JSON export, replacing any session already stored
    /// for the same phone number. Returns the number of sessions imported.
    pub fn import_json(&self, json: &str) -> Result<usize, MarhabaError> {
        let sessions: Vec<ConversationSession> = serde_json::from_str(json)
            .map_err(|e| MarhabaError::Internal(format!("session import failed: {e}")))?;
        let count = sessions.len();
        for session in sessions {
            self.sessions.insert(session.phone.clone(), session);
        }
        Ok(count)
    }

    /// Serialize a single user's session to JSON. Returns `Ok(None)` when no
    /// session exists for the phone number.
    pub fn export_session(&self, phone: &str) -> Result<Option<String>, MarhabaError> {
        let Some(session) = self.get(phone) else {
            return Ok(None);
        };
        serde_json::to_string_pretty(&session)
            .map(Some)
            .map_err(|e| MarhabaError::Internal(format!("session export failed: {e}")))
    }

    /// Load a single session from a JSON export, replacing any session already
    /// stored for the same phone number.
    pub fn import_session(&self, json: &str) -> Result<(), MarhabaError> {
        let session: ConversationSession = serde_json::from_str(json)
            .map_err(|e| MarhabaError::Internal(format!("session import failed: {e}")))?;
        self.sessions.insert(session.phone.clone(), session);
        Ok(())
    }

    /// When at capacity, archive and drop the longest-idle session to make
    /// room for a new one.
    fn evict_if_full(&self, now: DateTime<Utc>) {
        if self.sessions.len() < self.max_sessions {
            return;
        }
        let oldest = self
            .sessions
            .iter()
            .min_by_key(|e| e.last_active)
            .map(|e| e.key().clone());
        if let Some(phone) = oldest
            && let Some((_, session)) = self.sessions.remove(&phone)
        {
            self.archiver.archive(&session);
            debug!(phone = %phone, now = %now, "evicted longest-idle session at capacity");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingArchiver {
        count: AtomicUsize,
    }

    impl CountingArchiver {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                count: AtomicUsize::new(0),
            })
        }
    }

    impl SessionArchiver for CountingArchiver {
        fn archive(&self, _session: &ConversationSession) {
            self.count.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn store(timeout_minutes: i64) -> SessionStore {
        SessionStore::new(
            Duration::minutes(timeout_minutes),
            50,
            10_000,
            Duration::minutes(5),
        )
    }

    #[test]
    fn get_or_create_is_idempotent() {
        let store = store(30);
        let first = store.get_or_create("+971500000001", Some("Amira"));
        let second = store.get_or_create("+971500000001", None);
        assert_eq!(first.conversation_id, second.conversation_id);
        assert_eq!(second.name.as_deref(), Some("Amira"));
        assert_eq!(store.session_count(), 1);
    }

    #[test]
    fn expired_session_is_archived_once_and_replaced() {
        let archiver = CountingArchiver::new();
        let store = SessionStore::with_archiver(
            Duration::minutes(30),
            50,
            10_000,
            Duration::minutes(5),
            archiver.clone(),
        );
        let first = store.get_or_create("+971500000001", None);
        // Backdate the session past the idle window.
        store
            .sessions
            .get_mut("+971500000001")
            .unwrap()
            .last_active = Utc::now() - Duration::minutes(31);

        let second = store.get_or_create("+971500000001", None);
        assert_ne!(first.conversation_id, second.conversation_id);
        assert_eq!(second.state, ConversationState::Greeting);
        assert!(second.history.is_empty());
        assert_eq!(archiver.count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn conversation_id_embeds_phone() {
        let store = store(30);
        let session = store.get_or_create("+971501234567", None);
        assert!(session.conversation_id.starts_with("+971501234567_"));
    }

    #[test]
    fn history_is_capped_fifo() {
        let store = SessionStore::new(Duration::minutes(30), 5, 10_000, Duration::minutes(5));
        store.get_or_create("+971500000001", None);
        for i in 0..8 {
            store.append_message("+971500000001", MessageRole::User, &format!("msg {i}"));
        }
        let session = store.get("+971500000001").unwrap();
        assert_eq!(session.history.len(), 5);
        assert_eq!(session.history[0].content, "msg 3");
        assert_eq!(session.history[4].content, "msg 7");
    }

    #[test]
    fn update_state_appends_system_audit_message() {
        let store = store(30);
        store.get_or_create("+971500000001", None);
        assert!(store.update_state("+971500000001", ConversationState::SupportTicket));
        let session = store.get("+971500000001").unwrap();
        assert_eq!(session.state, ConversationState::SupportTicket);
        let last = session.history.last().unwrap();
        assert_eq!(last.role, MessageRole::System);
        assert!(last.content.contains("greeting"));
        assert!(last.content.contains("support_ticket"));
    }

    #[test]
    fn update_state_to_same_state_adds_no_audit() {
        let store = store(30);
        store.get_or_create("+971500000001", None);
        store.update_state("+971500000001", ConversationState::Greeting);
        let session = store.get("+971500000001").unwrap();
        assert!(session.history.is_empty());
    }

    #[test]
    fn append_to_unknown_phone_creates_session() {
        let store = store(30);
        store.append_message("+971509999999", MessageRole::User, "hello");
        let session = store.get("+971509999999").unwrap();
        assert_eq!(session.history.len(), 1);
        assert_eq!(session.history[0].content, "hello");
    }

    #[test]
    fn sweep_is_throttled() {
        let archiver = CountingArchiver::new();
        let store = SessionStore::with_archiver(
            Duration::minutes(30),
            50,
            10_000,
            Duration::minutes(5),
            archiver.clone(),
        );
        store.get_or_create("+971500000001", None);
        assert_eq!(store.sweep(), Some(0));
        // Second pass within the interval is skipped entirely.
        assert_eq!(store.sweep(), None);
    }

    #[test]
    fn sweep_archives_expired_sessions() {
        let archiver = CountingArchiver::new();
        let store = SessionStore::with_archiver(
            Duration::minutes(30),
            50,
            10_000,
            Duration::minutes(5),
            archiver.clone(),
        );
        store.get_or_create("+971500000001", None);
        store.get_or_create("+971500000002", None);
        store
            .sessions
            .get_mut("+971500000001")
            .unwrap()
            .last_active = Utc::now() - Duration::minutes(45);

        assert_eq!(store.sweep(), Some(1));
        assert_eq!(archiver.count.load(Ordering::SeqCst), 1);
        assert!(store.get("+971500000001").is_none());
        assert!(store.get("+971500000002").is_some());
    }

    #[test]
    fn export_import_round_trip() {
        let store = store(30);
        store.get_or_create("+971500000001", Some("Amira"));
        store.append_message("+971500000001", MessageRole::User, "hello");
        store.update_state("+971500000001", ConversationState::Inquiry);

        let json = store.export_json().unwrap();

        let restored = self::store(30);
        assert_eq!(restored.import_json(&json).unwrap(), 1);
        let session = restored.get("+971500000001").unwrap();
        assert_eq!(session.name.as_deref(), Some("Amira"));
        assert_eq!(session.state, ConversationState::Inquiry);
        assert_eq!(session.history.len(), 2);
        assert_eq!(session.history[0].content, "hello");
    }

    #[test]
    fn single_session_export_round_trips() {
        use marhaba_core::types::VipTier;

        let store = store(30);
        store.get_or_create("+971500000001", Some("Amira"));
        store.append_message("+971500000001", MessageRole::User, "hello");
        store.update_state("+971500000001", ConversationState::Inquiry);
        store.set_vip(
            "+971500000001",
            VipAssessment {
                is_vip: true,
                tier: VipTier::Gold,
                confidence: 0.6,
                indicators: vec![],
                auto_escalate: false,
            },
        );

        let json = store.export_session("+971500000001").unwrap().unwrap();
        assert!(store.export_session("+971509999999").unwrap().is_none());

        let restored = self::store(30);
        restored.import_session(&json).unwrap();
        let session = restored.get("+971500000001").unwrap();
        assert_eq!(session.history.len(), 2);
        assert_eq!(session.state, ConversationState::Inquiry);
        assert!(session.vip.as_ref().unwrap().is_vip);
    }

    #[test]
    fn stats_reflect_history_and_vip() {
        let store = store(30);
        store.get_or_create("+971500000001", None);
        store.append_message("+971500000001", MessageRole::User, "hi");
        store.append_message("+971500000001", MessageRole::Agent, "hello!");
        let stats = store.stats("+971500000001").unwrap();
        assert_eq!(stats.message_count, 2);
        assert_eq!(stats.user_message_count, 1);
        assert!(!stats.is_vip);
    }

    #[test]
    fn ticket_and_topic_records_are_idempotent() {
        let store = store(30);
        store.get_or_create("+971500000001", None);
        assert!(store.record_ticket("+971500000001", "SUP-1"));
        assert!(store.record_ticket("+971500000001", "SUP-1"));
        assert!(store.record_ticket("+971500000001", "SUP-2"));
        store.record_topic("+971500000001", Intent::CreateTicket);
        store.record_topic("+971500000001", Intent::CreateTicket);
        store.record_topic("+971500000001", Intent::CheckStatus);

        let session = store.get("+971500000001").unwrap();
        assert_eq!(session.active_tickets, vec!["SUP-1", "SUP-2"]);
        assert_eq!(session.topics, vec![Intent::CreateTicket, Intent::CheckStatus]);
        assert!(!store.record_ticket("+971509999999", "SUP-3"));
    }

    #[test]
    fn capacity_evicts_longest_idle() {
        let archiver = CountingArchiver::new();
        let store = SessionStore::with_archiver(
            Duration::minutes(30),
            50,
            2,
            Duration::minutes(5),
            archiver.clone(),
        );
        store.get_or_create("+971500000001", None);
        store.get_or_create("+971500000002", None);
        store
            .sessions
            .get_mut("+971500000001")
            .unwrap()
            .last_active = Utc::now() - Duration::minutes(10);

        store.get_or_create("+971500000003", None);
        assert_eq!(store.session_count(), 2);
        assert!(store.get("+971500000001").is_none());
        assert_eq!(archiver.count.load(Ordering::SeqCst), 1);
    }
}
