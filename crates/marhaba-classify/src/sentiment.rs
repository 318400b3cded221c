// SPDX-FileCopyrightText: 2026 Marhaba Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Keyword-weighted sentiment scoring with per-user frustration tracking.
//!
//! Each message gets a sentiment score in [-1, 1] and an urgency level in
//! 0..=10. Repeated negative messages inside a rolling window bump urgency,
//! so a frustrated user escalates even when a single message would not.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use marhaba_core::types::{Sentiment, SentimentReport};
use regex::Regex;
use tracing::{debug, warn};

/// Negative indicators with their weights.
const NEGATIVE_KEYWORDS: &[(&str, i32)] = &[
    ("urgent", 3),
    ("critical", 3),
    ("emergency", 4),
    ("immediately", 3),
    ("asap", 2),
    ("frustrated", 3),
    ("angry", 3),
    ("disappointed", 2),
    ("unacceptable", 3),
    ("terrible", 3),
    ("worst", 3),
    ("broken", 2),
    ("not working", 2),
    ("failed", 2),
    ("issue", 1),
    ("problem", 1),
    ("bug", 1),
    ("error", 1),
    ("down", 2),
    ("crash", 2),
    ("losing", 3),
    ("lost", 3),
];

/// Positive indicators with their weights.
const POSITIVE_KEYWORDS: &[(&str, i32)] = &[
    ("thank", 1),
    ("thanks", 1),
    ("appreciate", 2),
    ("great", 2),
    ("excellent", 2),
    ("perfect", 2),
    ("resolved", 2),
    ("fixed", 2),
    ("working", 1),
    ("good", 1),
    ("helpful", 2),
];

/// Urgency regex patterns. Each match adds 2 to urgency.
const URGENCY_PATTERNS: &[&str] = &[
    r"need.*immediately",
    r"urgent.*help",
    r"asap",
    r"right now",
    r"can't wait",
    r"losing.*money",
    r"client.*waiting",
    r"deal.*pending",
    r"vip.*client",
];

#[derive(Debug, Clone, Copy)]
struct FrustrationEntry {
    timestamp: DateTime<Utc>,
    score: f32,
}

/// Sentiment analyzer with a rolling per-user frustration window.
pub struct SentimentAnalyzer {
    urgency_patterns: Vec<Regex>,
    history: DashMap<String, Vec<FrustrationEntry>>,
    window: Duration,
}

impl SentimentAnalyzer {
    pub fn new(frustration_window: Duration) -> Self {
        let urgency_patterns = URGENCY_PATTERNS
            .iter()
            .map(|p| Regex::new(p).expect("urgency pattern is valid"))
            .collect();
        Self {
            urgency_patterns,
            history: DashMap::new(),
            window: frustration_window,
        }
    }

    /// Analyze one message, updating the user's frustration history.
    pub fn analyze(&self, message: &str, phone: &str) -> SentimentReport {
        let lower = message.to_lowercase();

        let negative: i32 = NEGATIVE_KEYWORDS
            .iter()
            .filter(|(k, _)| lower.contains(k))
            .map(|(_, w)| w)
            .sum();
        let positive: i32 = POSITIVE_KEYWORDS
            .iter()
            .filter(|(k, _)| lower.contains(k))
            .map(|(_, w)| w)
            .sum();

        let total = negative + positive;
        let score = if total > 0 {
            (positive - negative) as f32 / total as f32
        } else {
            0.0
        };

        let sentiment = if score > 0.3 {
            Sentiment::Positive
        } else if score < -0.3 {
            Sentiment::Negative
        } else {
            Sentiment::Neutral
        };

        let mut urgency = self.punctuation_urgency(&lower, message);
        let pattern_hits = self
            .urgency_patterns
            .iter()
            .filter(|p| p.is_match(&lower))
            .count() as u8;
        urgency = (urgency + pattern_hits * 2).min(10);

        self.record(phone, score, &mut urgency);

        let escalate = urgency >= 7
            || (sentiment == Sentiment::Negative && urgency >= 5)
            || lower.contains("vip")
            || (lower.contains("urgent") && lower.contains("client"));

        let reason = if escalate {
            Some(if urgency >= 8 {
                "critical urgency detected".to_string()
            } else if lower.contains("vip") {
                "VIP client mention".to_string()
            } else if sentiment == Sentiment::Negative && urgency >= 5 {
                "high negative sentiment with urgency".to_string()
            } else {
                "escalation threshold met".to_string()
            })
        } else {
            None
        };

        if escalate {
            warn!(phone = %phone, urgency, reason = reason.as_deref(), "sentiment escalation triggered");
        } else {
            debug!(phone = %phone, ?sentiment, score, urgency, "sentiment analyzed");
        }

        SentimentReport {
            sentiment,
            score,
            urgency,
            escalate,
            reason,
        }
    }

    /// Number of users with sentiment history inside the window.
    pub fn tracked_users(&self) -> usize {
        self.history.len()
    }

    /// Urgency from punctuation and shouting: !/CAPS/? capped at 3/2/1.
    fn punctuation_urgency(&self, lower: &str, original: &str) -> u8 {
        let bangs = lower.matches('!').count().min(3) as u8;
        let caps = original
            .split_whitespace()
            .filter(|w| w.len() > 3 && w.chars().all(|c| !c.is_lowercase()) && w.chars().any(|c| c.is_uppercase()))
            .count()
            .min(2) as u8;
        let questions = lower.matches('?').count().min(1) as u8;
        bangs + caps + questions
    }

    /// Append to the rolling window, pruning stale entries. When at least two
    /// of the last three messages were negative, urgency gets a +3 bump.
    fn record(&self, phone: &str, score: f32, urgency: &mut u8) {
        let now = Utc::now();
        let cutoff = now - self.window;
        // Users whose whole window has lapsed are dropped outright, so the
        // map only holds recently active phone numbers.
        self.history
            .retain(|_, entries| entries.last().is_some_and(|e| e.timestamp > cutoff));

        let mut entries = self.history.entry(phone.to_string()).or_default();
        entries.push(FrustrationEntry {
            timestamp: now,
            score,
        });
        entries.retain(|e| e.timestamp > cutoff);

        if entries.len() >= 2 {
            let recent = &entries[entries.len().saturating_sub(3)..];
            let negative_count = recent.iter().filter(|e| e.score < -0.3).count();
            if negative_count >= 2 {
                *urgency = (*urgency + 3).min(10);
            }
        }
    }
}
