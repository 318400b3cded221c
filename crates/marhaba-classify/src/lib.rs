// SPDX-FileCopyrightText: 2026 Marhaba Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Zero-cost heuristic classifiers for the message pipeline.
//!
//! Everything here runs locally with no model call: language detection,
//! sentiment and urgency scoring, VIP assessment, technical/property query
//! detection, and team routing.

pub mod language;
pub mod query;
pub mod sentiment;
pub mod team;
pub mod vip;

pub use language::{LanguageDetection, LanguageDetector};
pub use query::QueryTypeDetector;
pub use sentiment::SentimentAnalyzer;
pub use team::{TeamDetection, TeamDetector};
pub use vip::{VipDetector, VipProfile};
