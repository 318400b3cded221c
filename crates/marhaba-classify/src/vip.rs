// SPDX-FileCopyrightText: 2026 Marhaba Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! VIP client detection for luxury real estate clientele.
//!
//! Resolution order: registry, then the session-cached assessment, then
//! keyword scoring over the message. Scoring maps to tiers at fixed cuts:
//! 0.5 gold, 0.7 platinum, 0.9 diamond.

use chrono::Utc;
use dashmap::DashMap;
use marhaba_core::types::{VipAssessment, VipTier};
use regex::Regex;
use tracing::info;

const VIP_KEYWORDS: &[&str] = &[
    "vip",
    "premium",
    "exclusive",
    "high-value",
    "investor",
    "portfolio",
    "multiple properties",
    "urgent client",
    "important client",
];

const LUXURY_INDICATORS: &[&str] = &[
    "penthouse",
    "villa",
    "mansion",
    "estate",
    "palm jumeirah",
    "burj khalifa",
    "emirates hills",
    "jumeirah bay island",
    "dubai hills",
    "million",
    "billion",
    "luxury",
];

const BUSINESS_VALUE_INDICATORS: &[&str] = &[
    "deal pending",
    "closing soon",
    "contract",
    "agreement",
    "sale falling through",
    "losing client",
    "commission",
    "multiple units",
];

/// A manually registered VIP client.
#[derive(Debug, Clone)]
pub struct VipProfile {
    pub name: String,
    pub tier: VipTier,
    pub registered_at: chrono::DateTime<Utc>,
}

/// Detects VIP clients from a registry or message content.
pub struct VipDetector {
    registry: DashMap<String, VipProfile>,
    large_number: Regex,
}

impl Default for VipDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl VipDetector {
    pub fn new() -> Self {
        Self {
            registry: DashMap::new(),
            // Comma-grouped amounts ("2,500,000") or 7+ digit runs.
            large_number: Regex::new(r"\b(\d{1,3}(?:,\d{3})+|\d{7,})\b")
                .expect("large number pattern is valid"),
        }
    }

    /// Assess VIP status for a message.
    ///
    /// `cached` is the session's previous assessment; a cached VIP result
    /// short-circuits rescoring so status is sticky within a conversation.
    pub fn assess(
        &self,
        message: &str,
        phone: &str,
        cached: Option<&VipAssessment>,
    ) -> VipAssessment {
        if let Some(profile) = self.registry.get(phone) {
            return VipAssessment {
                is_vip: true,
                tier: profile.tier,
                confidence: 1.0,
                indicators: vec!["registered VIP client".to_string()],
                auto_escalate: true,
            };
        }

        if let Some(prev) = cached
            && prev.is_vip
        {
            return prev.clone();
        }

        let lower = message.to_lowercase();
        let mut indicators = Vec::new();
        let mut score: f32 = 0.0;

        for keyword in VIP_KEYWORDS {
            if lower.contains(keyword) {
                indicators.push(format!("VIP keyword: {keyword}"));
                score += 0.3;
            }
        }
        for indicator in LUXURY_INDICATORS {
            if lower.contains(indicator) {
                indicators.push(format!("luxury property: {indicator}"));
                score += 0.2;
            }
        }
        for indicator in BUSINESS_VALUE_INDICATORS {
            if lower.contains(indicator) {
                indicators.push(format!("business value: {indicator}"));
                score += 0.25;
            }
        }
        if let Some(m) = self.large_number.find(message) {
            indicators.push(format!("large amount mentioned: {}", m.as_str()));
            score += 0.2;
        }

        let confidence = score.min(1.0);
        let is_vip = confidence >= 0.5;
        let tier = if confidence >= 0.9 {
            VipTier::Diamond
        } else if confidence >= 0.7 {
            VipTier::Platinum
        } else if confidence >= 0.5 {
            VipTier::Gold
        } else {
            VipTier::Standard
        };

        if is_vip {
            info!(phone = %phone, ?tier, confidence, "VIP client detected");
        }

        VipAssessment {
            is_vip,
            tier,
            confidence,
            indicators,
            auto_escalate: is_vip && tier >= VipTier::Platinum,
        }
    }

    pub fn register(&self, phone: &str, name: &str, tier: VipTier) {
        self.registry.insert(
            phone.to_string(),
            VipProfile {
                name: name.to_string(),
                tier,
                registered_at: Utc::now(),
            },
        );
        info!(phone = %phone, name = %name, ?tier, "VIP registered");
    }

    pub fn remove(&self, phone: &str) -> bool {
        self.registry.remove(phone).is_some()
    }

    pub fn profile(&self, phone: &str) -> Option<VipProfile> {
        self.registry.get(phone).map(|p| p.clone())
    }
}
