// SPDX-FileCopyrightText: 2026 Marhaba Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Technical-support versus property-inquiry query detection.
//!
//! The two detectors are not symmetric: any technical keyword disqualifies a
//! message from being a property inquiry, so "dashboard for four seasons"
//! routes to support even though it names a campaign that sounds like a
//! location.

use regex::Regex;
use tracing::debug;

const TECHNICAL_KEYWORDS: &[&str] = &[
    "report",
    "dashboard",
    "data",
    "analytics",
    "kpi",
    "metric",
    "ai report",
    "campaign report",
    "marketing report",
    "analysis",
    "salesforce",
    "crm",
    "system",
    "ticket",
    "support",
    "issue",
    "error",
    "bug",
    "not working",
    "down",
    "sync",
    "login",
    "password",
    "access",
    "permission",
    "laptop",
    "keyboard",
    "website",
    "api",
    "database",
    "server",
    "deployment",
];

const PROBLEM_INDICATORS: &[&str] = &[
    "issue",
    "problem",
    "error",
    "not working",
    "broken",
    "down",
    "failed",
    "can't",
    "unable",
    "wrong",
    "need help",
    "need support",
    "not loading",
    "stuck",
];

const PROPERTY_KEYWORDS: &[&str] = &[
    "villa",
    "apartment",
    "penthouse",
    "property",
    "bedroom",
    "buy",
    "sell",
    "rent",
    "lease",
    "viewing",
    "purchase",
];

const TECHNICAL_PATTERNS: &[&str] = &[
    r"(?:salesforce|crm|dashboard).*(?:not|issue|error|problem)",
    r"(?:laptop|keyboard|computer).*(?:not working|broken|issue)",
    r"(?:login|password|access).*(?:issue|problem|expired|denied)",
    r"(?:report|data|dashboard).*(?:wrong|incorrect|missing|error)",
    r"(?:website|api|system).*(?:down|not loading|error|crashed)",
];

const PROPERTY_PATTERNS: &[&str] = &[
    r"(?:buy|purchase|looking for|want|need|show me)\s+(?:a|an)?\s*(?:\d+)?\s*(?:bedroom|bed|br)?\s*(?:villa|apartment|property|penthouse)",
    r"(?:buy|rent|lease)\s+property",
    r"(?:villa|apartment|property).*(?:for sale|for rent|available)",
    r"view(?:ing)?\s+(?:a|the)?\s*property",
    r"(?:2|3|4|5)\s*(?:bed|bedroom|br)\s+(?:villa|apartment)",
    r"budget.*(?:villa|apartment|property)",
];

/// Detects whether a message is a technical-support request or a property
/// inquiry.
pub struct QueryTypeDetector {
    technical_patterns: Vec<Regex>,
    property_patterns: Vec<Regex>,
}

impl Default for QueryTypeDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryTypeDetector {
    pub fn new() -> Self {
        let compile = |patterns: &[&str]| {
            patterns
                .iter()
                .map(|p| Regex::new(p).expect("query pattern is valid"))
                .collect()
        };
        Self {
            technical_patterns: compile(TECHNICAL_PATTERNS),
            property_patterns: compile(PROPERTY_PATTERNS),
        }
    }

    /// True when the message describes a technical support problem.
    pub fn is_technical(&self, message: &str) -> bool {
        let lower = message.to_lowercase();
        let keyword_count = TECHNICAL_KEYWORDS
            .iter()
            .filter(|k| lower.contains(*k))
            .count();
        let has_problem = PROBLEM_INDICATORS.iter().any(|i| lower.contains(i));
        let matches_pattern = self.technical_patterns.iter().any(|p| p.is_match(&lower));

        let technical =
            keyword_count >= 2 || (keyword_count >= 1 && has_problem) || matches_pattern;
        if technical {
            debug!(keyword_count, has_problem, "technical query detected");
        }
        technical
    }

    /// True only for an explicit property inquiry. Technical keywords
    /// anywhere in the message disqualify it outright.
    pub fn is_property(&self, message: &str) -> bool {
        let lower = message.to_lowercase();
        if TECHNICAL_KEYWORDS.iter().any(|k| lower.contains(k)) {
            return false;
        }

        let matches_pattern = self.property_patterns.iter().any(|p| p.is_match(&lower));
        let keyword_count = PROPERTY_KEYWORDS
            .iter()
            .filter(|k| lower.contains(*k))
            .count();

        let property = matches_pattern || keyword_count >= 3;
        if property {
            debug!(keyword_count, "property inquiry detected");
        }
        property
    }
}
