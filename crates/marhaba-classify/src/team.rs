// SPDX-FileCopyrightText: 2026 Marhaba Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Weighted-keyword team routing for support tickets.
//!
//! Scores every team from keyword tiers, contextual regex patterns, entity
//! mentions, and fuzzy word matching, then picks the best with a priority
//! tiebreaker when scores are close.

use std::collections::HashMap;

use regex::Regex;
use strsim::normalized_levenshtein;
use tracing::debug;

/// Similarity above which a word counts as a fuzzy keyword hit.
const FUZZY_THRESHOLD: f64 = 0.85;

/// Keyword tiers per team: (team, high 3.0, medium 2.0, low 1.0).
const TEAM_KEYWORDS: &[(&str, &[&str], &[&str], &[&str])] = &[
    (
        "Salesforce Team",
        &[
            "salesforce", "sfdc", "crm system", "sales cloud", "service cloud",
            "marketing cloud", "apex", "visualforce",
        ],
        &[
            "lead", "opportunity", "contact", "account", "campaign", "workflow",
            "process builder", "flow",
        ],
        &[
            "sync", "integration", "customer data", "pipeline", "forecast", "quote",
            "contract", "case",
        ],
    ),
    (
        "Marketing Team",
        &[
            "campaign", "marketing report", "ai report", "kpi", "roi", "conversion",
            "marketing analytics", "campaign performance",
        ],
        &[
            "email blast", "newsletter", "social media", "content", "branding",
            "creative", "design", "collateral",
        ],
        &[
            "metrics", "engagement", "impressions", "clicks", "leads generated",
            "attribution", "funnel",
        ],
    ),
    (
        "Development Team",
        &[
            "api", "backend", "server down", "deployment failed", "production issue",
            "critical bug", "system crash",
        ],
        &[
            "website", "portal", "application", "code", "feature", "endpoint",
            "database", "query",
        ],
        &[
            "error", "timeout", "performance", "latency", "authentication",
            "authorization", "cors", "ssl",
        ],
    ),
    (
        "Data Team",
        &[
            "dashboard", "power bi", "tableau", "data warehouse", "etl",
            "data pipeline", "analytics platform",
        ],
        &[
            "report", "analytics", "insights", "visualization", "metrics",
            "kpi dashboard", "data export",
        ],
        &[
            "sql", "query", "database report", "data quality", "aggregation",
            "calculation", "formula",
        ],
    ),
    (
        "IT Team",
        &[
            "laptop", "computer", "hardware", "network", "wifi", "vpn", "printer",
            "monitor",
        ],
        &[
            "keyboard", "mouse", "screen", "device", "workstation", "connection",
            "internet",
        ],
        &["software installation", "windows", "mac", "office 365", "teams", "zoom"],
    ),
    (
        "Admin Team",
        &[
            "access denied", "permission", "user role", "account locked",
            "password reset", "can't login",
        ],
        &[
            "access request", "new user", "user management", "profile", "privileges",
            "admin rights",
        ],
        &["configuration", "settings", "preferences", "notification", "email signature"],
    ),
    (
        "Support Team",
        &["urgent", "critical", "emergency", "down"],
        &["help", "support", "assistance", "question"],
        &["inquiry", "general", "how to", "clarification"],
    ),
];

/// Contextual regex patterns per team with their weights.
const CONTEXTUAL_PATTERNS: &[(&str, &str, f64)] = &[
    ("Marketing Team", r"(?:campaign|marketing)\s+report", 5.0),
    ("Marketing Team", r"(?:ai|automated)\s+report.*campaign", 5.0),
    ("Marketing Team", r"kpi.*(?:calculation|metric|analysis)", 4.0),
    ("Marketing Team", r"(?:email|social)\s+(?:campaign|blast|marketing)", 4.0),
    ("Marketing Team", r"(?:four seasons|autumn|spring|summer|winter)\s+campaign", 5.0),
    ("Marketing Team", r"roi.*(?:report|analysis|calculation)", 4.0),
    ("Salesforce Team", r"(?:lead|contact|account).*(?:sync|not syncing|missing)", 5.0),
    ("Salesforce Team", r"salesforce.*(?:down|not working|error|issue)", 5.0),
    ("Salesforce Team", r"crm.*(?:integration|connection|api)", 4.0),
    ("Salesforce Team", r"(?:opportunity|deal|pipeline).*(?:missing|wrong|error)", 4.0),
    ("Salesforce Team", r"workflow.*(?:not triggering|failed|stuck)", 3.0),
    ("Development Team", r"(?:api|endpoint).*(?:down|failing|error|404|500)", 5.0),
    ("Development Team", r"(?:website|portal|app).*(?:down|not loading|crashed)", 5.0),
    ("Development Team", r"(?:database|db).*(?:connection|timeout|slow)", 4.0),
    ("Development Team", r"(?:deployment|build).*(?:failed|error)", 4.0),
    ("Development Team", r"(?:bug|error|exception).*(?:production|live|critical)", 5.0),
    ("Data Team", r"(?:dashboard|report).*(?:not loading|wrong data|error)", 5.0),
    ("Data Team", r"(?:power bi|tableau|analytics).*(?:issue|not working)", 5.0),
    ("Data Team", r"(?:data|metric).*(?:incorrect|missing|wrong)", 4.0),
    ("IT Team", r"(?:laptop|computer|pc).*(?:issue|problem|not working)", 5.0),
    ("IT Team", r"(?:keyboard|mouse|screen|monitor).*(?:broken|not working)", 5.0),
    ("IT Team", r"(?:network|wifi|internet).*(?:down|slow|not connecting)", 5.0),
    ("Admin Team", r"(?:access|permission|privilege).*(?:denied|needed|request)", 5.0),
    ("Admin Team", r"(?:password|account).*(?:reset|locked|expired)", 5.0),
    ("Admin Team", r"(?:login|sign in).*(?:can't|unable|not working)", 4.0),
];

/// Tiebreaker priority per team.
const TEAM_PRIORITY: &[(&str, u8)] = &[
    ("Marketing Team", 7),
    ("Salesforce Team", 6),
    ("Development Team", 5),
    ("Data Team", 4),
    ("IT Team", 3),
    ("Admin Team", 2),
    ("Support Team", 1),
];

/// Result of team detection.
#[derive(Debug, Clone)]
pub struct TeamDetection {
    pub team: String,
    pub confidence: f32,
}

/// Routes a support message to the responsible team.
pub struct TeamDetector {
    contextual: Vec<(&'static str, Regex, f64)>,
}

impl Default for TeamDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl TeamDetector {
    pub fn new() -> Self {
        let contextual = CONTEXTUAL_PATTERNS
            .iter()
            .map(|(team, pattern, weight)| {
                (
                    *team,
                    Regex::new(pattern).expect("contextual pattern is valid"),
                    *weight,
                )
            })
            .collect();
        Self { contextual }
    }

    pub fn detect(&self, message: &str) -> TeamDetection {
        let lower = message.to_lowercase();
        let mut scores: HashMap<&'static str, f64> = HashMap::new();

        for (team, high, medium, low) in TEAM_KEYWORDS {
            let mut score = 0.0;
            score += 3.0 * high.iter().filter(|k| lower.contains(*k)).count() as f64;
            score += 2.0 * medium.iter().filter(|k| lower.contains(*k)).count() as f64;
            score += 1.0 * low.iter().filter(|k| lower.contains(*k)).count() as f64;
            if score > 0.0 {
                *scores.entry(team).or_default() += score;
            }
        }

        for (team, pattern, weight) in &self.contextual {
            if pattern.is_match(&lower) {
                *scores.entry(team).or_default() += weight;
            }
        }

        self.fuzzy_pass(&lower, &mut scores);

        if scores.is_empty() {
            let team = default_team(&lower);
            debug!(team = %team, "no team signals, using default");
            return TeamDetection {
                team: team.to_string(),
                confidence: 0.5,
            };
        }

        let total: f64 = scores.values().sum();
        let mut sorted: Vec<(&str, f64)> = scores.into_iter().collect();
        sorted.sort_by(|a, b| b.1.total_cmp(&a.1));

        let (mut best_team, best_score) = sorted[0];
        let mut confidence = if total > 0.0 {
            (best_score / total) as f32
        } else {
            0.5
        };

        // Low confidence with a near-tie falls back to the team priority
        // ranking.
        if confidence < 0.4
            && let Some((second_team, second_score)) = sorted.get(1).copied()
            && (best_score - second_score).abs() < 1.0
            && team_priority(second_team) > team_priority(best_team)
        {
            best_team = second_team;
            confidence = 0.6;
        }

        if best_score >= 10.0 {
            confidence = (confidence * 1.2).min(0.99);
        }

        debug!(team = %best_team, score = best_score, confidence, "team detected");
        TeamDetection {
            team: best_team.to_string(),
            confidence,
        }
    }

    /// Fuzzy keyword hits catch typos like "salesforc" or "dashbord".
    fn fuzzy_pass(&self, lower: &str, scores: &mut HashMap<&'static str, f64>) {
        for word in lower.split_whitespace().filter(|w| w.len() > 4) {
            let word = word.trim_matches(|c: char| !c.is_alphanumeric());
            for (team, high, medium, _) in TEAM_KEYWORDS {
                let hit = high
                    .iter()
                    .chain(medium.iter())
                    .any(|k| word != *k && normalized_levenshtein(word, k) > FUZZY_THRESHOLD);
                if hit {
                    *scores.entry(team).or_default() += 0.5;
                }
            }
        }
    }
}

fn team_priority(team: &str) -> u8 {
    TEAM_PRIORITY
        .iter()
        .find(|(t, _)| *t == team)
        .map(|(_, p)| *p)
        .unwrap_or(0)
}

fn default_team(lower: &str) -> &'static str {
    if ["?", "how to", "what is", "who is", "where"]
        .iter()
        .any(|q| lower.contains(q))
    {
        return "Support Team";
    }
    if ["urgent", "critical", "asap", "emergency"]
        .iter()
        .any(|u| lower.contains(u))
    {
        return "Development Team";
    }
    if ["access", "login", "password", "permission"]
        .iter()
        .any(|a| lower.contains(a))
    {
        return "Admin Team";
    }
    "Support Team"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn salesforce_issue_routes_to_salesforce_team() {
        let detector = TeamDetector::new();
        let result = detector.detect("salesforce is down and leads are not syncing");
        assert_eq!(result.team, "Salesforce Team");
        assert!(result.confidence > 0.4);
    }

    #[test]
    fn dashboard_issue_routes_to_data_team() {
        let detector = TeamDetector::new();
        let result = detector.detect("the power bi dashboard is not loading wrong data");
        assert_eq!(result.team, "Data Team");
    }

    #[test]
    fn hardware_issue_routes_to_it_team() {
        let detector = TeamDetector::new();
        let result = detector.detect("my laptop keyboard is broken and the wifi is slow");
        assert_eq!(result.team, "IT Team");
    }

    #[test]
    fn campaign_report_routes_to_marketing() {
        let detector = TeamDetector::new();
        let result = detector.detect("I need the four seasons campaign report with kpi analysis");
        assert_eq!(result.team, "Marketing Team");
    }

    #[test]
    fn access_issue_routes_to_admin() {
        let detector = TeamDetector::new();
        let result = detector.detect("access denied when I try to reset my password");
        assert_eq!(result.team, "Admin Team");
    }

    #[test]
    fn unmatched_message_defaults_to_support() {
        let detector = TeamDetector::new();
        let result = detector.detect("hello there");
        assert_eq!(result.team, "Support Team");
        assert_eq!(result.confidence, 0.5);
    }

    #[test]
    fn fuzzy_match_catches_typos() {
        let detector = TeamDetector::new();
        let result = detector.detect("salesforc is having truble again today");
        assert_eq!(result.team, "Salesforce Team");
    }
}
