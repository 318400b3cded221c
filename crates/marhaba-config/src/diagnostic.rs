// SPDX-FileCopyrightText: 2026 Marhaba Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Figment-to-miette error bridge with fuzzy match suggestions.
//!
//! Converts Figment deserialization errors into miette diagnostics with
//! "did you mean?" suggestions using Jaro-Winkler string similarity.

use miette::Diagnostic;
use thiserror::Error;

/// Minimum Jaro-Winkler similarity score to suggest a correction.
/// 0.75 catches common typos like `max_histroy` -> `max_history`
/// while filtering noise.
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// A configuration error with diagnostic context.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// An unknown key was found in the configuration.
    #[error("unknown configuration key `{key}`")]
    #[diagnostic(
        code(marhaba::config::unknown_key),
        help("{}", format_unknown_key_help(suggestion.as_deref()))
    )]
    UnknownKey {
        /// The unrecognized key name.
        key: String,
        /// Suggested correction via fuzzy matching, if any.
        suggestion: Option<String>,
    },

    /// A validation error for a config value.
    #[error("validation error: {message}")]
    #[diagnostic(code(marhaba::config::validation))]
    Validation { message: String },

    /// Any other Figment parse/deserialize failure.
    #[error("configuration error: {message}")]
    #[diagnostic(code(marhaba::config::parse))]
    Parse { message: String },
}

fn format_unknown_key_help(suggestion: Option<&str>) -> String {
    match suggestion {
        Some(s) => format!("did you mean `{s}`?"),
        None => "check marhaba.toml against the documented configuration keys".to_string(),
    }
}

/// All recognized keys, used for typo suggestions.
const KNOWN_KEYS: &[&str] = &[
    "agent.name",
    "agent.log_level",
    "pipeline.session_timeout_minutes",
    "pipeline.confirmation_window_minutes",
    "pipeline.max_history",
    "pipeline.max_sessions",
    "pipeline.sweep_interval_secs",
    "pipeline.frustration_window_minutes",
    "pipeline.intent_confidence_threshold",
    "pipeline.history_context_turns",
    "jira.base_url",
    "jira.email",
    "jira.api_token",
    "jira.project_key",
    "jira.request_timeout_secs",
    "jira.max_retries",
    "whatsapp.webhook_host",
    "whatsapp.webhook_port",
    "whatsapp.webhook_secret",
    "whatsapp.api_base",
    "whatsapp.api_key",
    "whatsapp.api_secret",
    "whatsapp.channel_id",
    "whatsapp.dedup_window_secs",
    "whatsapp.request_timeout_secs",
    "whatsapp.max_retries",
    "llm.api_key",
    "llm.base_url",
    "llm.model",
    "llm.request_timeout_secs",
    "llm.max_retries",
    "business.email",
    "business.website",
];

/// Find the closest known key by Jaro-Winkler similarity.
fn suggest_key(unknown: &str) -> Option<String> {
    KNOWN_KEYS
        .iter()
        .map(|k| (k, strsim::jaro_winkler(unknown, k)))
        .filter(|(_, score)| *score >= SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(k, _)| k.to_string())
}

/// Convert a Figment error into one or more `ConfigError`s.
pub fn figment_to_config_errors(err: figment::Error) -> Vec<ConfigError> {
    err.into_iter()
        .map(|e| {
            let message = e.to_string();
            // Figment reports denied unknown fields as "unknown field: found `x`".
            if let Some(start) = message.find("unknown field: found `") {
                let rest = &message[start + "unknown field: found `".len()..];
                if let Some(end) = rest.find('`') {
                    let key = rest[..end].to_string();
                    let path = e.path.join(".");
                    let full_key = if path.is_empty() {
                        key.clone()
                    } else {
                        format!("{path}.{key}")
                    };
                    return ConfigError::UnknownKey {
                        suggestion: suggest_key(&full_key).or_else(|| suggest_key(&key)),
                        key: full_key,
                    };
                }
            }
            ConfigError::Parse { message }
        })
        .collect()
}

/// Render config errors to stderr via miette's fancy reporter.
pub fn render_errors(errors: &[ConfigError]) {
    for err in errors {
        eprintln!("{:?}", miette::Report::msg(err.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suggests_close_key_names() {
        assert_eq!(
            suggest_key("pipeline.max_histroy").as_deref(),
            Some("pipeline.max_history")
        );
        assert_eq!(
            suggest_key("jira.projct_key").as_deref(),
            Some("jira.project_key")
        );
    }

    #[test]
    fn no_suggestion_for_garbage() {
        assert!(suggest_key("zzzzqqqq").is_none());
    }

    #[test]
    fn figment_unknown_field_becomes_unknown_key() {
        let err = crate::loader::load_config_from_str(
            r#"
            [pipeline]
            max_histroy = 3
            "#,
        )
        .unwrap_err();
        let errors = figment_to_config_errors(err);
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::UnknownKey { .. })));
    }
}
