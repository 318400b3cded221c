// SPDX-FileCopyrightText: 2026 Marhaba Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as valid bind addresses and sane time windows.

use crate::diagnostic::ConfigError;
use crate::model::MarhabaConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &MarhabaConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.pipeline.session_timeout_minutes < 1 {
        errors.push(ConfigError::Validation {
            message: format!(
                "pipeline.session_timeout_minutes must be at least 1, got {}",
                config.pipeline.session_timeout_minutes
            ),
        });
    }

    if config.pipeline.confirmation_window_minutes < 1 {
        errors.push(ConfigError::Validation {
            message: format!(
                "pipeline.confirmation_window_minutes must be at least 1, got {}",
                config.pipeline.confirmation_window_minutes
            ),
        });
    }

    if config.pipeline.max_history < 1 {
        errors.push(ConfigError::Validation {
            message: format!(
                "pipeline.max_history must be at least 1, got {}",
                config.pipeline.max_history
            ),
        });
    }

    if config.pipeline.max_sessions < 1 {
        errors.push(ConfigError::Validation {
            message: format!(
                "pipeline.max_sessions must be at least 1, got {}",
                config.pipeline.max_sessions
            ),
        });
    }

    let threshold = config.pipeline.intent_confidence_threshold;
    if !(0.0..=1.0).contains(&threshold) {
        errors.push(ConfigError::Validation {
            message: format!(
                "pipeline.intent_confidence_threshold must be between 0.0 and 1.0, got {threshold}"
            ),
        });
    }

    if config.pipeline.history_context_turns < 1 {
        errors.push(ConfigError::Validation {
            message: format!(
                "pipeline.history_context_turns must be at least 1, got {}",
                config.pipeline.history_context_turns
            ),
        });
    }

    // Webhook host must be a valid IP or hostname
    let host = config.whatsapp.webhook_host.trim();
    if host.is_empty() {
        errors.push(ConfigError::Validation {
            message: "whatsapp.webhook_host must not be empty".to_string(),
        });
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            errors.push(ConfigError::Validation {
                message: format!(
                    "whatsapp.webhook_host `{host}` is not a valid IP address or hostname"
                ),
            });
        }
    }

    if config.jira.project_key.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "jira.project_key must not be empty".to_string(),
        });
    }

    if let Some(base_url) = &config.jira.base_url
        && base_url.trim().is_empty()
    {
        errors.push(ConfigError::Validation {
            message: "jira.base_url must not be empty".to_string(),
        });
    }

    if config.llm.base_url.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "llm.base_url must not be empty".to_string(),
        });
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}
