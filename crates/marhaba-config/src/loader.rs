// SPDX-FileCopyrightText: 2026 Marhaba Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./marhaba.toml` > `~/.config/marhaba/marhaba.toml`
//! > `/etc/marhaba/marhaba.toml` with environment variable overrides via the
//! `MARHABA_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::MarhabaConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/marhaba/marhaba.toml` (system-wide)
/// 3. `~/.config/marhaba/marhaba.toml` (user XDG config)
/// 4. `./marhaba.toml` (local directory)
/// 5. `MARHABA_*` environment variables
pub fn load_config() -> Result<MarhabaConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(MarhabaConfig::default()))
        .merge(Toml::file("/etc/marhaba/marhaba.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("marhaba/marhaba.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("marhaba.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<MarhabaConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(MarhabaConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<MarhabaConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(MarhabaConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `MARHABA_JIRA_API_TOKEN` must map to
/// `jira.api_token`, not `jira.api.token`.
fn env_provider() -> Env {
    Env::prefixed("MARHABA_").map(|key| {
        // `key` is the lowercased env var name with prefix stripped.
        // Example: MARHABA_JIRA_API_TOKEN -> "jira_api_token"
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("agent_", "agent.", 1)
            .replacen("pipeline_", "pipeline.", 1)
            .replacen("jira_", "jira.", 1)
            .replacen("whatsapp_", "whatsapp.", 1)
            .replacen("llm_", "llm.", 1)
            .replacen("business_", "business.", 1);
        mapped.into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_defaults_from_empty_string() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config.agent.name, "marhaba");
        assert_eq!(config.pipeline.max_history, 50);
    }

    #[test]
    fn toml_overrides_defaults() {
        let config = load_config_from_str(
            r#"
            [pipeline]
            session_timeout_minutes = 5
            max_history = 10

            [jira]
            project_key = "OPS"
            "#,
        )
        .unwrap();
        assert_eq!(config.pipeline.session_timeout_minutes, 5);
        assert_eq!(config.pipeline.max_history, 10);
        assert_eq!(config.jira.project_key, "OPS");
        // Untouched keys keep defaults.
        assert_eq!(config.pipeline.confirmation_window_minutes, 60);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result = load_config_from_str(
            r#"
            [pipeline]
            sesion_timeout_minutes = 5
            "#,
        );
        assert!(result.is_err());
    }
}
