// SPDX-FileCopyrightText: 2026 Marhaba Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Marhaba concierge.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup. Every numeric knob the pipeline depends on lives
//! here; nothing is hardcoded in the core.

use serde::{Deserialize, Serialize};

/// Top-level Marhaba configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. All sections are optional and default to sensible
/// values; only collaborator credentials are genuinely required at runtime.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MarhabaConfig {
    /// Agent identity and logging settings.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Pipeline, session, and draft lifecycle knobs.
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Ticket tracker settings.
    #[serde(default)]
    pub jira: JiraConfig,

    /// WhatsApp gateway settings.
    #[serde(default)]
    pub whatsapp: WhatsappConfig,

    /// Language model settings.
    #[serde(default)]
    pub llm: LlmConfig,

    /// Brokerage contact details used in response templates.
    #[serde(default)]
    pub business: BusinessConfig,
}

/// Agent identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name of the concierge.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_agent_name() -> String {
    "marhaba".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Pipeline and lifecycle configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// Inactivity window after which a session expires and is archived.
    #[serde(default = "default_session_timeout_minutes")]
    pub session_timeout_minutes: u64,

    /// Window during which a pending ticket draft awaits confirmation.
    #[serde(default = "default_confirmation_window_minutes")]
    pub confirmation_window_minutes: u64,

    /// Per-session message history cap, oldest evicted first.
    #[serde(default = "default_max_history")]
    pub max_history: usize,

    /// Upper bound on tracked sessions.
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,

    /// Minimum interval between opportunistic expiry sweeps.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,

    /// Rolling window for repeat-frustration detection in the sentiment scorer.
    #[serde(default = "default_frustration_window_minutes")]
    pub frustration_window_minutes: u64,

    /// Intent classifications below this confidence fall back to general inquiry.
    #[serde(default = "default_intent_confidence_threshold")]
    pub intent_confidence_threshold: f32,

    /// How many recent turns of history to hand the intent model.
    #[serde(default = "default_history_context_turns")]
    pub history_context_turns: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            session_timeout_minutes: default_session_timeout_minutes(),
            confirmation_window_minutes: default_confirmation_window_minutes(),
            max_history: default_max_history(),
            max_sessions: default_max_sessions(),
            sweep_interval_secs: default_sweep_interval_secs(),
            frustration_window_minutes: default_frustration_window_minutes(),
            intent_confidence_threshold: default_intent_confidence_threshold(),
            history_context_turns: default_history_context_turns(),
        }
    }
}

fn default_session_timeout_minutes() -> u64 {
    30
}

fn default_confirmation_window_minutes() -> u64 {
    60
}

fn default_max_history() -> usize {
    50
}

fn default_max_sessions() -> usize {
    10_000
}

fn default_sweep_interval_secs() -> u64 {
    300
}

fn default_frustration_window_minutes() -> u64 {
    30
}

fn default_intent_confidence_threshold() -> f32 {
    0.4
}

fn default_history_context_turns() -> usize {
    5
}

/// Ticket tracker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct JiraConfig {
    /// Base URL of the tracker instance. `None` disables the real client.
    #[serde(default)]
    pub base_url: Option<String>,

    /// Account email for basic auth.
    #[serde(default)]
    pub email: Option<String>,

    /// API token for basic auth. `None` requires environment variable.
    #[serde(default)]
    pub api_token: Option<String>,

    /// Project key new tickets are filed under.
    #[serde(default = "default_project_key")]
    pub project_key: String,

    /// Per-request timeout.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Retries for transient (429/5xx) failures.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for JiraConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            email: None,
            api_token: None,
            project_key: default_project_key(),
            request_timeout_secs: default_request_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

fn default_project_key() -> String {
    "SUP".to_string()
}

fn default_request_timeout_secs() -> u64 {
    15
}

fn default_max_retries() -> u32 {
    2
}

/// WhatsApp gateway configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WhatsappConfig {
    /// Host address the webhook server binds.
    #[serde(default = "default_webhook_host")]
    pub webhook_host: String,

    /// Port the webhook server binds.
    #[serde(default = "default_webhook_port")]
    pub webhook_port: u16,

    /// Shared secret for HMAC-SHA256 webhook signature verification.
    /// `None` skips verification (sandbox use only).
    #[serde(default)]
    pub webhook_secret: Option<String>,

    /// Base URL of the outbound send API. `None` disables the real sender.
    #[serde(default)]
    pub api_base: Option<String>,

    /// API key for the outbound send API.
    #[serde(default)]
    pub api_key: Option<String>,

    /// API secret paired with the key.
    #[serde(default)]
    pub api_secret: Option<String>,

    /// Gallabox channel id stamped on every outbound message.
    #[serde(default)]
    pub channel_id: Option<String>,

    /// Window within which duplicate message ids are suppressed.
    #[serde(default = "default_dedup_window_secs")]
    pub dedup_window_secs: u64,

    /// Per-request timeout for outbound sends.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Retries for transient (429/5xx) send failures.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for WhatsappConfig {
    fn default() -> Self {
        Self {
            webhook_host: default_webhook_host(),
            webhook_port: default_webhook_port(),
            webhook_secret: None,
            api_base: None,
            api_key: None,
            api_secret: None,
            channel_id: None,
            dedup_window_secs: default_dedup_window_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

fn default_webhook_host() -> String {
    "127.0.0.1".to_string()
}

fn default_webhook_port() -> u16 {
    8392
}

fn default_dedup_window_secs() -> u64 {
    300
}

/// Language model configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LlmConfig {
    /// API key. `None` requires environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Base URL of a chat-completions compatible endpoint.
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,

    /// Model identifier.
    #[serde(default = "default_llm_model")]
    pub model: String,

    /// Per-request timeout.
    #[serde(default = "default_llm_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Retries for transient failures.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_llm_base_url(),
            model: default_llm_model(),
            request_timeout_secs: default_llm_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

fn default_llm_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_llm_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_llm_timeout_secs() -> u64 {
    20
}

/// Brokerage contact details substituted into response templates.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BusinessConfig {
    /// Sales team email shown in the property redirect template.
    #[serde(default = "default_business_email")]
    pub email: String,

    /// Public website shown in the property redirect template.
    #[serde(default = "default_business_website")]
    pub website: String,
}

impl Default for BusinessConfig {
    fn default() -> Self {
        Self {
            email: default_business_email(),
            website: default_business_website(),
        }
    }
}

fn default_business_email() -> String {
    "sales@example.com".to_string()
}

fn default_business_website() -> String {
    "https://example.com".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_knobs() {
        let config = MarhabaConfig::default();
        assert_eq!(config.pipeline.session_timeout_minutes, 30);
        assert_eq!(config.pipeline.confirmation_window_minutes, 60);
        assert_eq!(config.pipeline.max_history, 50);
        assert_eq!(config.pipeline.max_sessions, 10_000);
        assert_eq!(config.pipeline.sweep_interval_secs, 300);
        assert_eq!(config.pipeline.history_context_turns, 5);
        assert_eq!(config.jira.project_key, "SUP");
        assert_eq!(config.agent.name, "marhaba");
    }

    #[test]
    fn config_serializes_round_trip() {
        let config = MarhabaConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        let back: MarhabaConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(back.pipeline.max_history, config.pipeline.max_history);
        assert_eq!(back.whatsapp.webhook_port, config.whatsapp.webhook_port);
    }
}
