// SPDX-FileCopyrightText: 2026 Marhaba Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Marhaba concierge.

use thiserror::Error;

/// The primary error type used across all Marhaba collaborator traits and
/// core operations.
///
/// Session and draft absence is never an error; those surface as `Option`
/// through the store APIs. This enum only covers configuration problems and
/// collaborator failures.
#[derive(Debug, Error)]
pub enum MarhabaError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Messaging channel errors (send failure, webhook payload problems, rate limiting).
    #[error("channel error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Ticket tracker errors (API failure, unknown ticket key, auth rejection).
    #[error("tracker error: {message}")]
    Tracker {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Language model errors (API failure, token limits, unparseable output).
    #[error("model error: {message}")]
    Model {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl MarhabaError {
    /// Whether a retry at the collaborator boundary could plausibly succeed.
    ///
    /// Timeouts and collaborator failures are transient; configuration and
    /// internal errors are not.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            MarhabaError::Channel { .. }
                | MarhabaError::Tracker { .. }
                | MarhabaError::Model { .. }
                | MarhabaError::Timeout { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_includes_context() {
        let e = MarhabaError::Tracker {
            message: "503 from upstream".into(),
            source: None,
        };
        assert_eq!(e.to_string(), "tracker error: 503 from upstream");

        let e = MarhabaError::Config("missing project key".into());
        assert_eq!(e.to_string(), "configuration error: missing project key");
    }

    #[test]
    fn transient_classification() {
        assert!(MarhabaError::Model {
            message: "x".into(),
            source: None
        }
        .is_transient());
        assert!(MarhabaError::Timeout {
            duration: std::time::Duration::from_secs(5)
        }
        .is_transient());
        assert!(!MarhabaError::Config("x".into()).is_transient());
        assert!(!MarhabaError::Internal("x".into()).is_transient());
    }
}
