// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Herald call pipeline.

use thiserror::Error;

/// The primary error type used across all Herald crates.
#[derive(Debug, Error)]
pub enum HeraldError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, conversion).
    #[error("storage error: {source}")]
    Store {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Voice-agent API errors (non-2xx after retries, malformed response body).
    ///
    /// `body` carries the last raw response body, truncated, for diagnostics.
    #[error("call gateway error: {message}")]
    Gateway {
        message: String,
        body: Option<String>,
    },

    /// Telephony call placement failed. Never retried internally.
    #[error("telephony error: {message}")]
    Telephony { message: String },

    /// Strategist LLM failure: API error after retries, or a response that
    /// stayed malformed/incomplete through the whole retry budget.
    ///
    /// `raw_response` carries the last model output so the failure can be
    /// diagnosed from the attempt record.
    #[error("strategist error: {message}")]
    Strategist {
        message: String,
        raw_response: Option<String>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors, including illegal state transitions.
    #[error("internal error: {0}")]
    Internal(String),
}

impl HeraldError {
    /// Build a storage error from any boxable source.
    pub fn store<E>(source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Store {
            source: Box::new(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn herald_error_has_all_variants() {
        // Verify all 7 error variants exist and can be constructed.
        let _config = HeraldError::Config("test".into());
        let _store = HeraldError::Store {
            source: Box::new(std::io::Error::other("test")),
        };
        let _gateway = HeraldError::Gateway {
            message: "test".into(),
            body: None,
        };
        let _telephony = HeraldError::Telephony {
            message: "test".into(),
        };
        let _strategist = HeraldError::Strategist {
            message: "test".into(),
            raw_response: Some("{}".into()),
        };
        let _timeout = HeraldError::Timeout {
            duration: std::time::Duration::from_secs(300),
        };
        let _internal = HeraldError::Internal("test".into());
    }

    #[test]
    fn gateway_error_display_includes_message() {
        let err = HeraldError::Gateway {
            message: "voice API returned 500".into(),
            body: Some("{\"detail\":\"upstream\"}".into()),
        };
        assert!(err.to_string().contains("voice API returned 500"));
    }

    #[test]
    fn store_helper_boxes_source() {
        let err = HeraldError::store(std::io::Error::other("disk gone"));
        assert!(err.to_string().contains("disk gone"));
    }
}
