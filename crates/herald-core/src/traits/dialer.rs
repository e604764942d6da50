// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dialer trait for the external voice-agent and telephony APIs.

use async_trait::async_trait;

use crate::error::HeraldError;
use crate::types::{CreatedSession, SessionRequest};

/// Drives one phone call through the two external providers: the
/// voice-agent API (session create / status / transcript) and the
/// telephony API (PSTN call placement).
///
/// The job processor calls these four operations in sequence, awaiting
/// each before the next state transition. Implementations retry
/// transient failures internally for everything except [`place_call`],
/// which may have create side effects on partial failure and is
/// therefore surfaced to the caller on first error.
///
/// [`place_call`]: CallDialer::place_call
#[async_trait]
pub trait CallDialer: Send + Sync {
    /// Create a remote voice session and return its id plus signaling URL.
    async fn create_session(
        &self,
        request: &SessionRequest,
    ) -> Result<CreatedSession, HeraldError>;

    /// Place the PSTN call that streams audio to `join_url`.
    /// Returns the telephony provider's call id. Never retried.
    async fn place_call(&self, to_number: &str, join_url: &str)
        -> Result<String, HeraldError>;

    /// Poll the session on a fixed interval until it terminates or the
    /// monitoring ceiling elapses. Returns the end reason; on ceiling
    /// expiry that is the sentinel `"MonitoringTimeout"`, after a
    /// best-effort forced hangup of the telephony leg.
    async fn monitor_until_ended(
        &self,
        session_id: &str,
        telephony_call_id: &str,
    ) -> Result<String, HeraldError>;

    /// Fetch the session's message list and render it as a newline-joined
    /// transcript with fixed per-role formatting.
    async fn fetch_transcript(&self, session_id: &str) -> Result<String, HeraldError>;
}
