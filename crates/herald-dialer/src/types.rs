// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wire types for the voice-agent and telephony APIs.

use serde::Deserialize;

/// Response body of the voice API's create-call endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCallResponse {
    #[serde(default)]
    pub call_id: Option<String>,
    #[serde(default)]
    pub join_url: Option<String>,
}

/// Response body of the voice API's call-status endpoint.
///
/// The call is terminal once either field is present.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallStatusResponse {
    /// Termination timestamp, absent while the call is live.
    #[serde(default)]
    pub ended: Option<String>,
    #[serde(default)]
    pub end_reason: Option<String>,
}

impl CallStatusResponse {
    pub fn is_terminal(&self) -> bool {
        self.ended.is_some() || self.end_reason.is_some()
    }
}

/// Response body of the voice API's message-list endpoint.
#[derive(Debug, Deserialize)]
pub struct MessagesResponse {
    #[serde(default)]
    pub results: Vec<TranscriptMessage>,
}

/// One message of a call transcript.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptMessage {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub tool_name: Option<String>,
}

/// Response body of the telephony create-call endpoint.
#[derive(Debug, Deserialize)]
pub struct TelephonyCallResponse {
    #[serde(default)]
    pub sid: Option<String>,
}
