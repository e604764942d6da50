// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock dialer for deterministic testing.
//!
//! `MockDialer` implements `CallDialer` with pre-configured step results,
//! enabling fast, CI-runnable processor tests without external API calls.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use herald_core::{CallDialer, CreatedSession, HeraldError, SessionRequest};

/// A mock dialer that returns scripted results for each pipeline step.
///
/// Results are popped from per-step FIFO queues. When a queue is empty a
/// benign default is returned, so tests only script the steps they care
/// about. Session requests are recorded for assertion.
pub struct MockDialer {
    sessions: Mutex<VecDeque<Result<CreatedSession, HeraldError>>>,
    calls: Mutex<VecDeque<Result<String, HeraldError>>>,
    end_reasons: Mutex<VecDeque<String>>,
    transcripts: Mutex<VecDeque<Result<String, HeraldError>>>,
    seen_requests: Arc<Mutex<Vec<SessionRequest>>>,
}

impl MockDialer {
    /// Create a mock dialer whose every step succeeds with defaults.
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(VecDeque::new()),
            calls: Mutex::new(VecDeque::new()),
            end_reasons: Mutex::new(VecDeque::new()),
            transcripts: Mutex::new(VecDeque::new()),
            seen_requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queue a session-creation result.
    pub async fn push_session(&self, result: Result<CreatedSession, HeraldError>) {
        self.sessions.lock().await.push_back(result);
    }

    /// Queue a call-placement result.
    pub async fn push_call(&self, result: Result<String, HeraldError>) {
        self.calls.lock().await.push_back(result);
    }

    /// Queue a monitoring end reason.
    pub async fn push_end_reason(&self, end_reason: impl Into<String>) {
        self.end_reasons.lock().await.push_back(end_reason.into());
    }

    /// Queue a transcript result.
    pub async fn push_transcript(&self, result: Result<String, HeraldError>) {
        self.transcripts.lock().await.push_back(result);
    }

    /// Session requests observed so far, in call order.
    pub async fn seen_requests(&self) -> Vec<SessionRequest> {
        self.seen_requests.lock().await.clone()
    }
}

impl Default for MockDialer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CallDialer for MockDialer {
    async fn create_session(
        &self,
        request: &SessionRequest,
    ) -> Result<CreatedSession, HeraldError> {
        self.seen_requests.lock().await.push(request.clone());
        self.sessions.lock().await.pop_front().unwrap_or_else(|| {
            Ok(CreatedSession {
                session_id: "mock-session".to_string(),
                join_url: "wss://mock.voice/join".to_string(),
            })
        })
    }

    async fn place_call(
        &self,
        _to_number: &str,
        _join_url: &str,
    ) -> Result<String, HeraldError> {
        self.calls
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Ok("mock-telephony-call".to_string()))
    }

    async fn monitor_until_ended(
        &self,
        _session_id: &str,
        _telephony_call_id: &str,
    ) -> Result<String, HeraldError> {
        Ok(self
            .end_reasons
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| "hangup".to_string()))
    }

    async fn fetch_transcript(&self, _session_id: &str) -> Result<String, HeraldError> {
        self.transcripts
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Ok("Agent: Hello\nUser: Hi".to_string()))
    }
}
