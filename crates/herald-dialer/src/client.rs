// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP dialer driving the voice-agent and telephony APIs.
//!
//! Provides [`HttpDialer`], which handles session creation, PSTN call
//! placement, fixed-interval call monitoring with a hard ceiling, and
//! transcript retrieval. All voice-API requests go through one retrying
//! helper; telephony call placement is deliberately never retried, since
//! a partial failure there may already have placed a call.

use std::time::Duration;

use async_trait::async_trait;
use herald_config::model::{TelephonyConfig, VoiceConfig};
use herald_core::{CallDialer, CreatedSession, HeraldError, SessionRequest};
use tracing::{debug, info, warn};

use crate::transcript;
use crate::types::{
    CallStatusResponse, CreateCallResponse, MessagesResponse, TelephonyCallResponse,
};

/// End reason recorded when the monitoring ceiling elapses before the
/// call terminates on its own.
pub const MONITORING_TIMEOUT_REASON: &str = "MonitoringTimeout";

/// Raw response bodies carried on errors are truncated to this length.
const ERROR_BODY_LIMIT: usize = 500;

/// Production [`CallDialer`] over HTTP.
pub struct HttpDialer {
    client: reqwest::Client,
    api_key: String,
    agent_id: String,
    voice_base_url: String,
    request_retries: u32,
    retry_delay: Duration,
    monitor_timeout: Duration,
    monitor_interval: Duration,
    telephony_base_url: String,
    account_sid: String,
    auth_token: String,
    from_number: String,
}

impl HttpDialer {
    /// Build a dialer from the voice and telephony config sections.
    ///
    /// Fails with a config error when a credential required for outbound
    /// calling is absent.
    pub fn new(voice: &VoiceConfig, telephony: &TelephonyConfig) -> Result<Self, HeraldError> {
        let api_key = voice
            .api_key
            .clone()
            .ok_or_else(|| HeraldError::Config("voice.api_key is required".into()))?;
        let agent_id = voice
            .agent_id
            .clone()
            .ok_or_else(|| HeraldError::Config("voice.agent_id is required".into()))?;
        let account_sid = telephony
            .account_sid
            .clone()
            .ok_or_else(|| HeraldError::Config("telephony.account_sid is required".into()))?;
        let auth_token = telephony
            .auth_token
            .clone()
            .ok_or_else(|| HeraldError::Config("telephony.auth_token is required".into()))?;
        let from_number = telephony
            .from_number
            .clone()
            .ok_or_else(|| HeraldError::Config("telephony.from_number is required".into()))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| HeraldError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            agent_id,
            voice_base_url: voice.base_url.clone(),
            request_retries: voice.request_retries,
            retry_delay: Duration::from_secs(voice.retry_delay_secs),
            monitor_timeout: Duration::from_secs(voice.monitor_timeout_secs),
            monitor_interval: Duration::from_secs(voice.monitor_interval_secs),
            telephony_base_url: telephony.base_url.clone(),
            account_sid,
            auth_token,
            from_number,
        })
    }

    /// Overrides both base URLs (for testing with wiremock).
    #[cfg(test)]
    fn with_base_urls(mut self, voice: String, telephony: String) -> Self {
        self.voice_base_url = voice;
        self.telephony_base_url = telephony;
        self
    }

    /// Overrides monitoring timing (for fast tests).
    #[cfg(test)]
    fn with_monitor_timing(mut self, interval: Duration, timeout: Duration) -> Self {
        self.monitor_interval = interval;
        self.monitor_timeout = timeout;
        self
    }

    /// Send one voice-API request with the shared retry policy: up to
    /// `request_retries` extra attempts with linearly increasing delay.
    /// 4xx responses other than 429 are raised immediately; 5xx, 429, and
    /// network failures are retried until the budget is exhausted.
    async fn voice_request(
        &self,
        method: reqwest::Method,
        url: &str,
        payload: Option<&serde_json::Value>,
        desc: &str,
    ) -> Result<serde_json::Value, HeraldError> {
        let mut last_error = None;

        for attempt in 0..=self.request_retries {
            if attempt > 0 {
                let delay = self.retry_delay * attempt;
                warn!(desc, attempt, ?delay, "retrying voice API request");
                tokio::time::sleep(delay).await;
            }

            let mut request = self
                .client
                .request(method.clone(), url)
                .header("X-API-Key", &self.api_key);
            if let Some(body) = payload {
                request = request.json(body);
            }

            let response = match request.send().await {
                Ok(response) => response,
                Err(e) => {
                    warn!(desc, attempt, error = %e, "voice API request failed");
                    last_error = Some(HeraldError::Gateway {
                        message: format!("{desc}: request failed: {e}"),
                        body: None,
                    });
                    continue;
                }
            };

            let status = response.status();
            debug!(desc, %status, attempt, "voice API response received");

            if status.is_success() {
                let text = response.text().await.unwrap_or_default();
                if text.is_empty() {
                    return Ok(serde_json::Value::Null);
                }
                return serde_json::from_str(&text).map_err(|e| HeraldError::Gateway {
                    message: format!("{desc}: malformed response body: {e}"),
                    body: Some(truncate_body(&text)),
                });
            }

            let body = response.text().await.unwrap_or_default();
            if status.is_client_error() && status.as_u16() != 429 {
                return Err(HeraldError::Gateway {
                    message: format!("{desc}: client error {status}, not retrying"),
                    body: Some(truncate_body(&body)),
                });
            }

            warn!(desc, %status, attempt, "transient voice API error");
            last_error = Some(HeraldError::Gateway {
                message: format!("{desc}: API returned {status}"),
                body: Some(truncate_body(&body)),
            });
        }

        Err(last_error.unwrap_or_else(|| HeraldError::Gateway {
            message: format!("{desc}: request failed after retries"),
            body: None,
        }))
    }

    /// One status poll of a live session.
    async fn session_status(&self, session_id: &str) -> Result<CallStatusResponse, HeraldError> {
        let url = format!("{}/calls/{session_id}", self.voice_base_url);
        let value = self
            .voice_request(reqwest::Method::GET, &url, None, "poll session status")
            .await?;
        serde_json::from_value(value).map_err(|e| HeraldError::Gateway {
            message: format!("poll session status: malformed status body: {e}"),
            body: None,
        })
    }

    /// Best-effort forced hangup of the telephony leg.
    async fn end_call(&self, telephony_call_id: &str) -> Result<(), HeraldError> {
        let url = format!(
            "{}/2010-04-01/Accounts/{}/Calls/{telephony_call_id}.json",
            self.telephony_base_url, self.account_sid
        );
        let response = self
            .client
            .post(&url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&[("Status", "completed")])
            .send()
            .await
            .map_err(|e| HeraldError::Telephony {
                message: format!("force-end request failed: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(HeraldError::Telephony {
                message: format!("force-end returned {status}"),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl CallDialer for HttpDialer {
    async fn create_session(
        &self,
        request: &SessionRequest,
    ) -> Result<CreatedSession, HeraldError> {
        let url = format!("{}/agents/{}/calls", self.voice_base_url, self.agent_id);
        let payload = serde_json::json!({
            "medium": { "telephony": {} },
            "firstSpeakerSettings": { "agent": { "uninterruptible": false } },
            "templateContext": {
                "company_name": request.company_name,
                "contact_name": request.contact_name,
                "call_objective": request.objective,
            },
            "metadata": {
                "job_id": request.job_id.to_string(),
                "attempt_id": request.attempt_id.to_string(),
            },
            "recordingEnabled": true,
        });

        let value = self
            .voice_request(reqwest::Method::POST, &url, Some(&payload), "create session")
            .await?;
        let body_snippet = truncate_body(&value.to_string());
        let parsed: CreateCallResponse =
            serde_json::from_value(value).map_err(|e| HeraldError::Gateway {
                message: format!("create session: malformed response: {e}"),
                body: Some(body_snippet.clone()),
            })?;

        match (parsed.call_id, parsed.join_url) {
            (Some(session_id), Some(join_url)) => {
                info!(%session_id, "voice session created");
                Ok(CreatedSession {
                    session_id,
                    join_url,
                })
            }
            _ => Err(HeraldError::Gateway {
                message: "create session: response missing callId or joinUrl".into(),
                body: Some(body_snippet),
            }),
        }
    }

    async fn place_call(
        &self,
        to_number: &str,
        join_url: &str,
    ) -> Result<String, HeraldError> {
        let url = format!(
            "{}/2010-04-01/Accounts/{}/Calls.json",
            self.telephony_base_url, self.account_sid
        );
        let twiml = build_twiml(join_url);

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&[
                ("To", to_number),
                ("From", self.from_number.as_str()),
                ("Twiml", twiml.as_str()),
            ])
            .send()
            .await
            .map_err(|e| HeraldError::Telephony {
                message: format!("call placement request failed: {e}"),
            })?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(HeraldError::Telephony {
                message: format!(
                    "call placement returned {status}: {}",
                    truncate_body(&body)
                ),
            });
        }

        let parsed: TelephonyCallResponse =
            serde_json::from_str(&body).map_err(|e| HeraldError::Telephony {
                message: format!("call placement returned malformed body: {e}"),
            })?;
        let sid = parsed.sid.ok_or_else(|| HeraldError::Telephony {
            message: "call placement response missing sid".into(),
        })?;
        info!(telephony_call_id = %sid, "telephony call placed");
        Ok(sid)
    }

    async fn monitor_until_ended(
        &self,
        session_id: &str,
        telephony_call_id: &str,
    ) -> Result<String, HeraldError> {
        let start = tokio::time::Instant::now();

        loop {
            if start.elapsed() >= self.monitor_timeout {
                warn!(
                    session_id,
                    elapsed_secs = start.elapsed().as_secs(),
                    "call monitoring ceiling elapsed"
                );
                // Best-effort hangup of the telephony leg; the attempt
                // proceeds to transcript retrieval either way.
                if let Err(e) = self.end_call(telephony_call_id).await {
                    warn!(telephony_call_id, error = %e, "failed to force-end telephony call");
                }
                return Ok(MONITORING_TIMEOUT_REASON.to_string());
            }

            tokio::time::sleep(self.monitor_interval).await;

            match self.session_status(session_id).await {
                Ok(status) if status.is_terminal() => {
                    let end_reason = status.end_reason.unwrap_or_else(|| "Unknown".to_string());
                    info!(session_id, %end_reason, "call termination detected");
                    return Ok(end_reason);
                }
                Ok(_) => {
                    debug!(session_id, "call still in progress");
                }
                // A failed poll round is not fatal; the ceiling decides.
                Err(e) => {
                    warn!(session_id, error = %e, "status poll failed, will poll again");
                }
            }
        }
    }

    async fn fetch_transcript(&self, session_id: &str) -> Result<String, HeraldError> {
        let url = format!("{}/calls/{session_id}/messages", self.voice_base_url);
        let value = self
            .voice_request(reqwest::Method::GET, &url, None, "fetch transcript")
            .await?;
        let parsed: MessagesResponse =
            serde_json::from_value(value).map_err(|e| HeraldError::Gateway {
                message: format!("fetch transcript: malformed response: {e}"),
                body: None,
            })?;
        let text = transcript::format_transcript(&parsed.results);
        debug!(session_id, chars = text.len(), "transcript retrieved");
        Ok(text)
    }
}

/// TwiML connecting the telephony audio stream to the voice session.
///
/// The join URL is embedded verbatim: its ampersands must reach the
/// provider unescaped.
fn build_twiml(join_url: &str) -> String {
    format!("<Response><Connect><Stream url=\"{join_url}\"/></Connect></Response>")
}

fn truncate_body(body: &str) -> String {
    body.chars().take(ERROR_BODY_LIMIT).collect()
}
