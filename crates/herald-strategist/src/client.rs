// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the strategist's chat-completions endpoint.
//!
//! Provides [`OpenAiStrategist`], which sends the analysis prompt, parses
//! the model's JSON verdict into an [`ActionPlan`], and retries malformed
//! output or API failures with linear backoff. After the budget is
//! exhausted it returns an explicit strategist error carrying the last
//! raw response; it never invents a fallback plan.
//!
//! [`ActionPlan`]: herald_core::ActionPlan

use std::time::Duration;

use async_trait::async_trait;
use herald_config::model::StrategistConfig;
use herald_core::types::{ActionPlan, Attempt, Job};
use herald_core::{HeraldError, OutcomeStrategist};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::prompt;

/// Production [`OutcomeStrategist`] over an OpenAI-style API.
pub struct OpenAiStrategist {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    request_retries: u32,
    retry_delay: Duration,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatCompletionMessage,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiStrategist {
    /// Build a strategist client from its config section.
    pub fn new(config: &StrategistConfig) -> Result<Self, HeraldError> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| HeraldError::Config("strategist.api_key is required".into()))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| HeraldError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            model: config.model.clone(),
            base_url: config.base_url.clone(),
            request_retries: config.request_retries,
            retry_delay: Duration::from_secs(config.retry_delay_secs),
        })
    }

    /// Overrides the base URL (for testing with wiremock).
    #[cfg(test)]
    fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }

    async fn request_completion(&self, prompt_text: &str) -> Result<String, HeraldError> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": prompt::SYSTEM_PROMPT },
                { "role": "user", "content": prompt_text },
            ],
            "response_format": { "type": "json_object" },
            "temperature": 0.2,
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| HeraldError::Strategist {
                message: format!("completion request failed: {e}"),
                raw_response: None,
            })?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(HeraldError::Strategist {
                message: format!("completion API returned {status}"),
                raw_response: Some(text),
            });
        }

        let parsed: ChatCompletionResponse =
            serde_json::from_str(&text).map_err(|e| HeraldError::Strategist {
                message: format!("malformed completion envelope: {e}"),
                raw_response: Some(text.clone()),
            })?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(HeraldError::Strategist {
                message: "completion response had no content".into(),
                raw_response: Some(text),
            })
    }
}

#[async_trait]
impl OutcomeStrategist for OpenAiStrategist {
    async fn evaluate(
        &self,
        job: &Job,
        transcript: &str,
        history: &[Attempt],
    ) -> Result<ActionPlan, HeraldError> {
        let prompt_text = prompt::build_prompt(job, transcript, history);
        info!(
            job_id = job.id,
            prompt_chars = prompt_text.len(),
            model = %self.model,
            "requesting strategist verdict"
        );

        let mut last_error = None;

        for attempt in 0..=self.request_retries {
            if attempt > 0 {
                let delay = self.retry_delay * attempt;
                warn!(job_id = job.id, attempt, ?delay, "retrying strategist call");
                tokio::time::sleep(delay).await;
            }

            let content = match self.request_completion(&prompt_text).await {
                Ok(content) => content,
                Err(e) => {
                    warn!(job_id = job.id, attempt, error = %e, "strategist API call failed");
                    last_error = Some(e);
                    continue;
                }
            };

            match serde_json::from_str::<ActionPlan>(&content) {
                Ok(plan) => {
                    debug!(job_id = job.id, next_action = %plan.next_action, "action plan parsed");
                    return Ok(plan);
                }
                Err(e) => {
                    warn!(
                        job_id = job.id,
                        attempt,
                        error = %e,
                        "strategist output failed schema validation"
                    );
                    last_error = Some(HeraldError::Strategist {
                        message: format!("response failed schema validation: {e}"),
                        raw_response: Some(content),
                    });
                }
            }
        }

        Err(last_error.unwrap_or(HeraldError::Strategist {
            message: "all strategist attempts failed".into(),
            raw_response: None,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use herald_core::types::{JobStatus, NextAction};
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_strategist(base_url: &str) -> OpenAiStrategist {
        let config = StrategistConfig {
            api_key: Some("sk-test".into()),
            retry_delay_secs: 0,
            ..StrategistConfig::default()
        };
        OpenAiStrategist::new(&config)
            .unwrap()
            .with_base_url(base_url.to_string())
    }

    fn test_job() -> Job {
        Job {
            id: 7,
            phone_number: "+15550001234".into(),
            contact_name: "Mr. Smith".into(),
            company_name: "Acme Front Desk".into(),
            initial_objective: "Confirm the timeline".into(),
            current_objective: "Confirm the timeline".into(),
            overall_status: JobStatus::Processing,
            retries_attempted: 0,
            max_retries: 3,
            final_summary: None,
            informed: false,
            next_retry_at: None,
            created_at: "2026-03-01T10:00:00.000Z".into(),
            updated_at: "2026-03-01T10:00:00.000Z".into(),
        }
    }

    fn completion_body(content: &serde_json::Value) -> serde_json::Value {
        serde_json::json!({
            "id": "chatcmpl-test",
            "choices": [
                { "index": 0, "message": { "role": "assistant", "content": content.to_string() } }
            ]
        })
    }

    #[tokio::test]
    async fn evaluate_parses_a_valid_plan() {
        let server = MockServer::start().await;
        let plan = serde_json::json!({
            "summary_for_user": "The contact confirmed the timeline.",
            "objective_met_status": "MET",
            "next_action": "MARK_COMPLETED_SUCCESS",
            "reasoning": "Objective explicitly confirmed in the transcript.",
            "next_objective_if_retry": null,
            "requested_retry_delay_minutes": null
        });
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(serde_json::json!({
                "response_format": { "type": "json_object" },
                "temperature": 0.2,
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body(&plan)))
            .expect(1)
            .mount(&server)
            .await;

        let strategist = test_strategist(&server.uri());
        let result = strategist
            .evaluate(&test_job(), "Agent: Hello\nUser: Confirmed.", &[])
            .await
            .unwrap();
        assert_eq!(result.next_action, NextAction::MarkCompletedSuccess);
        assert!(result.summary_for_user.contains("confirmed"));
    }

    #[tokio::test]
    async fn missing_required_key_exhausts_budget_with_raw_response() {
        let server = MockServer::start().await;
        // `reasoning` missing on every attempt: 1 initial + 2 retries.
        let bad_plan = serde_json::json!({
            "summary_for_user": "something happened",
            "objective_met_status": "MET",
            "next_action": "MARK_COMPLETED_SUCCESS"
        });
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body(&bad_plan)))
            .expect(3)
            .mount(&server)
            .await;

        let strategist = test_strategist(&server.uri());
        let err = strategist
            .evaluate(&test_job(), "transcript", &[])
            .await
            .unwrap_err();
        match err {
            HeraldError::Strategist {
                message,
                raw_response,
            } => {
                assert!(message.contains("schema validation"), "got: {message}");
                assert!(raw_response.unwrap().contains("something happened"));
            }
            other => panic!("expected strategist error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_json_recovers_on_retry() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body(
                &serde_json::Value::String("not json at all".into()),
            )))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        let good_plan = serde_json::json!({
            "summary_for_user": "Recovered.",
            "objective_met_status": "INCONCLUSIVE_CHECK_RETRY",
            "next_action": "SCHEDULE_RETRY",
            "reasoning": "Line quality was poor.",
            "next_objective_if_retry": "Call again and confirm the timeline.",
            "requested_retry_delay_minutes": 30
        });
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body(&good_plan)))
            .mount(&server)
            .await;

        let strategist = test_strategist(&server.uri());
        let result = strategist
            .evaluate(&test_job(), "transcript", &[])
            .await
            .unwrap();
        assert_eq!(result.next_action, NextAction::ScheduleRetry);
        assert_eq!(result.requested_retry_delay_minutes, Some(30));
    }

    #[tokio::test]
    async fn api_errors_exhaust_to_strategist_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("upstream down"))
            .expect(3)
            .mount(&server)
            .await;

        let strategist = test_strategist(&server.uri());
        let err = strategist
            .evaluate(&test_job(), "transcript", &[])
            .await
            .unwrap_err();
        match err {
            HeraldError::Strategist { message, .. } => {
                assert!(message.contains("500"), "got: {message}");
            }
            other => panic!("expected strategist error, got {other:?}"),
        }
    }

    #[test]
    fn missing_api_key_fails_construction() {
        let config = StrategistConfig::default();
        assert!(matches!(
            OpenAiStrategist::new(&config),
            Err(HeraldError::Config(_))
        ));
    }
}
