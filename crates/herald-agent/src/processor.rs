// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The job processor: one attempt end-to-end.
//!
//! Drives a claimed job through the five pipeline steps (create remote
//! session, place telephony call, monitor to termination, fetch
//! transcript, consult the strategist), advancing the attempt row's
//! status after each step and finally applying the strategist's decision
//! to the parent job. There is no branching concurrency within an
//! attempt; each step completes or fails before the next begins, and
//! every code path ends in an explicit status write.

use std::sync::Arc;
use std::time::Duration;

use herald_core::time::{now_iso, now_plus_minutes, now_plus_secs};
use herald_core::types::{
    ActionPlan, AttemptPatch, AttemptStatus, JobPatch, JobStatus, NextAction,
    ObjectiveMetStatus, SessionRequest,
};
use herald_core::{CallDialer, HeraldError, Job, OutcomeStrategist};
use herald_storage::queries::{attempts, jobs};
use herald_storage::Database;
use tracing::{error, info, warn};

/// End reason sentinel set by the dialer when the monitoring ceiling
/// elapses. Kept in sync with the dialer's monitor loop.
const MONITORING_TIMEOUT_REASON: &str = "MonitoringTimeout";

/// Diagnostic strings are truncated to this length before storage.
const ERROR_DETAIL_LIMIT: usize = 200;

/// Processes one claimed job at a time through its next attempt.
pub struct JobProcessor {
    db: Database,
    dialer: Arc<dyn CallDialer>,
    strategist: Arc<dyn OutcomeStrategist>,
    /// The scheduler's poll interval; the default retry cool-down is
    /// twice this.
    poll_interval: Duration,
}

impl JobProcessor {
    pub fn new(
        db: Database,
        dialer: Arc<dyn CallDialer>,
        strategist: Arc<dyn OutcomeStrategist>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            db,
            dialer,
            strategist,
            poll_interval,
        }
    }

    /// Run the next attempt for a claimed (PROCESSING) job.
    ///
    /// Never returns an error: failures are converted into terminal
    /// status writes so the scheduler keeps polling regardless of any
    /// individual job's outcome.
    pub async fn process(&self, job: &Job) {
        let attempt_number = job.retries_attempted + 1;
        let objective = job.current_objective.clone();

        let attempt_id = match attempts::insert_attempt(
            &self.db,
            job.id,
            attempt_number,
            &objective,
        )
        .await
        {
            Ok(id) => id,
            Err(e) => {
                error!(job_id = job.id, error = %e, "failed to create attempt record");
                self.fail_job(job.id, "Internal storage error creating the attempt record.")
                    .await;
                return;
            }
        };

        info!(
            job_id = job.id,
            attempt_id,
            attempt_number,
            contact = %job.contact_name,
            "attempt started"
        );

        if let Err(e) = self.run_attempt(job, attempt_id, &objective).await {
            error!(job_id = job.id, attempt_id, error = %e, "attempt processing failed");
            let details = truncate_details(&e.to_string());
            if let Err(e2) = attempts::update_attempt(
                &self.db,
                attempt_id,
                AttemptPatch {
                    attempt_status: Some(AttemptStatus::ProcessingError),
                    end_reason: Some("ProcessingError".to_string()),
                    error_details: Some(details.clone()),
                    ended_at: Some(now_iso()),
                    ..AttemptPatch::default()
                },
            )
            .await
            {
                error!(attempt_id, error = %e2, "failed to record attempt error");
            }
            self.fail_job(job.id, &format!("Call processing error: {details}"))
                .await;
        }
    }

    /// The five pipeline steps. A returned error means an unrecoverable
    /// step failure; the caller records it as PROCESSING_ERROR. The
    /// strategist-failed path is handled here because it has its own
    /// attempt status.
    async fn run_attempt(
        &self,
        job: &Job,
        attempt_id: i64,
        objective: &str,
    ) -> Result<(), HeraldError> {
        // 1. Create the remote voice session.
        let session = self
            .dialer
            .create_session(&SessionRequest {
                company_name: job.company_name.clone(),
                contact_name: job.contact_name.clone(),
                objective: objective.to_string(),
                job_id: job.id,
                attempt_id,
            })
            .await?;
        attempts::update_attempt(
            &self.db,
            attempt_id,
            AttemptPatch {
                session_id: Some(session.session_id.clone()),
                attempt_status: Some(AttemptStatus::CallPending),
                ..AttemptPatch::default()
            },
        )
        .await?;

        // 2. Place the telephony call.
        let telephony_call_id = self
            .dialer
            .place_call(&job.phone_number, &session.join_url)
            .await?;
        attempts::update_attempt(
            &self.db,
            attempt_id,
            AttemptPatch {
                telephony_call_id: Some(telephony_call_id.clone()),
                attempt_status: Some(AttemptStatus::Monitoring),
                ..AttemptPatch::default()
            },
        )
        .await?;

        // 3. Monitor until the call terminates or the ceiling elapses.
        let end_reason = self
            .dialer
            .monitor_until_ended(&session.session_id, &telephony_call_id)
            .await?;
        if end_reason == MONITORING_TIMEOUT_REASON {
            warn!(job_id = job.id, attempt_id, "call monitoring timed out");
            attempts::update_attempt(
                &self.db,
                attempt_id,
                AttemptPatch {
                    attempt_status: Some(AttemptStatus::MonitoringTimeout),
                    error_details: Some(
                        "Call did not end within the monitoring period.".to_string(),
                    ),
                    ..AttemptPatch::default()
                },
            )
            .await?;
        }
        attempts::update_attempt(
            &self.db,
            attempt_id,
            AttemptPatch {
                end_reason: Some(end_reason),
                attempt_status: Some(AttemptStatus::TranscriptPending),
                ..AttemptPatch::default()
            },
        )
        .await?;

        // 4. Fetch and store the transcript.
        let transcript = self.dialer.fetch_transcript(&session.session_id).await?;
        attempts::update_attempt(
            &self.db,
            attempt_id,
            AttemptPatch {
                transcript: Some(transcript.clone()),
                attempt_status: Some(AttemptStatus::StrategyPending),
                ..AttemptPatch::default()
            },
        )
        .await?;

        // 5. Consult the strategist with the history of *other* attempts.
        let history: Vec<_> = attempts::attempts_for_job(&self.db, job.id)
            .await?
            .into_iter()
            .filter(|a| a.id != attempt_id)
            .collect();
        match self.strategist.evaluate(job, &transcript, &history).await {
            Ok(plan) => self.apply_plan(job, attempt_id, plan).await,
            Err(e) => {
                error!(job_id = job.id, attempt_id, error = %e, "strategist failed");
                attempts::update_attempt(
                    &self.db,
                    attempt_id,
                    AttemptPatch {
                        attempt_status: Some(AttemptStatus::StrategyFailed),
                        reasoning: Some(format!("Strategist error: {e}")),
                        ended_at: Some(now_iso()),
                        ..AttemptPatch::default()
                    },
                )
                .await?;
                self.fail_job(
                    job.id,
                    &format!("Call analysis failed: {}", truncate_details(&e.to_string())),
                )
                .await;
                Ok(())
            }
        }
    }

    /// Record the strategist's verdict on the attempt and apply the
    /// (override-checked) decision to the parent job.
    async fn apply_plan(
        &self,
        job: &Job,
        attempt_id: i64,
        plan: ActionPlan,
    ) -> Result<(), HeraldError> {
        let attempts_made = job.retries_attempted + 1;
        let decision = resolve_decision(&plan, attempts_made, job.max_retries);
        if decision != plan.next_action {
            info!(
                job_id = job.id,
                raw = %plan.next_action,
                effective = %decision,
                "strategist decision overridden"
            );
        }

        attempts::update_attempt(
            &self.db,
            attempt_id,
            AttemptPatch {
                summary: Some(plan.summary_for_user.clone()),
                objective_met_status: Some(plan.objective_met_status),
                reasoning: Some(plan.reasoning.clone()),
                attempt_status: Some(AttemptStatus::CompletedAnalyzed),
                ended_at: Some(now_iso()),
                ..AttemptPatch::default()
            },
        )
        .await?;

        let mut patch = JobPatch {
            final_summary: Some(plan.summary_for_user.clone()),
            ..JobPatch::default()
        };
        match decision {
            NextAction::MarkCompletedSuccess => {
                patch.overall_status = Some(JobStatus::CompletedSuccess);
            }
            NextAction::ScheduleRetry => {
                patch.overall_status = Some(JobStatus::RetryScheduled);
                patch.retries_attempted = Some(attempts_made);
                patch.current_objective = Some(
                    plan.next_objective_if_retry
                        .clone()
                        .unwrap_or_else(|| job.current_objective.clone()),
                );
                let next_retry_at = match plan.requested_retry_delay_minutes {
                    Some(minutes) if minutes > 0 => now_plus_minutes(i64::from(minutes)),
                    // Default cool-down: wait two poll cycles.
                    _ => now_plus_secs((self.poll_interval.as_secs() * 2) as i64),
                };
                patch.next_retry_at = Some(Some(next_retry_at));
            }
            NextAction::MarkFailedObjectiveUnachieved => {
                patch.overall_status = Some(JobStatus::CompletedObjectiveNotMet);
            }
            NextAction::MarkFailedMaxRetries => {
                patch.overall_status = Some(JobStatus::FailedMaxRetries);
            }
        }

        jobs::update_job(&self.db, job.id, patch).await?;
        info!(job_id = job.id, attempt_id, decision = %decision, "job updated");
        Ok(())
    }

    /// Terminal fail path. Errors here are logged, not propagated: the
    /// scheduler must keep polling no matter what.
    async fn fail_job(&self, job_id: i64, summary: &str) {
        let patch = JobPatch {
            overall_status: Some(JobStatus::FailedPermanentError),
            final_summary: Some(summary.to_string()),
            ..JobPatch::default()
        };
        if let Err(e) = jobs::update_job(&self.db, job_id, patch).await {
            error!(job_id, error = %e, "failed to mark job failed");
        }
    }
}

/// Apply the caller-side overrides to the strategist's raw decision.
///
/// A met objective always completes the job, and the attempt ceiling is
/// authoritative: a retry request at or past the ceiling becomes
/// MARK_FAILED_MAX_RETRIES regardless of the raw model output.
fn resolve_decision(plan: &ActionPlan, attempts_made: u32, max_retries: u32) -> NextAction {
    if plan.objective_met_status == ObjectiveMetStatus::Met {
        return NextAction::MarkCompletedSuccess;
    }
    if plan.next_action == NextAction::ScheduleRetry && attempts_made >= max_retries {
        return NextAction::MarkFailedMaxRetries;
    }
    plan.next_action
}

fn truncate_details(details: &str) -> String {
    details.chars().take(ERROR_DETAIL_LIMIT).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use herald_core::types::NewJob;
    use herald_test_utils::{retry_plan, success_plan, MockDialer, MockStrategist};
    use tempfile::tempdir;

    fn harness(
        db: Database,
        dialer: MockDialer,
        strategist: MockStrategist,
    ) -> JobProcessor {
        JobProcessor::new(
            db,
            Arc::new(dialer),
            Arc::new(strategist),
            Duration::from_secs(10),
        )
    }

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("processor.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    async fn insert_and_claim(db: &Database, max_retries: u32) -> Job {
        jobs::insert_job(
            db,
            &NewJob {
                phone_number: "15550003333".to_string(),
                contact_name: "Mr. Smith".to_string(),
                company_name: "Acme Front Desk".to_string(),
                objective: "Confirm the delivery window".to_string(),
                max_retries,
                next_retry_at: None,
            },
        )
        .await
        .unwrap();
        jobs::claim_due_job(db).await.unwrap().unwrap()
    }

    #[test]
    fn met_objective_always_completes() {
        let mut plan = retry_plan("try again", None);
        plan.objective_met_status = ObjectiveMetStatus::Met;
        assert_eq!(
            resolve_decision(&plan, 1, 3),
            NextAction::MarkCompletedSuccess
        );
    }

    #[test]
    fn ceiling_overrides_schedule_retry() {
        let plan = retry_plan("try again", None);
        // Third attempt of three: the ceiling is authoritative.
        assert_eq!(resolve_decision(&plan, 3, 3), NextAction::MarkFailedMaxRetries);
        assert_eq!(resolve_decision(&plan, 4, 3), NextAction::MarkFailedMaxRetries);
        // Under the ceiling the raw decision stands.
        assert_eq!(resolve_decision(&plan, 2, 3), NextAction::ScheduleRetry);
    }

    #[test]
    fn non_retry_decisions_pass_through() {
        let mut plan = success_plan();
        plan.objective_met_status = ObjectiveMetStatus::NotMetRetryNotRecommended;
        plan.next_action = NextAction::MarkFailedObjectiveUnachieved;
        assert_eq!(
            resolve_decision(&plan, 3, 3),
            NextAction::MarkFailedObjectiveUnachieved
        );
    }

    #[tokio::test]
    async fn happy_path_completes_job_with_summary() {
        let (db, _dir) = setup_db().await;
        let job = insert_and_claim(&db, 3).await;

        let processor = harness(db.clone(), MockDialer::new(), MockStrategist::new());
        processor.process(&job).await;

        let updated = jobs::get_job(&db, job.id).await.unwrap().unwrap();
        assert_eq!(updated.overall_status, JobStatus::CompletedSuccess);
        assert!(updated.final_summary.unwrap().contains("confirmed"));
        assert_eq!(updated.retries_attempted, 0, "success does not burn a retry");

        let attempts = attempts::attempts_for_job(&db, job.id).await.unwrap();
        assert_eq!(attempts.len(), 1);
        let attempt = &attempts[0];
        assert_eq!(attempt.attempt_number, 1);
        assert_eq!(attempt.attempt_status, AttemptStatus::CompletedAnalyzed);
        assert_eq!(attempt.session_id.as_deref(), Some("mock-session"));
        assert_eq!(attempt.telephony_call_id.as_deref(), Some("mock-telephony-call"));
        assert_eq!(attempt.end_reason.as_deref(), Some("hangup"));
        assert_eq!(attempt.transcript.as_deref(), Some("Agent: Hello\nUser: Hi"));
        assert!(attempt.ended_at.is_some());

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn retry_reschedules_with_revised_objective() {
        let (db, _dir) = setup_db().await;
        let job = insert_and_claim(&db, 3).await;

        let strategist = MockStrategist::with_plans(vec![Ok(retry_plan(
            "Call back Thursday about the vendor delay",
            Some(120),
        ))]);
        let processor = harness(db.clone(), MockDialer::new(), strategist);
        processor.process(&job).await;

        let updated = jobs::get_job(&db, job.id).await.unwrap().unwrap();
        assert_eq!(updated.overall_status, JobStatus::RetryScheduled);
        assert_eq!(updated.retries_attempted, 1);
        assert_eq!(
            updated.current_objective,
            "Call back Thursday about the vendor delay"
        );
        // Initial objective is immutable.
        assert_eq!(updated.initial_objective, "Confirm the delivery window");
        let due = updated.next_retry_at.unwrap();
        assert!(due > now_plus_minutes(119) && due < now_plus_minutes(121));

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn retry_without_delay_uses_poll_cooldown() {
        let (db, _dir) = setup_db().await;
        let job = insert_and_claim(&db, 3).await;

        let strategist =
            MockStrategist::with_plans(vec![Ok(retry_plan("Try once more", None))]);
        let processor = harness(db.clone(), MockDialer::new(), strategist);
        processor.process(&job).await;

        let updated = jobs::get_job(&db, job.id).await.unwrap().unwrap();
        let due = updated.next_retry_at.unwrap();
        // Two poll cycles of 10s.
        assert!(due > now_plus_secs(15) && due < now_plus_secs(25));

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn attempt_numbers_stay_gapless_across_retries() {
        let (db, _dir) = setup_db().await;

        let strategist = MockStrategist::with_plans(vec![
            Ok(retry_plan("again", None)),
            Ok(retry_plan("again", None)),
            Ok(retry_plan("again", None)),
        ]);
        let dialer = MockDialer::new();
        let processor = harness(db.clone(), dialer, strategist);

        let job = insert_and_claim(&db, 3).await;
        let job_id = job.id;
        processor.process(&job).await;

        // Replay SCHEDULE_RETRY decisions until the ceiling terminates
        // the job. Each cycle claims the same job again once due.
        loop {
            // Make the retry due immediately.
            let current = jobs::get_job(&db, job_id).await.unwrap().unwrap();
            if current.overall_status.is_terminal() {
                break;
            }
            jobs::update_job(
                &db,
                job_id,
                JobPatch {
                    next_retry_at: Some(None),
                    ..JobPatch::default()
                },
            )
            .await
            .unwrap();
            let claimed = jobs::claim_due_job(&db).await.unwrap().unwrap();
            processor.process(&claimed).await;
        }

        let finished = jobs::get_job(&db, job_id).await.unwrap().unwrap();
        assert_eq!(finished.overall_status, JobStatus::FailedMaxRetries);

        let attempts = attempts::attempts_for_job(&db, job_id).await.unwrap();
        let numbers: Vec<u32> = attempts.iter().map(|a| a.attempt_number).collect();
        assert_eq!(numbers, vec![1, 2, 3], "gapless 1..N attempt numbers");

        // Terminal: no further claims, no further attempts.
        assert!(jobs::claim_due_job(&db).await.unwrap().is_none());

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn strategist_failure_fails_job_permanently() {
        let (db, _dir) = setup_db().await;
        let job = insert_and_claim(&db, 3).await;

        let strategist = MockStrategist::with_plans(vec![Err(HeraldError::Strategist {
            message: "response failed schema validation: missing field `reasoning`".into(),
            raw_response: Some("{\"summary_for_user\": \"...\"}".into()),
        })]);
        let processor = harness(db.clone(), MockDialer::new(), strategist);
        processor.process(&job).await;

        let updated = jobs::get_job(&db, job.id).await.unwrap().unwrap();
        assert_eq!(updated.overall_status, JobStatus::FailedPermanentError);
        assert!(updated.final_summary.unwrap().contains("Call analysis failed"));

        let attempts = attempts::attempts_for_job(&db, job.id).await.unwrap();
        assert_eq!(attempts[0].attempt_status, AttemptStatus::StrategyFailed);
        assert!(attempts[0]
            .reasoning
            .as_deref()
            .unwrap()
            .contains("Strategist error"));

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn session_creation_failure_records_processing_error() {
        let (db, _dir) = setup_db().await;
        let job = insert_and_claim(&db, 3).await;

        let dialer = MockDialer::new();
        dialer
            .push_session(Err(HeraldError::Gateway {
                message: "create session: API returned 503".into(),
                body: Some("overloaded".into()),
            }))
            .await;
        let processor = harness(db.clone(), dialer, MockStrategist::new());
        processor.process(&job).await;

        let updated = jobs::get_job(&db, job.id).await.unwrap().unwrap();
        assert_eq!(updated.overall_status, JobStatus::FailedPermanentError);
        // The user-visible text is diagnostic, never a raw stack trace.
        assert!(updated.final_summary.unwrap().starts_with("Call processing error:"));

        let attempts = attempts::attempts_for_job(&db, job.id).await.unwrap();
        assert_eq!(attempts[0].attempt_status, AttemptStatus::ProcessingError);
        assert_eq!(attempts[0].end_reason.as_deref(), Some("ProcessingError"));
        assert!(attempts[0].error_details.is_some());

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn telephony_failure_records_processing_error() {
        let (db, _dir) = setup_db().await;
        let job = insert_and_claim(&db, 3).await;

        let dialer = MockDialer::new();
        dialer
            .push_call(Err(HeraldError::Telephony {
                message: "call placement returned 500".into(),
            }))
            .await;
        let processor = harness(db.clone(), dialer, MockStrategist::new());
        processor.process(&job).await;

        let updated = jobs::get_job(&db, job.id).await.unwrap().unwrap();
        assert_eq!(updated.overall_status, JobStatus::FailedPermanentError);

        let attempts = attempts::attempts_for_job(&db, job.id).await.unwrap();
        assert_eq!(attempts[0].attempt_status, AttemptStatus::ProcessingError);
        // The session had been created before the failure.
        assert!(attempts[0].session_id.is_some());

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn monitoring_timeout_still_reaches_the_strategist() {
        let (db, _dir) = setup_db().await;
        let job = insert_and_claim(&db, 3).await;

        let dialer = MockDialer::new();
        dialer.push_end_reason(MONITORING_TIMEOUT_REASON).await;
        let processor = harness(db.clone(), dialer, MockStrategist::new());
        processor.process(&job).await;

        // The flow proceeded to transcript + strategist instead of hanging.
        let updated = jobs::get_job(&db, job.id).await.unwrap().unwrap();
        assert_eq!(updated.overall_status, JobStatus::CompletedSuccess);

        let attempts = attempts::attempts_for_job(&db, job.id).await.unwrap();
        let attempt = &attempts[0];
        assert_eq!(attempt.end_reason.as_deref(), Some(MONITORING_TIMEOUT_REASON));
        assert!(attempt.transcript.is_some());
        assert_eq!(attempt.attempt_status, AttemptStatus::CompletedAnalyzed);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn strategist_receives_only_other_attempts_as_history() {
        let (db, _dir) = setup_db().await;
        let job = insert_and_claim(&db, 3).await;

        // Seed an earlier analyzed attempt by running a retry first.
        let strategist = MockStrategist::with_plans(vec![Ok(retry_plan("again", None))]);
        let processor = harness(db.clone(), MockDialer::new(), strategist);
        processor.process(&job).await;

        jobs::update_job(
            &db,
            job.id,
            JobPatch {
                next_retry_at: Some(None),
                ..JobPatch::default()
            },
        )
        .await
        .unwrap();
        let second = jobs::claim_due_job(&db).await.unwrap().unwrap();
        assert_eq!(second.retries_attempted, 1);

        let processor2 = harness(db.clone(), MockDialer::new(), MockStrategist::new());
        processor2.process(&second).await;

        let attempts = attempts::attempts_for_job(&db, job.id).await.unwrap();
        assert_eq!(attempts.len(), 2);
        // The second attempt ran with the revised objective snapshot.
        assert_eq!(attempts[1].objective, "again");

        db.close().await.unwrap();
    }
}
