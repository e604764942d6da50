// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types for the outbound-call job pipeline.
//!
//! A [`Job`] is one overall calling task with a single objective; each
//! concrete phone call made for it is an [`Attempt`]. Status enums are
//! closed enumerations with their DB/wire form in SCREAMING_SNAKE_CASE,
//! so an unrecognized status is a construction-time error rather than a
//! silent string fallthrough.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Lifecycle status of a [`Job`].
///
/// Statuses move forward monotonically except for the
/// `Processing -> RetryScheduled -> Processing` cycle, which may repeat
/// until the attempt ceiling is reached. Once terminal, a job row is
/// never mutated again except for its informed flag.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Pending,
    Processing,
    RetryScheduled,
    CompletedSuccess,
    CompletedObjectiveNotMet,
    FailedMaxRetries,
    FailedPermanentError,
}

impl JobStatus {
    /// True for statuses after which no further attempts are ever made.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::CompletedSuccess
                | Self::CompletedObjectiveNotMet
                | Self::FailedMaxRetries
                | Self::FailedPermanentError
        )
    }

    /// Whether moving from `self` to `next` is a legal transition.
    ///
    /// Terminal statuses accept no transition. Writers must check this
    /// before updating a row; an illegal transition is a loud error.
    pub fn can_transition_to(self, next: Self) -> bool {
        match self {
            Self::Pending => matches!(next, Self::Processing),
            Self::RetryScheduled => matches!(next, Self::Processing),
            Self::Processing => matches!(
                next,
                Self::RetryScheduled
                    | Self::CompletedSuccess
                    | Self::CompletedObjectiveNotMet
                    | Self::FailedMaxRetries
                    | Self::FailedPermanentError
            ),
            _ => false,
        }
    }
}

/// Per-attempt processing state, advanced step by step by the job processor.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttemptStatus {
    /// Attempt row created, nothing dispatched yet.
    Initiated,
    /// Remote voice session exists; telephony call not yet placed.
    CallPending,
    /// Telephony call placed; polling the session for termination.
    Monitoring,
    /// The monitoring ceiling elapsed before the call ended.
    MonitoringTimeout,
    /// Call ended; transcript not yet retrieved.
    TranscriptPending,
    /// Transcript stored; awaiting the strategist verdict.
    StrategyPending,
    /// The strategist failed after its retry budget.
    StrategyFailed,
    /// Strategist verdict recorded; the attempt is fully accounted for.
    CompletedAnalyzed,
    /// An unhandled error aborted the attempt at some step.
    ProcessingError,
}

/// The strategist's assessment of one attempt against its objective.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ObjectiveMetStatus {
    Met,
    NotMetRetryRecommended,
    NotMetRetryNotRecommended,
    InconclusiveCheckRetry,
}

/// The strategist's decision for the overall job.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NextAction {
    MarkCompletedSuccess,
    ScheduleRetry,
    MarkFailedObjectiveUnachieved,
    MarkFailedMaxRetries,
}

/// One overall outbound-calling task. Row shape of the `jobs` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: i64,
    /// Destination number, E.164-like.
    pub phone_number: String,
    pub contact_name: String,
    /// The persona the remote voice agent introduces itself as.
    pub company_name: String,
    /// Objective as given at creation. Immutable.
    pub initial_objective: String,
    /// Objective in force for the next attempt; the strategist may rewrite
    /// this before a retry to carry forward context.
    pub current_objective: String,
    pub overall_status: JobStatus,
    /// Attempts made so far. The ceiling `max_retries` bounds total attempts.
    pub retries_attempted: u32,
    pub max_retries: u32,
    /// Human-readable outcome text surfaced to the end user.
    pub final_summary: Option<String>,
    /// True once the outcome has been surfaced the configured number of times.
    pub informed: bool,
    /// Due time for the next attempt; null or past means due now.
    pub next_retry_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Fields required to insert a new job.
#[derive(Debug, Clone)]
pub struct NewJob {
    pub phone_number: String,
    pub contact_name: String,
    pub company_name: String,
    pub objective: String,
    pub max_retries: u32,
    /// When the first attempt becomes due. `None` means due immediately.
    pub next_retry_at: Option<String>,
}

/// Partial update of a job row. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct JobPatch {
    pub overall_status: Option<JobStatus>,
    pub current_objective: Option<String>,
    pub retries_attempted: Option<u32>,
    pub final_summary: Option<String>,
    /// Outer `None` = untouched; `Some(None)` = set NULL.
    pub next_retry_at: Option<Option<String>>,
    pub informed: Option<bool>,
}

/// One phone call execution belonging to a job. Row shape of the
/// `attempts` table. Append-only; an attempt never outlives its job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attempt {
    pub id: i64,
    pub job_id: i64,
    /// 1-based, gapless within a job.
    pub attempt_number: u32,
    /// The objective text in force for this specific attempt.
    pub objective: String,
    /// Remote voice-session id, once created.
    pub session_id: Option<String>,
    /// Telephony call id, once placed.
    pub telephony_call_id: Option<String>,
    pub started_at: String,
    pub ended_at: Option<String>,
    /// End reason from the gateway, or a local sentinel such as
    /// "MonitoringTimeout" / "ProcessingError".
    pub end_reason: Option<String>,
    pub transcript: Option<String>,
    pub summary: Option<String>,
    pub objective_met_status: Option<ObjectiveMetStatus>,
    pub reasoning: Option<String>,
    pub attempt_status: AttemptStatus,
    pub error_details: Option<String>,
}

/// Partial update of an attempt row. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct AttemptPatch {
    pub session_id: Option<String>,
    pub telephony_call_id: Option<String>,
    pub attempt_status: Option<AttemptStatus>,
    pub end_reason: Option<String>,
    pub transcript: Option<String>,
    pub summary: Option<String>,
    pub objective_met_status: Option<ObjectiveMetStatus>,
    pub reasoning: Option<String>,
    pub error_details: Option<String>,
    pub ended_at: Option<String>,
}

/// The strategist's structured verdict for one analyzed attempt.
///
/// Deserialized directly from the model's JSON output; a missing
/// required key is a parse error, never a defaulted field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionPlan {
    /// Concise summary of the attempt, shown to the end user. At most a
    /// few sentences.
    pub summary_for_user: String,
    pub objective_met_status: ObjectiveMetStatus,
    pub next_action: NextAction,
    pub reasoning: String,
    /// Revised objective for the next attempt. Required when
    /// `next_action` is `ScheduleRetry`.
    #[serde(default)]
    pub next_objective_if_retry: Option<String>,
    /// Callback delay explicitly requested by the contact, in minutes.
    #[serde(default)]
    pub requested_retry_delay_minutes: Option<u32>,
}

/// Inputs for creating a remote voice session.
#[derive(Debug, Clone)]
pub struct SessionRequest {
    pub company_name: String,
    pub contact_name: String,
    pub objective: String,
    /// Correlation ids stored in the session metadata.
    pub job_id: i64,
    pub attempt_id: i64,
}

/// A created remote voice session: its id plus the signaling URL the
/// telephony audio stream connects to.
#[derive(Debug, Clone)]
pub struct CreatedSession {
    pub session_id: String,
    pub join_url: String,
}

/// Filters for the status-query surface. All fields optional; empty
/// filter returns the most recently updated jobs.
#[derive(Debug, Clone, Default)]
pub struct JobSearchFilter {
    pub job_id: Option<i64>,
    /// Substring match on contact name.
    pub contact_name: Option<String>,
    /// Substring match against both the initial and current objective.
    pub objective_snippet: Option<String>,
    /// Half-open `[start, end)` window over `updated_at`, ISO-8601.
    pub updated_within: Option<(String, String)>,
    /// Row cap; the status surface uses 5, or 1 for "most recent" queries.
    pub limit: u32,
}

impl JobSearchFilter {
    pub fn any() -> Self {
        Self {
            limit: 5,
            ..Self::default()
        }
    }
}
