// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Strategist trait: the LLM-backed outcome analysis for one attempt.

use async_trait::async_trait;

use crate::error::HeraldError;
use crate::types::{ActionPlan, Attempt, Job};

/// Judges a finished call attempt and decides the job's next step.
///
/// Pure function of its inputs: the job snapshot, the transcript of the
/// attempt under analysis, and the history of *other* attempts for the
/// same job, sorted by attempt number. May fail transiently (it calls
/// an external model); after its retry budget it returns an explicit
/// [`HeraldError::Strategist`] carrying the last raw response, never a
/// fabricated fallback plan.
#[async_trait]
pub trait OutcomeStrategist: Send + Sync {
    async fn evaluate(
        &self,
        job: &Job,
        transcript: &str,
        history: &[Attempt],
    ) -> Result<ActionPlan, HeraldError>;
}
