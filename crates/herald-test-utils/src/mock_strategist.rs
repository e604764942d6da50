// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock strategist for deterministic testing.

use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::Mutex;

use herald_core::types::{ActionPlan, Attempt, Job, NextAction, ObjectiveMetStatus};
use herald_core::{HeraldError, OutcomeStrategist};

/// A mock strategist that returns pre-configured action plans.
///
/// Plans are popped from a FIFO queue; an empty queue yields a default
/// "objective met" plan.
pub struct MockStrategist {
    plans: Mutex<VecDeque<Result<ActionPlan, HeraldError>>>,
}

impl MockStrategist {
    pub fn new() -> Self {
        Self {
            plans: Mutex::new(VecDeque::new()),
        }
    }

    /// Create a mock strategist pre-loaded with the given results.
    pub fn with_plans(plans: Vec<Result<ActionPlan, HeraldError>>) -> Self {
        Self {
            plans: Mutex::new(VecDeque::from(plans)),
        }
    }

    /// Add a plan to the end of the queue.
    pub async fn push_plan(&self, plan: Result<ActionPlan, HeraldError>) {
        self.plans.lock().await.push_back(plan);
    }
}

impl Default for MockStrategist {
    fn default() -> Self {
        Self::new()
    }
}

/// A plan marking the objective met, for happy-path tests.
pub fn success_plan() -> ActionPlan {
    ActionPlan {
        summary_for_user: "The objective was confirmed on the call.".to_string(),
        objective_met_status: ObjectiveMetStatus::Met,
        next_action: NextAction::MarkCompletedSuccess,
        reasoning: "The contact confirmed the objective.".to_string(),
        next_objective_if_retry: None,
        requested_retry_delay_minutes: None,
    }
}

/// A plan requesting a retry with a revised objective.
pub fn retry_plan(next_objective: &str, delay_minutes: Option<u32>) -> ActionPlan {
    ActionPlan {
        summary_for_user: "The contact asked to be called back.".to_string(),
        objective_met_status: ObjectiveMetStatus::NotMetRetryRecommended,
        next_action: NextAction::ScheduleRetry,
        reasoning: "A callback was explicitly requested.".to_string(),
        next_objective_if_retry: Some(next_objective.to_string()),
        requested_retry_delay_minutes: delay_minutes,
    }
}

#[async_trait]
impl OutcomeStrategist for MockStrategist {
    async fn evaluate(
        &self,
        _job: &Job,
        _transcript: &str,
        _history: &[Attempt],
    ) -> Result<ActionPlan, HeraldError> {
        self.plans
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Ok(success_plan()))
    }
}
