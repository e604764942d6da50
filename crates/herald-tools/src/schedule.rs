// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The `schedule_outbound_call` tool handler.
//!
//! Inserts a PENDING job due immediately and answers with a confirmation
//! sentence carrying the job id. Like the status tool, the return value
//! is assistant-facing text, so validation failures come back as
//! sentences.

use herald_core::types::NewJob;
use herald_storage::queries::jobs;
use herald_storage::Database;
use tracing::{info, warn};

/// Inputs for scheduling a call from the assistant.
#[derive(Debug, Clone)]
pub struct ScheduleRequest {
    pub phone_number: String,
    pub contact_name: String,
    pub call_objective: String,
}

/// Schedule an outbound call due now. `default_company` is the persona
/// used when the caller names none; `default_max_retries` caps attempts.
pub async fn schedule_outbound_call(
    db: &Database,
    default_company: &str,
    default_max_retries: u32,
    request: &ScheduleRequest,
) -> String {
    if !is_plausible_phone_number(&request.phone_number) {
        warn!(phone_number = %request.phone_number, "rejected implausible phone number");
        return "Error: That phone number does not look valid. Please provide at least 7 digits."
            .to_string();
    }
    if request.contact_name.trim().is_empty() || request.call_objective.trim().is_empty() {
        return "Error: A contact name and a call objective are both required.".to_string();
    }

    let new_job = NewJob {
        phone_number: request.phone_number.clone(),
        contact_name: request.contact_name.clone(),
        company_name: default_company.to_string(),
        objective: request.call_objective.clone(),
        max_retries: default_max_retries,
        next_retry_at: None,
    };

    match jobs::insert_job(db, &new_job).await {
        Ok(job_id) => {
            info!(job_id, contact = %request.contact_name, "call scheduled via tool");
            format!(
                "Okay, I've scheduled the call to {} regarding '{}'. The Job ID is {job_id}. \
                 I will provide updates as they become available or when the task is complete.",
                request.contact_name,
                objective_snippet(&request.call_objective),
            )
        }
        Err(e) => {
            warn!(error = %e, "failed to schedule call via tool");
            "Error: Could not reach the scheduling database. Please try again later.".to_string()
        }
    }
}

/// Digits with an optional leading +, at least 7 of them.
fn is_plausible_phone_number(number: &str) -> bool {
    let digits = number.strip_prefix('+').unwrap_or(number);
    digits.len() >= 7 && digits.chars().all(|c| c.is_ascii_digit())
}

fn objective_snippet(objective: &str) -> String {
    if objective.chars().count() <= 30 {
        objective.to_string()
    } else {
        let cut: String = objective.chars().take(30).collect();
        format!("{cut}...")
    }
}
