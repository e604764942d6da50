// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The `check_scheduled_call_status` tool handler.
//!
//! Filters the job table by contact, objective snippet, and a resolved
//! date window, then renders each match as one human-readable sentence
//! keyed on its lifecycle status. The return value is plain text spoken
//! or shown by the assistant, so failures come back as sentences too,
//! never as raw errors.

use chrono::Utc;
use herald_core::time::{parse_iso, to_iso};
use herald_core::types::{JobSearchFilter, JobStatus};
use herald_storage::queries::jobs;
use herald_storage::Database;
use tracing::{debug, warn};

use crate::when::{self, DateWindow, TimeOfDay};

/// Filters accepted by the status tool. All optional.
#[derive(Debug, Clone, Default)]
pub struct StatusQuery {
    pub job_id: Option<i64>,
    pub contact_name: Option<String>,
    pub call_objective_snippet: Option<String>,
    /// Natural-language date reference, e.g. "yesterday", "3 days ago".
    pub date_reference: Option<String>,
    pub time_of_day_preference: TimeOfDay,
}

/// Run the status query and render the answer.
pub async fn check_scheduled_call_status(db: &Database, query: &StatusQuery) -> String {
    let mut filter = JobSearchFilter {
        job_id: query.job_id,
        contact_name: query.contact_name.clone(),
        objective_snippet: query.call_objective_snippet.clone(),
        ..JobSearchFilter::any()
    };

    if let Some(reference) = &query.date_reference {
        match when::resolve(Utc::now(), reference, query.time_of_day_preference) {
            Some(DateWindow::Window { start, end }) => {
                debug!(%start, %end, "date filter resolved");
                filter.updated_within = Some((to_iso(start), to_iso(end)));
            }
            Some(DateWindow::MostRecent) => {
                // "The last call": a single most-recent row, unless other
                // filters already narrow the search.
                if filter.job_id.is_none()
                    && filter.contact_name.is_none()
                    && filter.objective_snippet.is_none()
                {
                    filter.limit = 1;
                }
            }
            None => {
                warn!(reference, "could not parse date reference, ignoring date filter");
            }
        }
    }

    let found = match jobs::search_jobs(db, &filter).await {
        Ok(found) => found,
        Err(e) => {
            warn!(error = %e, "status query failed against the store");
            return "Error: Could not check the scheduling database right now.".to_string();
        }
    };

    if found.is_empty() {
        return "I couldn't find any scheduled calls matching your criteria.".to_string();
    }

    let lines: Vec<String> = found.iter().map(render_job_line).collect();
    if lines.len() == 1 {
        lines.into_iter().next().unwrap_or_default()
    } else {
        let mut response = format!("Found {} calls matching your criteria:\n", lines.len());
        response.push_str(
            &lines
                .iter()
                .map(|line| format!("- {line}"))
                .collect::<Vec<_>>()
                .join("\n"),
        );
        response
    }
}

fn render_job_line(job: &herald_core::Job) -> String {
    let mut line = format!(
        "Call to {} (ID: {}) regarding '{}' (Last updated: {}): ",
        job.contact_name,
        job.id,
        snippet(&job.current_objective, 50),
        short_timestamp(&job.updated_at),
    );

    match job.overall_status {
        JobStatus::Pending => {
            line.push_str("This call is scheduled and awaiting processing.");
        }
        JobStatus::Processing => {
            line.push_str("This call is being processed right now.");
        }
        JobStatus::RetryScheduled => {
            let eta = job
                .next_retry_at
                .as_deref()
                .map(short_timestamp)
                .unwrap_or_else(|| "soon".to_string());
            line.push_str(&format!("A retry for this call is scheduled for around {eta}."));
        }
        JobStatus::CompletedSuccess
        | JobStatus::CompletedObjectiveNotMet
        | JobStatus::FailedMaxRetries
        | JobStatus::FailedPermanentError => {
            let outcome = job
                .final_summary
                .as_deref()
                .unwrap_or("No final summary recorded.");
            line.push_str(&format!(
                "This call has concluded. Status: {}. Outcome: {outcome}",
                job.overall_status
            ));
        }
    }

    line
}

fn snippet(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        text.to_string()
    } else {
        let cut: String = text.chars().take(limit).collect();
        format!("{cut}...")
    }
}

fn short_timestamp(value: &str) -> String {
    parse_iso(value)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| value.to_string())
}
