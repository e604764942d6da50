// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The polling scheduler: claims due jobs and runs them one at a time.
//!
//! Single-concurrency by design. Exactly one attempt is ever in flight
//! system-wide; a second scheduler instance must not run against the
//! same store or the at-most-one-job guarantee is lost (single-writer
//! assumption, no distributed lock).
//!
//! Each cycle first reclaims stale jobs (rows stuck in PROCESSING past
//! the configured ceiling after an unclean crash), then claims at most
//! one due job and hands it to the processor synchronously.

use std::time::Duration;

use herald_config::model::SchedulerConfig;
use herald_core::time::now_plus_secs;
use herald_core::HeraldError;
use herald_storage::queries::jobs;
use herald_storage::Database;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::processor::JobProcessor;

pub struct Scheduler {
    db: Database,
    processor: JobProcessor,
    poll_interval: Duration,
    stale_after_hours: u64,
    cancel: CancellationToken,
}

impl Scheduler {
    pub fn new(
        db: Database,
        processor: JobProcessor,
        config: &SchedulerConfig,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            db,
            processor,
            poll_interval: Duration::from_secs(config.poll_interval_secs),
            stale_after_hours: config.stale_after_hours,
            cancel,
        }
    }

    /// Poll until cancelled. Store errors are logged and the cycle is
    /// retried after the normal interval; they never crash the loop.
    pub async fn run(&self) {
        info!(
            poll_interval_secs = self.poll_interval.as_secs(),
            "scheduler started"
        );

        // Reclaim anything a previous process left mid-attempt.
        self.sweep_stale().await;

        loop {
            if self.cancel.is_cancelled() {
                break;
            }

            if let Err(e) = self.run_cycle().await {
                error!(error = %e, "poll cycle failed, retrying next interval");
            }

            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
        }

        info!("scheduler stopped");
    }

    /// One poll cycle: stale sweep, then at most one due job end to end.
    /// Returns whether a job was processed.
    pub async fn run_cycle(&self) -> Result<bool, HeraldError> {
        self.sweep_stale().await;

        let Some(job) = jobs::claim_due_job(&self.db).await? else {
            debug!("no due jobs this cycle");
            return Ok(false);
        };

        info!(
            job_id = job.id,
            contact = %job.contact_name,
            attempt_number = job.retries_attempted + 1,
            "claimed due job"
        );

        tokio::select! {
            _ = self.cancel.cancelled() => {
                // The abandoned PROCESSING row is reclaimed by the stale
                // sweep on the next start.
                warn!(job_id = job.id, "shutdown during attempt, abandoning");
            }
            _ = self.processor.process(&job) => {}
        }

        Ok(true)
    }

    async fn sweep_stale(&self) {
        let cutoff = now_plus_secs(-(self.stale_after_hours as i64 * 3600));
        let summary = format!(
            "Job exceeded max processing time of {} hours.",
            self.stale_after_hours
        );
        match jobs::sweep_stale_jobs(&self.db, &cutoff, &summary).await {
            Ok(ids) if !ids.is_empty() => {
                warn!(job_ids = ?ids, "force-failed stale jobs");
            }
            Ok(_) => {}
            Err(e) => error!(error = %e, "stale job sweep failed"),
        }
    }
}
