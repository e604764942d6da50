// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Completion notifier: surfaces concluded job outcomes to the UI.
//!
//! Watches for jobs that reached a terminal status with the informed
//! flag still unset and POSTs their final summary to the configured
//! webhook. A job is marked informed only after its summary has been
//! delivered a configurable number of times: the debounce keeps a
//! transient UI disconnect from silently swallowing a completion while
//! also not re-announcing forever.

use std::collections::HashMap;
use std::time::Duration;

use herald_config::model::NotifierConfig;
use herald_core::HeraldError;
use herald_storage::queries::jobs;
use herald_storage::Database;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub struct Notifier {
    db: Database,
    client: reqwest::Client,
    webhook_url: String,
    inform_repeat_count: u32,
    poll_interval: Duration,
    /// Successful deliveries per job, in memory. Lost on restart, which
    /// only means a restart re-announces, never that one is missed.
    presentation_counts: Mutex<HashMap<i64, u32>>,
    cancel: CancellationToken,
}

impl Notifier {
    /// Build a notifier, or `None` when no webhook is configured.
    pub fn new(
        db: Database,
        config: &NotifierConfig,
        cancel: CancellationToken,
    ) -> Option<Self> {
        let webhook_url = config.webhook_url.clone()?;
        Some(Self {
            db,
            client: reqwest::Client::new(),
            webhook_url,
            inform_repeat_count: config.inform_repeat_count,
            poll_interval: Duration::from_secs(config.poll_interval_secs),
            presentation_counts: Mutex::new(HashMap::new()),
            cancel,
        })
    }

    /// Poll until cancelled. Delivery and store failures are logged and
    /// retried on the next cycle.
    pub async fn run(&self) {
        info!(webhook = %self.webhook_url, "notifier started");
        loop {
            if self.cancel.is_cancelled() {
                break;
            }
            if let Err(e) = self.run_tick().await {
                warn!(error = %e, "notifier tick failed, retrying next cycle");
            }
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
        }
        info!("notifier stopped");
    }

    /// One notifier pass over the un-informed concluded jobs.
    pub async fn run_tick(&self) -> Result<(), HeraldError> {
        let pending = jobs::uninformed_concluded_jobs(&self.db).await?;
        if pending.is_empty() {
            debug!("no concluded jobs awaiting notification");
            return Ok(());
        }

        for job in pending {
            let status_summary = job
                .final_summary
                .clone()
                .unwrap_or_else(|| format!("Call concluded with status: {}", job.overall_status));
            let payload = serde_json::json!({
                "type": "call_update",
                "job_id": job.id,
                "contact_name": job.contact_name,
                "status_summary": status_summary,
            });

            match self.client.post(&self.webhook_url).json(&payload).send().await {
                Ok(response) if response.status().is_success() => {
                    let mut counts = self.presentation_counts.lock().await;
                    let count = counts.entry(job.id).or_insert(0);
                    *count += 1;
                    info!(job_id = job.id, presentations = *count, "call outcome surfaced");
                    if *count >= self.inform_repeat_count {
                        jobs::mark_informed(&self.db, job.id).await?;
                        counts.remove(&job.id);
                        info!(job_id = job.id, "job marked informed");
                    }
                }
                Ok(response) => {
                    warn!(
                        job_id = job.id,
                        status = %response.status(),
                        "webhook rejected notification"
                    );
                }
                Err(e) => {
                    warn!(job_id = job.id, error = %e, "webhook delivery failed");
                }
            }
        }

        Ok(())
    }
}
