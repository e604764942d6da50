// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `herald serve` command implementation.
//!
//! Wires the SQLite store, the HTTP dialer, the strategist client, the
//! polling scheduler, the completion notifier, and the ingestion gateway
//! together, then runs until a shutdown signal arrives. The scheduler is
//! the foreground task; the gateway and notifier run alongside it and
//! share the same cancellation token.

use std::sync::Arc;
use std::time::Duration;

use herald_agent::{install_signal_handler, JobProcessor, Notifier, Scheduler};
use herald_config::model::HeraldConfig;
use herald_core::{CallDialer, HeraldError, OutcomeStrategist};
use herald_dialer::HttpDialer;
use herald_gateway::{start_server, GatewayState};
use herald_storage::Database;
use herald_strategist::OpenAiStrategist;
use tracing::{error, info};

/// Runs the `herald serve` command.
pub async fn run_serve(config: HeraldConfig) -> Result<(), HeraldError> {
    init_tracing(&config.agent.log_level);

    info!("starting herald serve");

    let cancel = install_signal_handler();

    // Storage opens first; everything else reads and writes through it.
    let db = Database::open(&config.storage.database_path).await?;

    let dialer: Arc<dyn CallDialer> = Arc::new(
        HttpDialer::new(&config.voice, &config.telephony).map_err(|e| {
            error!(error = %e, "failed to initialize call dialer");
            eprintln!(
                "error: outbound calling credentials required. Set voice.api_key, \
                 voice.agent_id, and the telephony section via herald.toml or HERALD_* env vars."
            );
            e
        })?,
    );

    let strategist: Arc<dyn OutcomeStrategist> = Arc::new(
        OpenAiStrategist::new(&config.strategist).map_err(|e| {
            error!(error = %e, "failed to initialize strategist");
            eprintln!(
                "error: strategist API key required. Set strategist.api_key via \
                 herald.toml or HERALD_STRATEGIST_API_KEY."
            );
            e
        })?,
    );

    let processor = JobProcessor::new(
        db.clone(),
        dialer,
        strategist,
        Duration::from_secs(config.scheduler.poll_interval_secs),
    );
    let scheduler = Scheduler::new(db.clone(), processor, &config.scheduler, cancel.clone());

    // Ingestion/monitoring HTTP surface.
    let gateway_state = GatewayState {
        db: db.clone(),
        default_company: config.agent.default_company_name.clone(),
        default_max_retries: config.scheduler.default_max_retries,
    };
    let gateway_config = config.gateway.clone();
    let gateway_cancel = cancel.clone();
    let gateway_handle = tokio::spawn(async move {
        if let Err(e) = start_server(&gateway_config, gateway_state, gateway_cancel).await {
            error!(error = %e, "gateway server exited with error");
        }
    });

    // Completion notifier, when a webhook is configured.
    let notifier_handle = Notifier::new(db.clone(), &config.notifier, cancel.clone())
        .map(|notifier| tokio::spawn(async move { notifier.run().await }));
    if notifier_handle.is_none() {
        info!("notifier disabled (no notifier.webhook_url configured)");
    }

    // The scheduler is the foreground loop; it returns once cancelled.
    scheduler.run().await;

    info!("draining background tasks");
    if let Some(handle) = notifier_handle {
        let _ = handle.await;
    }
    let _ = gateway_handle.await;

    db.close().await?;
    info!("herald stopped");
    Ok(())
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("herald={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
