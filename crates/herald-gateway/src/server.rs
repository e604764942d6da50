// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the ingestion and
//! monitoring surface.

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use herald_config::model::GatewayConfig;
use herald_core::HeraldError;
use herald_storage::Database;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;

use crate::auth::{auth_middleware, AuthConfig};
use crate::handlers;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    /// Handle to the job store.
    pub db: Database,
    /// Persona used when a request names no company.
    pub default_company: String,
    /// Attempt ceiling applied to ingested jobs.
    pub default_max_retries: u32,
}

/// Build the gateway router over the given state.
pub fn build_router(state: GatewayState, auth: AuthConfig) -> Router {
    // Unauthenticated health endpoint for supervisors.
    let public_routes = Router::new().route("/health", get(handlers::get_health));

    // Ingestion, monitoring, and tool routes, bearer-guarded when configured.
    let api_routes = Router::new()
        .route(
            "/api/calls",
            post(handlers::create_call).get(handlers::list_calls),
        )
        .route("/api/calls/{id}/attempts", get(handlers::call_attempts))
        .route("/api/tools/schedule_call", post(handlers::tool_schedule_call))
        .route("/api/tools/call_status", post(handlers::tool_call_status))
        .route_layer(axum_middleware::from_fn_with_state(auth, auth_middleware))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .layer(CorsLayer::permissive())
}

/// Start the gateway HTTP server; runs until the token is cancelled.
pub async fn start_server(
    config: &GatewayConfig,
    state: GatewayState,
    cancel: CancellationToken,
) -> Result<(), HeraldError> {
    let auth = AuthConfig {
        bearer_token: config.bearer_token.clone(),
    };
    let app = build_router(state, auth);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| HeraldError::Internal(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!("gateway server listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
        .map_err(|e| HeraldError::Internal(format!("gateway server error: {e}")))?;

    Ok(())
}
