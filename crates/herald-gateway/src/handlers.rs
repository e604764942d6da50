// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the gateway REST API.
//!
//! Handles POST /api/calls (job ingestion), GET /api/calls (monitoring
//! list), GET /api/calls/{id}/attempts (per-job detail), GET /health.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Form, Json,
};
use chrono::Utc;
use herald_core::types::{Attempt, Job, NewJob};
use herald_storage::queries::{attempts, jobs};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::scheduling::{self, Urgency};
use crate::server::GatewayState;

/// Form body for POST /api/calls.
#[derive(Debug, Deserialize)]
pub struct CreateCallForm {
    pub contact_name: String,
    pub phone_number: String,
    #[serde(default)]
    pub company_name: Option<String>,
    pub call_purpose: String,
    pub urgency: String,
    /// Explicit schedule; overrides urgency when parseable.
    #[serde(default)]
    pub scheduled_time: Option<String>,
    /// Minutes west of UTC, the JavaScript getTimezoneOffset convention.
    #[serde(default)]
    pub timezone_offset_minutes: Option<i64>,
    /// Appended to the objective text.
    #[serde(default)]
    pub notes: Option<String>,
}

/// Response body for a created job.
#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub status: String,
    pub job_id: i64,
    pub message: String,
}

/// Response body for GET /api/calls.
#[derive(Debug, Serialize)]
pub struct CallsResponse {
    pub calls: Vec<Job>,
}

/// Response body for GET /api/calls/{id}/attempts.
#[derive(Debug, Serialize)]
pub struct CallDetailResponse {
    pub call: Job,
    pub attempts: Vec<Attempt>,
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn bad_request(message: impl Into<String>) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

fn store_error(context: &str, e: herald_core::HeraldError) -> ApiError {
    warn!(error = %e, context, "store operation failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: format!("{context} failed"),
        }),
    )
}

/// POST /api/calls
///
/// Validates the form, computes the first-attempt due time from the
/// explicit schedule or the urgency level, and inserts a PENDING job.
pub async fn create_call(
    State(state): State<GatewayState>,
    Form(form): Form<CreateCallForm>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    if form.contact_name.trim().is_empty() || form.call_purpose.trim().is_empty() {
        return Err(bad_request("Missing required fields"));
    }
    let digits = form.phone_number.strip_prefix('+').unwrap_or(&form.phone_number);
    if digits.len() < 7 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(bad_request("Invalid phone number format"));
    }
    let urgency: Urgency = form
        .urgency
        .parse()
        .map_err(|()| bad_request("Invalid urgency, expected urgent|high|medium|low"))?;

    let company_name = form
        .company_name
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or(&state.default_company)
        .to_string();
    let next_retry_at = scheduling::resolve_next_retry_at(
        Utc::now(),
        urgency,
        form.scheduled_time.as_deref(),
        form.timezone_offset_minutes,
    );
    let objective = scheduling::build_objective(&form.call_purpose, form.notes.as_deref());

    let job_id = jobs::insert_job(
        &state.db,
        &NewJob {
            phone_number: form.phone_number.clone(),
            contact_name: form.contact_name.clone(),
            company_name,
            objective,
            max_retries: state.default_max_retries,
            next_retry_at: Some(next_retry_at),
        },
    )
    .await
    .map_err(|e| store_error("creating the call request", e))?;

    info!(job_id, contact = %form.contact_name, "call request created");
    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            status: "success".to_string(),
            job_id,
            message: format!("Call request created successfully (ID: {job_id})"),
        }),
    ))
}

/// GET /api/calls
pub async fn list_calls(
    State(state): State<GatewayState>,
) -> Result<Json<CallsResponse>, ApiError> {
    let calls = jobs::list_jobs_for_monitor(&state.db)
        .await
        .map_err(|e| store_error("listing calls", e))?;
    Ok(Json(CallsResponse { calls }))
}

/// GET /api/calls/{id}/attempts
pub async fn call_attempts(
    State(state): State<GatewayState>,
    Path(id): Path<i64>,
) -> Result<Json<CallDetailResponse>, ApiError> {
    let call = jobs::get_job(&state.db, id)
        .await
        .map_err(|e| store_error("loading the call", e))?
        .ok_or((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("Call with ID {id} not found"),
            }),
        ))?;
    let attempts = attempts::attempts_for_job(&state.db, id)
        .await
        .map_err(|e| store_error("loading call attempts", e))?;
    Ok(Json(CallDetailResponse { call, attempts }))
}

/// GET /health
pub async fn get_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Request body for POST /api/tools/schedule_call.
#[derive(Debug, Deserialize)]
pub struct ScheduleToolRequest {
    pub phone_number: String,
    pub contact_name: String,
    pub call_objective: String,
}

/// Request body for POST /api/tools/call_status.
#[derive(Debug, Default, Deserialize)]
pub struct StatusToolRequest {
    #[serde(default)]
    pub job_id: Option<i64>,
    #[serde(default)]
    pub contact_name: Option<String>,
    #[serde(default)]
    pub call_objective_snippet: Option<String>,
    #[serde(default)]
    pub date_reference: Option<String>,
    #[serde(default)]
    pub time_of_day_preference: Option<String>,
}

/// Tool responses carry the assistant-facing sentence verbatim.
#[derive(Debug, Serialize)]
pub struct ToolReply {
    pub result: String,
}

/// POST /api/tools/schedule_call
///
/// The realtime assistant's tool surface for scheduling a call. The
/// reply text is spoken back to the user as-is.
pub async fn tool_schedule_call(
    State(state): State<GatewayState>,
    Json(request): Json<ScheduleToolRequest>,
) -> Json<ToolReply> {
    let result = herald_tools::schedule_outbound_call(
        &state.db,
        &state.default_company,
        state.default_max_retries,
        &herald_tools::ScheduleRequest {
            phone_number: request.phone_number,
            contact_name: request.contact_name,
            call_objective: request.call_objective,
        },
    )
    .await;
    Json(ToolReply { result })
}

/// POST /api/tools/call_status
///
/// The realtime assistant's tool surface for the status query.
pub async fn tool_call_status(
    State(state): State<GatewayState>,
    Json(request): Json<StatusToolRequest>,
) -> Json<ToolReply> {
    let time_of_day = request
        .time_of_day_preference
        .as_deref()
        .and_then(|band| band.parse().ok())
        .unwrap_or_default();
    let result = herald_tools::check_scheduled_call_status(
        &state.db,
        &herald_tools::StatusQuery {
            job_id: request.job_id,
            contact_name: request.contact_name,
            call_objective_snippet: request.call_objective_snippet,
            date_reference: request.date_reference,
            time_of_day_preference: time_of_day,
        },
    )
    .await;
    Json(ToolReply { result })
}
