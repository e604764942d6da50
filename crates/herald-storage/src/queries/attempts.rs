// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Attempt table operations. Attempts are append-only: rows are inserted
//! once per phone call and patched as the processor advances through its
//! steps, never deleted except by job cascade.

use herald_core::time::now_iso;
use herald_core::types::{Attempt, AttemptPatch, AttemptStatus, ObjectiveMetStatus};
use herald_core::HeraldError;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, OptionalExtension};

use crate::database::{map_tr_err, Database};

const ATTEMPT_COLUMNS: &str = "id, job_id, attempt_number, objective, session_id, \
     telephony_call_id, started_at, ended_at, end_reason, transcript, summary, \
     objective_met_status, reasoning, attempt_status, error_details";

fn attempt_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Attempt> {
    let status: String = row.get(13)?;
    let met: Option<String> = row.get(11)?;
    Ok(Attempt {
        id: row.get(0)?,
        job_id: row.get(1)?,
        attempt_number: row.get(2)?,
        objective: row.get(3)?,
        session_id: row.get(4)?,
        telephony_call_id: row.get(5)?,
        started_at: row.get(6)?,
        ended_at: row.get(7)?,
        end_reason: row.get(8)?,
        transcript: row.get(9)?,
        summary: row.get(10)?,
        objective_met_status: met
            .map(|s| {
                s.parse::<ObjectiveMetStatus>().map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        11,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })
            })
            .transpose()?,
        reasoning: row.get(12)?,
        attempt_status: status.parse::<AttemptStatus>().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(13, rusqlite::types::Type::Text, Box::new(e))
        })?,
        error_details: row.get(14)?,
    })
}

/// Insert a new attempt in the INITIATED state. Returns its id.
pub async fn insert_attempt(
    db: &Database,
    job_id: i64,
    attempt_number: u32,
    objective: &str,
) -> Result<i64, HeraldError> {
    let objective = objective.to_string();
    let now = now_iso();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO attempts
                   (job_id, attempt_number, objective, started_at, attempt_status)
                 VALUES (?1, ?2, ?3, ?4, 'INITIATED')",
                params![job_id, attempt_number, objective, now],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(map_tr_err)
}

/// Fetch a single attempt by id.
pub async fn get_attempt(db: &Database, id: i64) -> Result<Option<Attempt>, HeraldError> {
    db.connection()
        .call(move |conn| {
            let attempt = conn
                .query_row(
                    &format!("SELECT {ATTEMPT_COLUMNS} FROM attempts WHERE id = ?1"),
                    params![id],
                    attempt_from_row,
                )
                .optional()?;
            Ok(attempt)
        })
        .await
        .map_err(map_tr_err)
}

/// All attempts for a job, ordered by attempt number.
pub async fn attempts_for_job(db: &Database, job_id: i64) -> Result<Vec<Attempt>, HeraldError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {ATTEMPT_COLUMNS} FROM attempts
                 WHERE job_id = ?1 ORDER BY attempt_number ASC"
            ))?;
            let attempts = stmt
                .query_map(params![job_id], attempt_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(attempts)
        })
        .await
        .map_err(map_tr_err)
}

/// Apply a partial update to an attempt row.
pub async fn update_attempt(
    db: &Database,
    id: i64,
    patch: AttemptPatch,
) -> Result<(), HeraldError> {
    db.connection()
        .call(move |conn| {
            let mut sets: Vec<&str> = Vec::new();
            let mut values: Vec<Value> = Vec::new();

            if let Some(session_id) = patch.session_id {
                sets.push("session_id = ?");
                values.push(Value::Text(session_id));
            }
            if let Some(call_id) = patch.telephony_call_id {
                sets.push("telephony_call_id = ?");
                values.push(Value::Text(call_id));
            }
            if let Some(status) = patch.attempt_status {
                sets.push("attempt_status = ?");
                values.push(Value::Text(status.to_string()));
            }
            if let Some(end_reason) = patch.end_reason {
                sets.push("end_reason = ?");
                values.push(Value::Text(end_reason));
            }
            if let Some(transcript) = patch.transcript {
                sets.push("transcript = ?");
                values.push(Value::Text(transcript));
            }
            if let Some(summary) = patch.summary {
                sets.push("summary = ?");
                values.push(Value::Text(summary));
            }
            if let Some(met) = patch.objective_met_status {
                sets.push("objective_met_status = ?");
                values.push(Value::Text(met.to_string()));
            }
            if let Some(reasoning) = patch.reasoning {
                sets.push("reasoning = ?");
                values.push(Value::Text(reasoning));
            }
            if let Some(details) = patch.error_details {
                sets.push("error_details = ?");
                values.push(Value::Text(details));
            }
            if let Some(ended_at) = patch.ended_at {
                sets.push("ended_at = ?");
                values.push(Value::Text(ended_at));
            }

            if sets.is_empty() {
                return Ok(());
            }

            values.push(Value::Integer(id));
            let sql = format!("UPDATE attempts SET {} WHERE id = ?", sets.join(", "));
            conn.execute(&sql, params_from_iter(values))?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}
