// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Job table operations: insert, claim, patch, search, stale sweep, and
//! the informed-flag bookkeeping.
//!
//! All writes are atomic single-row updates except [`claim_due_job`] and
//! [`sweep_stale_jobs`], which use one short transaction each so a crash
//! cannot leave a half-claimed or half-swept row.

use herald_core::time::now_iso;
use herald_core::types::{Job, JobPatch, JobSearchFilter, JobStatus, NewJob};
use herald_core::HeraldError;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, OptionalExtension};

use crate::database::{map_tr_err, Database};

const JOB_COLUMNS: &str = "id, phone_number, contact_name, company_name, \
     initial_objective, current_objective, overall_status, retries_attempted, \
     max_retries, final_summary, informed, next_retry_at, created_at, updated_at";

fn job_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Job> {
    let status: String = row.get(6)?;
    Ok(Job {
        id: row.get(0)?,
        phone_number: row.get(1)?,
        contact_name: row.get(2)?,
        company_name: row.get(3)?,
        initial_objective: row.get(4)?,
        current_objective: row.get(5)?,
        overall_status: status.parse::<JobStatus>().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(6, rusqlite::types::Type::Text, Box::new(e))
        })?,
        retries_attempted: row.get(7)?,
        max_retries: row.get(8)?,
        final_summary: row.get(9)?,
        informed: row.get(10)?,
        next_retry_at: row.get(11)?,
        created_at: row.get(12)?,
        updated_at: row.get(13)?,
    })
}

/// Insert a new job. Returns the auto-generated job id.
pub async fn insert_job(db: &Database, job: &NewJob) -> Result<i64, HeraldError> {
    let job = job.clone();
    let now = now_iso();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO jobs
                   (phone_number, contact_name, company_name, initial_objective,
                    current_objective, overall_status, retries_attempted, max_retries,
                    next_retry_at, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, 'PENDING', 0, ?6, ?7, ?8, ?8)",
                params![
                    job.phone_number,
                    job.contact_name,
                    job.company_name,
                    job.objective,
                    job.objective,
                    job.max_retries,
                    job.next_retry_at,
                    now,
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(map_tr_err)
}

/// Fetch a single job by id.
pub async fn get_job(db: &Database, id: i64) -> Result<Option<Job>, HeraldError> {
    db.connection()
        .call(move |conn| {
            let job = conn
                .query_row(
                    &format!("SELECT {JOB_COLUMNS} FROM jobs WHERE id = ?1"),
                    params![id],
                    job_from_row,
                )
                .optional()?;
            Ok(job)
        })
        .await
        .map_err(map_tr_err)
}

/// Claim the single highest-priority due job, if any.
///
/// Due means PENDING or RETRY_SCHEDULED with a null-or-past
/// `next_retry_at` (jobs ingested with an explicit schedule sit in
/// PENDING with a future due time). Any due PENDING row outranks any
/// due RETRY_SCHEDULED row; ties break by creation order. The selected
/// row is atomically marked PROCESSING in the same transaction, so a
/// crash between select and hand-off cannot leave a job claimable
/// twice.
pub async fn claim_due_job(db: &Database) -> Result<Option<Job>, HeraldError> {
    let now = now_iso();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let job = {
                let mut stmt = tx.prepare(&format!(
                    "SELECT {JOB_COLUMNS} FROM jobs
                     WHERE overall_status IN ('PENDING', 'RETRY_SCHEDULED')
                       AND (next_retry_at IS NULL OR next_retry_at <= ?1)
                     ORDER BY CASE overall_status WHEN 'PENDING' THEN 0 ELSE 1 END,
                              created_at ASC, id ASC
                     LIMIT 1"
                ))?;
                stmt.query_row(params![now], job_from_row).optional()?
            };

            match job {
                Some(mut job) => {
                    tx.execute(
                        "UPDATE jobs SET overall_status = 'PROCESSING', updated_at = ?1
                         WHERE id = ?2",
                        params![now, job.id],
                    )?;
                    tx.commit()?;
                    job.overall_status = JobStatus::Processing;
                    job.updated_at = now;
                    Ok(Some(job))
                }
                None => {
                    tx.commit()?;
                    Ok(None)
                }
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Apply a partial update to a job row. Always bumps `updated_at`.
///
/// A status change is checked against [`JobStatus::can_transition_to`]
/// first; an illegal transition (for example moving a terminal job back
/// to PROCESSING) fails loudly instead of being silently written.
pub async fn update_job(db: &Database, id: i64, patch: JobPatch) -> Result<(), HeraldError> {
    if let Some(next) = patch.overall_status {
        let current = get_job(db, id)
            .await?
            .ok_or_else(|| HeraldError::Internal(format!("job {id} not found")))?;
        if !current.overall_status.can_transition_to(next) {
            return Err(HeraldError::Internal(format!(
                "illegal job status transition {} -> {next} for job {id}",
                current.overall_status
            )));
        }
    }

    let now = now_iso();
    db.connection()
        .call(move |conn| {
            let mut sets: Vec<&str> = Vec::new();
            let mut values: Vec<Value> = Vec::new();

            if let Some(status) = patch.overall_status {
                sets.push("overall_status = ?");
                values.push(Value::Text(status.to_string()));
            }
            if let Some(objective) = patch.current_objective {
                sets.push("current_objective = ?");
                values.push(Value::Text(objective));
            }
            if let Some(retries) = patch.retries_attempted {
                sets.push("retries_attempted = ?");
                values.push(Value::Integer(i64::from(retries)));
            }
            if let Some(summary) = patch.final_summary {
                sets.push("final_summary = ?");
                values.push(Value::Text(summary));
            }
            if let Some(next_retry_at) = patch.next_retry_at {
                sets.push("next_retry_at = ?");
                values.push(match next_retry_at {
                    Some(at) => Value::Text(at),
                    None => Value::Null,
                });
            }
            if let Some(informed) = patch.informed {
                sets.push("informed = ?");
                values.push(Value::Integer(i64::from(informed)));
            }

            sets.push("updated_at = ?");
            values.push(Value::Text(now));
            values.push(Value::Integer(id));

            let sql = format!("UPDATE jobs SET {} WHERE id = ?", sets.join(", "));
            conn.execute(&sql, params_from_iter(values))?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Find jobs matching the given filters, most recently updated first.
pub async fn search_jobs(
    db: &Database,
    filter: &JobSearchFilter,
) -> Result<Vec<Job>, HeraldError> {
    let filter = filter.clone();
    db.connection()
        .call(move |conn| {
            let mut where_parts: Vec<&str> = Vec::new();
            let mut values: Vec<Value> = Vec::new();

            if let Some(id) = filter.job_id {
                where_parts.push("id = ?");
                values.push(Value::Integer(id));
            }
            if let Some(contact) = &filter.contact_name {
                where_parts.push("contact_name LIKE ?");
                values.push(Value::Text(format!("%{contact}%")));
            }
            if let Some(snippet) = &filter.objective_snippet {
                where_parts.push("(initial_objective LIKE ? OR current_objective LIKE ?)");
                values.push(Value::Text(format!("%{snippet}%")));
                values.push(Value::Text(format!("%{snippet}%")));
            }
            if let Some((start, end)) = &filter.updated_within {
                where_parts.push("updated_at >= ? AND updated_at < ?");
                values.push(Value::Text(start.clone()));
                values.push(Value::Text(end.clone()));
            }

            let where_sql = if where_parts.is_empty() {
                String::new()
            } else {
                format!("WHERE {}", where_parts.join(" AND "))
            };
            let limit = if filter.limit == 0 { 5 } else { filter.limit };
            let sql = format!(
                "SELECT {JOB_COLUMNS} FROM jobs {where_sql}
                 ORDER BY updated_at DESC, id DESC LIMIT {limit}"
            );

            let mut stmt = conn.prepare(&sql)?;
            let jobs = stmt
                .query_map(params_from_iter(values), job_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(jobs)
        })
        .await
        .map_err(map_tr_err)
}

/// Force-fail jobs stuck in PROCESSING with `updated_at` strictly older
/// than `cutoff`. Returns the affected job ids.
///
/// Guards against a crash mid-attempt leaving a job permanently
/// unpickable, since only PENDING and due RETRY_SCHEDULED rows are
/// ever selected for work.
pub async fn sweep_stale_jobs(
    db: &Database,
    cutoff: &str,
    summary: &str,
) -> Result<Vec<i64>, HeraldError> {
    let cutoff = cutoff.to_string();
    let summary = summary.to_string();
    let now = now_iso();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let ids: Vec<i64> = {
                let mut stmt = tx.prepare(
                    "SELECT id FROM jobs
                     WHERE overall_status = 'PROCESSING' AND updated_at < ?1",
                )?;
                stmt.query_map(params![cutoff], |row| row.get(0))?
                    .collect::<Result<Vec<_>, _>>()?
            };
            for id in &ids {
                tx.execute(
                    "UPDATE jobs
                     SET overall_status = 'FAILED_PERMANENT_ERROR',
                         final_summary = ?1, updated_at = ?2
                     WHERE id = ?3",
                    params![summary, now, id],
                )?;
            }
            tx.commit()?;
            Ok(ids)
        })
        .await
        .map_err(map_tr_err)
}

/// Concluded jobs whose outcome has not yet been surfaced enough times.
pub async fn uninformed_concluded_jobs(db: &Database) -> Result<Vec<Job>, HeraldError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {JOB_COLUMNS} FROM jobs
                 WHERE informed = 0
                   AND overall_status IN ('COMPLETED_SUCCESS', 'FAILED_MAX_RETRIES',
                                          'COMPLETED_OBJECTIVE_NOT_MET',
                                          'FAILED_PERMANENT_ERROR')
                 ORDER BY updated_at ASC"
            ))?;
            let jobs = stmt
                .query_map([], job_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(jobs)
        })
        .await
        .map_err(map_tr_err)
}

/// Mark a concluded job's outcome as fully surfaced to the user.
///
/// This is the one permitted mutation of a terminal row.
pub async fn mark_informed(db: &Database, id: i64) -> Result<(), HeraldError> {
    let now = now_iso();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE jobs SET informed = 1, updated_at = ?1 WHERE id = ?2",
                params![now, id],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// All jobs ordered for the monitoring surface: active work first, then
/// by due time.
pub async fn list_jobs_for_monitor(db: &Database) -> Result<Vec<Job>, HeraldError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {JOB_COLUMNS} FROM jobs
                 ORDER BY CASE overall_status
                            WHEN 'PROCESSING' THEN 0
                            WHEN 'PENDING' THEN 1
                            WHEN 'RETRY_SCHEDULED' THEN 2
                            ELSE 3
                          END,
                          next_retry_at ASC, id ASC"
            ))?;
            let jobs = stmt
                .query_map([], job_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(jobs)
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use herald_core::time::{now_plus_secs, now_iso};
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    fn new_job(contact: &str) -> NewJob {
        NewJob {
            phone_number: "15550001111".to_string(),
            contact_name: contact.to_string(),
            company_name: "Acme Front Desk".to_string(),
            objective: format!("Confirm the delivery window with {contact}"),
            max_retries: 3,
            next_retry_at: None,
        }
    }

    async fn set_updated_at(db: &Database, id: i64, at: String) {
        db.connection()
            .call(move |conn| {
                conn.execute(
                    "UPDATE jobs SET updated_at = ?1 WHERE id = ?2",
                    params![at, id],
                )?;
                Ok::<(), rusqlite::Error>(())
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn insert_and_get_round_trip() {
        let (db, _dir) = setup_db().await;

        let id = insert_job(&db, &new_job("Mr. Smith")).await.unwrap();
        assert!(id > 0);

        let job = get_job(&db, id).await.unwrap().unwrap();
        assert_eq!(job.contact_name, "Mr. Smith");
        assert_eq!(job.overall_status, JobStatus::Pending);
        assert_eq!(job.retries_attempted, 0);
        assert_eq!(job.initial_objective, job.current_objective);
        assert!(!job.informed);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn claim_marks_processing_and_is_exclusive() {
        let (db, _dir) = setup_db().await;
        let id = insert_job(&db, &new_job("Ada")).await.unwrap();

        let claimed = claim_due_job(&db).await.unwrap().unwrap();
        assert_eq!(claimed.id, id);
        assert_eq!(claimed.overall_status, JobStatus::Processing);

        // The same job is not claimable while PROCESSING.
        assert!(claim_due_job(&db).await.unwrap().is_none());

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn pending_outranks_due_retry_scheduled() {
        let (db, _dir) = setup_db().await;

        // An old retry-scheduled job, due now.
        let retry_id = insert_job(&db, &new_job("Early Retry")).await.unwrap();
        let claimed = claim_due_job(&db).await.unwrap().unwrap();
        assert_eq!(claimed.id, retry_id);
        update_job(
            &db,
            retry_id,
            JobPatch {
                overall_status: Some(JobStatus::RetryScheduled),
                next_retry_at: Some(Some(now_plus_secs(-60))),
                ..JobPatch::default()
            },
        )
        .await
        .unwrap();

        // A fresher PENDING job still wins.
        let pending_id = insert_job(&db, &new_job("Fresh Pending")).await.unwrap();
        let claimed = claim_due_job(&db).await.unwrap().unwrap();
        assert_eq!(claimed.id, pending_id, "PENDING must outrank due retries");

        // With the pending job claimed, the due retry is next.
        let claimed = claim_due_job(&db).await.unwrap().unwrap();
        assert_eq!(claimed.id, retry_id);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn future_retry_is_not_due() {
        let (db, _dir) = setup_db().await;
        let id = insert_job(&db, &new_job("Later")).await.unwrap();
        claim_due_job(&db).await.unwrap().unwrap();
        update_job(
            &db,
            id,
            JobPatch {
                overall_status: Some(JobStatus::RetryScheduled),
                next_retry_at: Some(Some(now_plus_secs(3600))),
                ..JobPatch::default()
            },
        )
        .await
        .unwrap();

        assert!(claim_due_job(&db).await.unwrap().is_none());

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn pending_with_future_schedule_is_not_due() {
        let (db, _dir) = setup_db().await;
        let mut job = new_job("Tomorrow");
        job.next_retry_at = Some(now_plus_secs(24 * 3600));
        insert_job(&db, &job).await.unwrap();

        assert!(claim_due_job(&db).await.unwrap().is_none());

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn null_next_retry_means_due_now() {
        let (db, _dir) = setup_db().await;
        let id = insert_job(&db, &new_job("Null Due")).await.unwrap();
        claim_due_job(&db).await.unwrap().unwrap();
        update_job(
            &db,
            id,
            JobPatch {
                overall_status: Some(JobStatus::RetryScheduled),
                next_retry_at: Some(None),
                ..JobPatch::default()
            },
        )
        .await
        .unwrap();

        let claimed = claim_due_job(&db).await.unwrap().unwrap();
        assert_eq!(claimed.id, id);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn illegal_transition_fails_loudly() {
        let (db, _dir) = setup_db().await;
        let id = insert_job(&db, &new_job("Terminal")).await.unwrap();
        claim_due_job(&db).await.unwrap().unwrap();
        update_job(
            &db,
            id,
            JobPatch {
                overall_status: Some(JobStatus::CompletedSuccess),
                ..JobPatch::default()
            },
        )
        .await
        .unwrap();

        // A terminal job cannot be moved back to PROCESSING.
        let result = update_job(
            &db,
            id,
            JobPatch {
                overall_status: Some(JobStatus::Processing),
                ..JobPatch::default()
            },
        )
        .await;
        assert!(matches!(result, Err(HeraldError::Internal(_))));

        // But the informed flag is still writable.
        mark_informed(&db, id).await.unwrap();
        assert!(get_job(&db, id).await.unwrap().unwrap().informed);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn stale_sweep_respects_the_ceiling_boundary() {
        let (db, _dir) = setup_db().await;
        let fresh = insert_job(&db, &new_job("Fresh")).await.unwrap();
        let stale = insert_job(&db, &new_job("Stale")).await.unwrap();
        claim_due_job(&db).await.unwrap().unwrap();
        claim_due_job(&db).await.unwrap().unwrap();

        let cutoff = now_iso();
        // One second inside the ceiling: untouched. One second past: swept.
        set_updated_at(&db, fresh, now_plus_secs(1)).await;
        set_updated_at(&db, stale, now_plus_secs(-1)).await;

        let swept = sweep_stale_jobs(&db, &cutoff, "Job exceeded max processing time.")
            .await
            .unwrap();
        assert_eq!(swept, vec![stale]);

        let fresh_job = get_job(&db, fresh).await.unwrap().unwrap();
        assert_eq!(fresh_job.overall_status, JobStatus::Processing);

        let stale_job = get_job(&db, stale).await.unwrap().unwrap();
        assert_eq!(stale_job.overall_status, JobStatus::FailedPermanentError);
        assert!(stale_job.final_summary.unwrap().contains("processing time"));

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn boundary_exact_match_is_not_swept() {
        let (db, _dir) = setup_db().await;
        let id = insert_job(&db, &new_job("Boundary")).await.unwrap();
        claim_due_job(&db).await.unwrap().unwrap();

        let cutoff = "2026-02-01T00:00:00.000Z".to_string();
        set_updated_at(&db, id, cutoff.clone()).await;

        // Strictly-older comparison: equality is inside the ceiling.
        let swept = sweep_stale_jobs(&db, &cutoff, "stale").await.unwrap();
        assert!(swept.is_empty());

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn search_filters_compose() {
        let (db, _dir) = setup_db().await;
        insert_job(&db, &new_job("Mr. Smith")).await.unwrap();
        insert_job(&db, &new_job("Dr. Jones")).await.unwrap();

        let by_contact = search_jobs(
            &db,
            &JobSearchFilter {
                contact_name: Some("Smith".to_string()),
                ..JobSearchFilter::any()
            },
        )
        .await
        .unwrap();
        assert_eq!(by_contact.len(), 1);
        assert_eq!(by_contact[0].contact_name, "Mr. Smith");

        let by_objective = search_jobs(
            &db,
            &JobSearchFilter {
                objective_snippet: Some("delivery window".to_string()),
                ..JobSearchFilter::any()
            },
        )
        .await
        .unwrap();
        assert_eq!(by_objective.len(), 2);

        let none = search_jobs(
            &db,
            &JobSearchFilter {
                contact_name: Some("Nobody".to_string()),
                ..JobSearchFilter::any()
            },
        )
        .await
        .unwrap();
        assert!(none.is_empty());

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn search_window_is_half_open() {
        let (db, _dir) = setup_db().await;
        let id = insert_job(&db, &new_job("Windowed")).await.unwrap();
        set_updated_at(&db, id, "2026-03-10T12:00:00.000Z".to_string()).await;

        let hit = search_jobs(
            &db,
            &JobSearchFilter {
                updated_within: Some((
                    "2026-03-10T00:00:00.000Z".to_string(),
                    "2026-03-11T00:00:00.000Z".to_string(),
                )),
                ..JobSearchFilter::any()
            },
        )
        .await
        .unwrap();
        assert_eq!(hit.len(), 1);

        // The end bound is exclusive.
        let miss = search_jobs(
            &db,
            &JobSearchFilter {
                updated_within: Some((
                    "2026-03-09T00:00:00.000Z".to_string(),
                    "2026-03-10T12:00:00.000Z".to_string(),
                )),
                ..JobSearchFilter::any()
            },
        )
        .await
        .unwrap();
        assert!(miss.is_empty());

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn search_is_idempotent_on_unchanged_store() {
        let (db, _dir) = setup_db().await;
        insert_job(&db, &new_job("Same")).await.unwrap();
        insert_job(&db, &new_job("Same Again")).await.unwrap();

        let filter = JobSearchFilter {
            contact_name: Some("Same".to_string()),
            ..JobSearchFilter::any()
        };
        let first = search_jobs(&db, &filter).await.unwrap();
        let second = search_jobs(&db, &filter).await.unwrap();
        let ids = |jobs: &[Job]| jobs.iter().map(|j| j.id).collect::<Vec<_>>();
        assert_eq!(ids(&first), ids(&second));

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn informed_lifecycle() {
        let (db, _dir) = setup_db().await;
        let id = insert_job(&db, &new_job("Notify Me")).await.unwrap();
        claim_due_job(&db).await.unwrap().unwrap();
        update_job(
            &db,
            id,
            JobPatch {
                overall_status: Some(JobStatus::CompletedSuccess),
                final_summary: Some("Objective confirmed.".to_string()),
                ..JobPatch::default()
            },
        )
        .await
        .unwrap();

        let pending = uninformed_concluded_jobs(&db).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, id);

        mark_informed(&db, id).await.unwrap();
        assert!(uninformed_concluded_jobs(&db).await.unwrap().is_empty());

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn processing_jobs_are_not_reported_uninformed() {
        let (db, _dir) = setup_db().await;
        insert_job(&db, &new_job("Mid Flight")).await.unwrap();
        claim_due_job(&db).await.unwrap().unwrap();

        assert!(uninformed_concluded_jobs(&db).await.unwrap().is_empty());

        db.close().await.unwrap();
    }
}
