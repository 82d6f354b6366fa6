//! Job Repository
//!
//! Handles all database operations related to risk jobs. Status transitions
//! are guarded in SQL (`WHERE status = ...`) so concurrent writers can never
//! move a job backwards, and progress updates go through `GREATEST` so the
//! observed percentage is monotonic.

use sqlx::PgPool;
use talus_core::domain::job::{JobInput, JobKind, JobStatus, RiskJob};
use uuid::Uuid;

/// How long result rows are kept before the expiry sweep may drop them.
const RESULT_RETENTION_DAYS: i64 = 30;

/// Create a new queued job
pub async fn create(pool: &PgPool, kind: JobKind, input: &JobInput) -> Result<RiskJob, sqlx::Error> {
    let id = Uuid::new_v4();
    let now = chrono::Utc::now();
    let expires_at = now + chrono::Duration::days(RESULT_RETENTION_DAYS);
    let total_items = input.unit_count() as i32;

    let job = RiskJob {
        id,
        kind,
        status: JobStatus::Queued,
        input: input.clone(),
        progress: 0,
        total_items,
        completed_items: 0,
        failed_items: 0,
        results: None,
        error: None,
        error_trace: None,
        created_at: now,
        started_at: None,
        finished_at: None,
        expires_at,
    };

    sqlx::query(
        r#"
        INSERT INTO risk_jobs (id, kind, status, input, progress, total_items,
                               completed_items, failed_items, created_at, expires_at)
        VALUES ($1, $2, $3, $4, 0, $5, 0, 0, $6, $7)
        "#,
    )
    .bind(id)
    .bind(kind.as_str())
    .bind(JobStatus::Queued.as_str())
    .bind(serde_json::to_value(input).unwrap())
    .bind(total_items)
    .bind(now)
    .bind(expires_at)
    .execute(pool)
    .await?;

    Ok(job)
}

/// Find a job by ID
pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<RiskJob>, sqlx::Error> {
    let row = sqlx::query_as::<_, JobRow>(
        r#"
        SELECT id, kind, status, input, progress, total_items, completed_items,
               failed_items, results, error_message, error_trace, created_at,
               started_at, finished_at, expires_at
        FROM risk_jobs
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| r.into()))
}

/// Find jobs by status, oldest first
pub async fn find_by_status(pool: &PgPool, status: JobStatus) -> Result<Vec<RiskJob>, sqlx::Error> {
    let rows = sqlx::query_as::<_, JobRow>(
        r#"
        SELECT id, kind, status, input, progress, total_items, completed_items,
               failed_items, results, error_message, error_trace, created_at,
               started_at, finished_at, expires_at
        FROM risk_jobs
        WHERE status = $1
        ORDER BY created_at ASC
        "#,
    )
    .bind(status.as_str())
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|r| r.into()).collect())
}

/// List the most recent jobs
pub async fn list_recent(pool: &PgPool, limit: i64) -> Result<Vec<RiskJob>, sqlx::Error> {
    let rows = sqlx::query_as::<_, JobRow>(
        r#"
        SELECT id, kind, status, input, progress, total_items, completed_items,
               failed_items, results, error_message, error_trace, created_at,
               started_at, finished_at, expires_at
        FROM risk_jobs
        ORDER BY created_at DESC
        LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|r| r.into()).collect())
}

/// Move a queued job to running. Returns false when the job was not queued,
/// so exactly one caller wins the transition.
pub async fn mark_running(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE risk_jobs
        SET status = 'running', started_at = $2
        WHERE id = $1 AND status = 'queued'
        "#,
    )
    .bind(id)
    .bind(chrono::Utc::now())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Write a progress snapshot. `GREATEST` keeps the stored percentage from
/// moving backwards under out-of-order unit completion, and the status guard
/// stops a cancelled job from reporting further progress.
pub async fn update_progress(
    pool: &PgPool,
    id: Uuid,
    progress: i32,
    completed_items: i32,
    failed_items: i32,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE risk_jobs
        SET progress = GREATEST(progress, $2),
            completed_items = $3,
            failed_items = $4
        WHERE id = $1 AND status = 'running'
        "#,
    )
    .bind(id)
    .bind(progress)
    .bind(completed_items)
    .bind(failed_items)
    .execute(pool)
    .await?;

    Ok(())
}

/// Complete a running job with its results payload. Returns false when the
/// job already left the running state (e.g. was cancelled mid-flight).
pub async fn complete(
    pool: &PgPool,
    id: Uuid,
    results: serde_json::Value,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE risk_jobs
        SET status = 'completed', progress = 100, results = $2, finished_at = $3
        WHERE id = $1 AND status = 'running'
        "#,
    )
    .bind(id)
    .bind(results)
    .bind(chrono::Utc::now())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Fail a running job. Failed jobs also end at progress 100 so pollers can
/// treat 100 as "the run is over" regardless of outcome.
pub async fn fail(
    pool: &PgPool,
    id: Uuid,
    error_message: &str,
    error_trace: Option<&str>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE risk_jobs
        SET status = 'failed', progress = 100, error_message = $2, error_trace = $3,
            finished_at = $4
        WHERE id = $1 AND status = 'running'
        "#,
    )
    .bind(id)
    .bind(error_message)
    .bind(error_trace)
    .bind(chrono::Utc::now())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Cancel a queued or running job. Returns false when the job was already
/// terminal.
pub async fn cancel(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE risk_jobs
        SET status = 'cancelled', finished_at = $2
        WHERE id = $1 AND status IN ('queued', 'running')
        "#,
    )
    .bind(id)
    .bind(chrono::Utc::now())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

// =============================================================================
// Database Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct JobRow {
    id: Uuid,
    kind: String,
    status: String,
    input: serde_json::Value,
    progress: i32,
    total_items: i32,
    completed_items: i32,
    failed_items: i32,
    results: Option<serde_json::Value>,
    error_message: Option<String>,
    error_trace: Option<String>,
    created_at: chrono::DateTime<chrono::Utc>,
    started_at: Option<chrono::DateTime<chrono::Utc>>,
    finished_at: Option<chrono::DateTime<chrono::Utc>>,
    expires_at: chrono::DateTime<chrono::Utc>,
}

impl From<JobRow> for RiskJob {
    fn from(row: JobRow) -> Self {
        let input: JobInput = serde_json::from_value(row.input).unwrap_or_default();

        RiskJob {
            id: row.id,
            kind: JobKind::parse(&row.kind).unwrap_or(JobKind::SiteAssessment),
            status: JobStatus::parse(&row.status).unwrap_or(JobStatus::Queued),
            input,
            progress: row.progress,
            total_items: row.total_items,
            completed_items: row.completed_items,
            failed_items: row.failed_items,
            results: row.results,
            error: row.error_message,
            error_trace: row.error_trace,
            created_at: row.created_at,
            started_at: row.started_at,
            finished_at: row.finished_at,
            expires_at: row.expires_at,
        }
    }
}
