//! Job API Handlers
//!
//! HTTP endpoints for job submission and lifecycle. Submissions are
//! validated and persisted before the run task detaches, so the caller
//! always gets back a job id it can poll even if the run dies early.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use talus_core::domain::job::RiskJob;
use talus_core::dto::job::{JobAccepted, JobStatusView, SubmitAssessment, SubmitPrecompute};
use uuid::Uuid;

use crate::api::AppState;
use crate::api::error::ApiResult;
use crate::service::job_service;

const DEFAULT_LIST_LIMIT: i64 = 50;
const MAX_LIST_LIMIT: i64 = 200;

// =============================================================================
// Submission Endpoints
// =============================================================================

/// POST /assessment
/// Validate, enqueue and launch a site assessment job
pub async fn submit_assessment(
    State(state): State<AppState>,
    Json(req): Json<SubmitAssessment>,
) -> ApiResult<(StatusCode, Json<JobAccepted>)> {
    tracing::info!("Assessment submission with {} sites", req.sites.len());

    let job = job_service::submit_assessment(&state.pool, req).await?;
    let accepted = JobAccepted::from(&job);
    state.runner.spawn(job);

    Ok((StatusCode::ACCEPTED, Json(accepted)))
}

/// POST /precompute
/// Validate, enqueue and launch a hazard precompute job
pub async fn submit_precompute(
    State(state): State<AppState>,
    Json(req): Json<SubmitPrecompute>,
) -> ApiResult<(StatusCode, Json<JobAccepted>)> {
    tracing::info!("Precompute submission with {} locations", req.locations.len());

    let job = job_service::submit_precompute(&state.pool, req).await?;
    let accepted = JobAccepted::from(&job);
    state.runner.spawn(job);

    Ok((StatusCode::ACCEPTED, Json(accepted)))
}

// =============================================================================
// Job Lifecycle Endpoints
// =============================================================================

/// GET /job/{id}
/// Get the full job record, results and error trace included
pub async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<RiskJob>> {
    tracing::debug!("Getting job: {}", id);

    let job = job_service::get_job(&state.pool, id).await?;
    Ok(Json(job))
}

/// GET /job/{id}/status
/// Poll-friendly progress snapshot of one job
pub async fn get_job_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<JobStatusView>> {
    tracing::debug!("Getting status of job: {}", id);

    let job = job_service::get_job(&state.pool, id).await?;
    Ok(Json(JobStatusView::from(job)))
}

/// GET /jobs
/// List the most recently created jobs
pub async fn list_jobs(
    State(state): State<AppState>,
    Query(params): Query<ListJobsQuery>,
) -> ApiResult<Json<Vec<RiskJob>>> {
    let limit = params
        .limit
        .unwrap_or(DEFAULT_LIST_LIMIT)
        .clamp(1, MAX_LIST_LIMIT);
    tracing::debug!("Listing up to {} recent jobs", limit);

    let jobs = job_service::list_recent_jobs(&state.pool, limit).await?;
    Ok(Json(jobs))
}

/// GET /jobs/scheduled
/// List queued jobs that have not started running yet
pub async fn list_scheduled_jobs(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<RiskJob>>> {
    tracing::debug!("Listing scheduled jobs");

    let jobs = job_service::list_scheduled_jobs(&state.pool).await?;
    Ok(Json(jobs))
}

/// POST /job/{id}/cancel
/// Cancel a queued or running job
pub async fn cancel_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    tracing::info!("Cancelling job: {}", id);

    job_service::cancel_job(&state.pool, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Request/Response Types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct ListJobsQuery {
    pub limit: Option<i64>,
}
