//! API Module
//!
//! HTTP API layer for the orchestrator.
//! Each submodule handles endpoints for a specific domain.

pub mod error;
pub mod health;
pub mod job;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use sqlx::PgPool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::assessment::AssessmentRunner;

/// Shared handler state: the pool for reads and the runner that picks up
/// freshly submitted jobs.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub runner: Arc<AssessmentRunner>,
}

/// Create the main API router with all endpoints
pub fn create_router(pool: PgPool, runner: Arc<AssessmentRunner>) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Submission endpoints
        .route("/assessment", post(job::submit_assessment))
        .route("/precompute", post(job::submit_precompute))
        // Job endpoints
        .route("/jobs", get(job::list_jobs))
        .route("/jobs/scheduled", get(job::list_scheduled_jobs))
        .route("/job/{id}", get(job::get_job))
        .route("/job/{id}/status", get(job::get_job_status))
        .route("/job/{id}/cancel", post(job::cancel_job))
        // Add state and middleware
        .with_state(AppState { pool, runner })
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
