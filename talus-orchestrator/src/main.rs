//! Talus Orchestrator
//!
//! HTTP service that owns the climate risk jobs: accepts assessment and
//! precompute submissions, drives each job through the staged per-hazard
//! computations in-process, and serves progress and results.
//!
//! Architecture:
//! - Configuration: Load settings from environment or defaults
//! - Repositories: raw SQL over the shared Postgres pool
//! - Services: validation and job lifecycle rules
//! - Assessment: the bounded fan-out runner and its progress accounting
//! - API: axum handlers over the services

pub mod api;
pub mod assessment;
pub mod config;
pub mod db;
pub mod repository;
pub mod service;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::PgPool;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::assessment::AssessmentRunner;
use crate::assessment::upstream::directory_from_config;
use crate::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "talus_orchestrator=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Talus Orchestrator...");

    // Load configuration
    let config = load_config()?;
    info!(
        "Loaded configuration: bind_addr={}, max_parallel_units={}",
        config.bind_addr, config.max_parallel_units
    );

    // Create database connection pool (with retry logic)
    info!("Connecting to database...");
    let pool = connect_with_retry(&config).await?;
    info!("Database connection pool created");

    // Run migrations
    db::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;

    // Wire the in-process job runner
    let directory = directory_from_config(&config);
    let runner = Arc::new(AssessmentRunner::new(pool.clone(), directory, &config));

    // Build router with all API endpoints
    let app = api::create_router(pool, runner);

    info!("Listening on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

/// Loads configuration from environment variables with fallback to defaults
fn load_config() -> Result<Config> {
    match Config::from_env() {
        Ok(config) => {
            config.validate()?;
            Ok(config)
        }
        Err(_) => {
            info!("Failed to load config from environment, using defaults");
            let config = Config::default();
            config.validate()?;
            Ok(config)
        }
    }
}

/// Connect to Postgres with retry logic and exponential backoff
///
/// This handles the case where the database may not be ready yet when the
/// orchestrator starts (common in container environments). The pool's
/// warm-up probe makes a failed first connection surface here instead of
/// on the first job.
async fn connect_with_retry(config: &Config) -> Result<PgPool> {
    const MAX_RETRIES: u32 = 10;
    const INITIAL_DELAY_MS: u64 = 500;
    const MAX_DELAY_MS: u64 = 30_000;

    let mut attempt = 0;
    let mut delay_ms = INITIAL_DELAY_MS;

    loop {
        attempt += 1;

        match db::create_pool(config).await {
            Ok(pool) => {
                if attempt > 1 {
                    info!("Database reachable after {} attempt(s)", attempt);
                }
                return Ok(pool);
            }
            Err(e) => {
                if attempt >= MAX_RETRIES {
                    error!("Failed to reach the database after {} attempts", MAX_RETRIES);
                    return Err(anyhow::anyhow!("Failed to create database pool: {}", e));
                }

                warn!(
                    "Failed to reach the database (attempt {}/{}): {}",
                    attempt, MAX_RETRIES, e
                );
                warn!("Retrying in {} ms...", delay_ms);

                tokio::time::sleep(Duration::from_millis(delay_ms)).await;

                // Exponential backoff with cap
                delay_ms = (delay_ms * 2).min(MAX_DELAY_MS);
            }
        }
    }
}
