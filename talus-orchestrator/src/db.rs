use sqlx::{PgPool, postgres::PgPoolOptions};

use crate::config::Config;

/// Build the connection pool and prove it usable.
///
/// The warm-up probe acquires one connection and runs `SELECT 1` before the
/// pool is handed to anything else, so a misconfigured database fails here
/// instead of inside the first job.
pub async fn create_pool(config: &Config) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .min_connections(config.pool_min_connections)
        .max_connections(config.pool_max_connections)
        .acquire_timeout(config.acquire_timeout)
        .test_before_acquire(true)
        .connect(&config.database_url)
        .await?;

    let mut conn = pool.acquire().await?;
    sqlx::query("SELECT 1").execute(&mut *conn).await?;
    drop(conn);

    tracing::info!(
        "Database pool ready (min={}, max={})",
        config.pool_min_connections,
        config.pool_max_connections
    );

    Ok(pool)
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    // Create risk jobs table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS risk_jobs (
            id UUID PRIMARY KEY,
            kind VARCHAR(50) NOT NULL,
            status VARCHAR(50) NOT NULL,
            input JSONB NOT NULL,
            progress INTEGER NOT NULL DEFAULT 0,
            total_items INTEGER NOT NULL DEFAULT 0,
            completed_items INTEGER NOT NULL DEFAULT 0,
            failed_items INTEGER NOT NULL DEFAULT 0,
            results JSONB,
            error_message TEXT,
            error_trace TEXT,
            created_at TIMESTAMPTZ NOT NULL,
            started_at TIMESTAMPTZ,
            finished_at TIMESTAMPTZ,
            expires_at TIMESTAMPTZ NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Create hazard results table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS hazard_results (
            location_key VARCHAR(32) NOT NULL,
            hazard_type VARCHAR(32) NOT NULL,
            scenario VARCHAR(64) NOT NULL,
            epoch VARCHAR(32) NOT NULL,
            score DOUBLE PRECISION NOT NULL,
            score_100 INTEGER NOT NULL,
            level VARCHAR(20) NOT NULL,
            calculated_at TIMESTAMPTZ NOT NULL,
            PRIMARY KEY (location_key, hazard_type, scenario, epoch)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Create probability results table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS probability_results (
            location_key VARCHAR(32) NOT NULL,
            hazard_type VARCHAR(32) NOT NULL,
            scenario VARCHAR(64) NOT NULL,
            epoch VARCHAR(32) NOT NULL,
            bin_probabilities DOUBLE PRECISION[] NOT NULL,
            aal DOUBLE PRECISION NOT NULL,
            method VARCHAR(20) NOT NULL,
            sample_count INTEGER NOT NULL,
            calculated_at TIMESTAMPTZ NOT NULL,
            PRIMARY KEY (location_key, hazard_type, scenario, epoch)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Create exposure results table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS exposure_results (
            location_key VARCHAR(32) NOT NULL,
            hazard_type VARCHAR(32) NOT NULL,
            site_id VARCHAR(255),
            score DOUBLE PRECISION NOT NULL,
            level VARCHAR(20) NOT NULL,
            proximity_factor DOUBLE PRECISION NOT NULL,
            asset_value_norm DOUBLE PRECISION NOT NULL,
            distance_m DOUBLE PRECISION,
            calculated_at TIMESTAMPTZ NOT NULL,
            PRIMARY KEY (location_key, hazard_type)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Create vulnerability results table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS vulnerability_results (
            location_key VARCHAR(32) NOT NULL,
            hazard_type VARCHAR(32) NOT NULL,
            site_id VARCHAR(255),
            score DOUBLE PRECISION NOT NULL,
            level VARCHAR(20) NOT NULL,
            breakdown JSONB NOT NULL DEFAULT '[]',
            calculated_at TIMESTAMPTZ NOT NULL,
            PRIMARY KEY (location_key, hazard_type)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Create AAL results table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS aal_results (
            location_key VARCHAR(32) NOT NULL,
            hazard_type VARCHAR(32) NOT NULL,
            site_id VARCHAR(255),
            base_aal DOUBLE PRECISION NOT NULL,
            vulnerability_factor DOUBLE PRECISION NOT NULL,
            insurance_rate DOUBLE PRECISION NOT NULL,
            final_aal DOUBLE PRECISION NOT NULL,
            expected_loss DOUBLE PRECISION,
            calculated_at TIMESTAMPTZ NOT NULL,
            PRIMARY KEY (location_key, hazard_type)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Warehouse tables owned by the ingestion pipeline; created here so a
    // fresh development database is usable without the ETL.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS intensity_observations (
            location_key VARCHAR(32) NOT NULL,
            hazard_type VARCHAR(32) NOT NULL,
            scenario VARCHAR(64) NOT NULL,
            epoch VARCHAR(32) NOT NULL,
            year INTEGER NOT NULL,
            value DOUBLE PRECISION NOT NULL,
            PRIMARY KEY (location_key, hazard_type, scenario, epoch, year)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS hazard_indicators (
            location_key VARCHAR(32) NOT NULL,
            hazard_type VARCHAR(32) NOT NULL,
            scenario VARCHAR(64) NOT NULL,
            epoch VARCHAR(32) NOT NULL,
            indicator VARCHAR(64) NOT NULL,
            value DOUBLE PRECISION NOT NULL,
            PRIMARY KEY (location_key, hazard_type, scenario, epoch, indicator)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS hazard_proximity (
            location_key VARCHAR(32) NOT NULL,
            hazard_type VARCHAR(32) NOT NULL,
            distance_m DOUBLE PRECISION NOT NULL,
            PRIMARY KEY (location_key, hazard_type)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Create indexes for job queries
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_risk_jobs_status ON risk_jobs(status)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_risk_jobs_created_at ON risk_jobs(created_at DESC)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_risk_jobs_expires_at ON risk_jobs(expires_at)")
        .execute(pool)
        .await?;

    tracing::info!("Database migrations completed successfully");
    Ok(())
}
