//! Results Repository
//!
//! Upserts for the per-stage result tables and keyed reads for the
//! precomputed hazard and probability rows. Every write is an
//! `ON CONFLICT ... DO UPDATE` so recomputation replaces rows in place and
//! the tables never grow per run.

use sqlx::PgPool;
use talus_core::domain::hazard::{HazardType, RiskLevel};
use talus_core::domain::results::{
    AalResult, EstimatorMethod, ExposureResult, HazardResult, ProbabilityResult,
    VulnerabilityResult,
};

/// Insert or replace a hazard score row
pub async fn upsert_hazard(pool: &PgPool, result: &HazardResult) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO hazard_results (location_key, hazard_type, scenario, epoch,
                                    score, score_100, level, calculated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        ON CONFLICT (location_key, hazard_type, scenario, epoch) DO UPDATE SET
            score = EXCLUDED.score,
            score_100 = EXCLUDED.score_100,
            level = EXCLUDED.level,
            calculated_at = EXCLUDED.calculated_at
        "#,
    )
    .bind(&result.location_key)
    .bind(result.hazard_type.code())
    .bind(&result.scenario)
    .bind(&result.epoch)
    .bind(result.score)
    .bind(result.score_100)
    .bind(result.level.code())
    .bind(result.calculated_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Insert or replace a probability row
pub async fn upsert_probability(
    pool: &PgPool,
    result: &ProbabilityResult,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO probability_results (location_key, hazard_type, scenario, epoch,
                                         bin_probabilities, aal, method, sample_count,
                                         calculated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        ON CONFLICT (location_key, hazard_type, scenario, epoch) DO UPDATE SET
            bin_probabilities = EXCLUDED.bin_probabilities,
            aal = EXCLUDED.aal,
            method = EXCLUDED.method,
            sample_count = EXCLUDED.sample_count,
            calculated_at = EXCLUDED.calculated_at
        "#,
    )
    .bind(&result.location_key)
    .bind(result.hazard_type.code())
    .bind(&result.scenario)
    .bind(&result.epoch)
    .bind(&result.bin_probabilities)
    .bind(result.aal)
    .bind(result.method.code())
    .bind(result.sample_count)
    .bind(result.calculated_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Insert or replace an exposure row
pub async fn upsert_exposure(pool: &PgPool, result: &ExposureResult) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO exposure_results (location_key, hazard_type, site_id, score, level,
                                      proximity_factor, asset_value_norm, distance_m,
                                      calculated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        ON CONFLICT (location_key, hazard_type) DO UPDATE SET
            site_id = EXCLUDED.site_id,
            score = EXCLUDED.score,
            level = EXCLUDED.level,
            proximity_factor = EXCLUDED.proximity_factor,
            asset_value_norm = EXCLUDED.asset_value_norm,
            distance_m = EXCLUDED.distance_m,
            calculated_at = EXCLUDED.calculated_at
        "#,
    )
    .bind(&result.location_key)
    .bind(result.hazard_type.code())
    .bind(&result.site_id)
    .bind(result.score)
    .bind(result.level.code())
    .bind(result.proximity_factor)
    .bind(result.asset_value_norm)
    .bind(result.distance_m)
    .bind(result.calculated_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Insert or replace a vulnerability row
pub async fn upsert_vulnerability(
    pool: &PgPool,
    result: &VulnerabilityResult,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO vulnerability_results (location_key, hazard_type, site_id, score,
                                           level, breakdown, calculated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (location_key, hazard_type) DO UPDATE SET
            site_id = EXCLUDED.site_id,
            score = EXCLUDED.score,
            level = EXCLUDED.level,
            breakdown = EXCLUDED.breakdown,
            calculated_at = EXCLUDED.calculated_at
        "#,
    )
    .bind(&result.location_key)
    .bind(result.hazard_type.code())
    .bind(&result.site_id)
    .bind(result.score)
    .bind(result.level.code())
    .bind(serde_json::to_value(&result.breakdown).unwrap())
    .bind(result.calculated_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Insert or replace an AAL row
pub async fn upsert_aal(pool: &PgPool, result: &AalResult) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO aal_results (location_key, hazard_type, site_id, base_aal,
                                 vulnerability_factor, insurance_rate, final_aal,
                                 expected_loss, calculated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        ON CONFLICT (location_key, hazard_type) DO UPDATE SET
            site_id = EXCLUDED.site_id,
            base_aal = EXCLUDED.base_aal,
            vulnerability_factor = EXCLUDED.vulnerability_factor,
            insurance_rate = EXCLUDED.insurance_rate,
            final_aal = EXCLUDED.final_aal,
            expected_loss = EXCLUDED.expected_loss,
            calculated_at = EXCLUDED.calculated_at
        "#,
    )
    .bind(&result.location_key)
    .bind(result.hazard_type.code())
    .bind(&result.site_id)
    .bind(result.base_aal)
    .bind(result.vulnerability_factor)
    .bind(result.insurance_rate)
    .bind(result.final_aal)
    .bind(result.expected_loss)
    .bind(result.calculated_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Read the precomputed hazard row for one cell and hazard
pub async fn find_hazard(
    pool: &PgPool,
    location_key: &str,
    hazard_type: HazardType,
    scenario: &str,
    epoch: &str,
) -> Result<Option<HazardResult>, sqlx::Error> {
    let row = sqlx::query_as::<_, HazardRow>(
        r#"
        SELECT location_key, hazard_type, scenario, epoch, score, score_100,
               level, calculated_at
        FROM hazard_results
        WHERE location_key = $1 AND hazard_type = $2 AND scenario = $3 AND epoch = $4
        "#,
    )
    .bind(location_key)
    .bind(hazard_type.code())
    .bind(scenario)
    .bind(epoch)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| r.into()))
}

/// Read the precomputed probability row for one cell and hazard
pub async fn find_probability(
    pool: &PgPool,
    location_key: &str,
    hazard_type: HazardType,
    scenario: &str,
    epoch: &str,
) -> Result<Option<ProbabilityResult>, sqlx::Error> {
    let row = sqlx::query_as::<_, ProbabilityRow>(
        r#"
        SELECT location_key, hazard_type, scenario, epoch, bin_probabilities,
               aal, method, sample_count, calculated_at
        FROM probability_results
        WHERE location_key = $1 AND hazard_type = $2 AND scenario = $3 AND epoch = $4
        "#,
    )
    .bind(location_key)
    .bind(hazard_type.code())
    .bind(scenario)
    .bind(epoch)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| r.into()))
}

/// Count precomputed hazard rows per requested location key. Used by the
/// preflight check to tell "nothing precomputed anywhere" apart from a
/// per-location gap.
pub async fn count_hazard_rows(
    pool: &PgPool,
    location_keys: &[String],
    scenario: &str,
    epoch: &str,
) -> Result<i64, sqlx::Error> {
    let (count,): (i64,) = sqlx::query_as(
        r#"
        SELECT COUNT(*)
        FROM hazard_results
        WHERE location_key = ANY($1) AND scenario = $2 AND epoch = $3
        "#,
    )
    .bind(location_keys)
    .bind(scenario)
    .bind(epoch)
    .fetch_one(pool)
    .await?;

    Ok(count)
}

// =============================================================================
// Database Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct HazardRow {
    location_key: String,
    hazard_type: String,
    scenario: String,
    epoch: String,
    score: f64,
    score_100: i32,
    level: String,
    calculated_at: chrono::DateTime<chrono::Utc>,
}

impl From<HazardRow> for HazardResult {
    fn from(row: HazardRow) -> Self {
        HazardResult {
            location_key: row.location_key,
            hazard_type: HazardType::from_code(&row.hazard_type).unwrap_or(HazardType::Typhoon),
            scenario: row.scenario,
            epoch: row.epoch,
            score: row.score,
            score_100: row.score_100,
            level: RiskLevel::from_code(&row.level).unwrap_or(RiskLevel::VeryLow),
            calculated_at: row.calculated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ProbabilityRow {
    location_key: String,
    hazard_type: String,
    scenario: String,
    epoch: String,
    bin_probabilities: Vec<f64>,
    aal: f64,
    method: String,
    sample_count: i32,
    calculated_at: chrono::DateTime<chrono::Utc>,
}

impl From<ProbabilityRow> for ProbabilityResult {
    fn from(row: ProbabilityRow) -> Self {
        ProbabilityResult {
            location_key: row.location_key,
            hazard_type: HazardType::from_code(&row.hazard_type).unwrap_or(HazardType::Typhoon),
            scenario: row.scenario,
            epoch: row.epoch,
            bin_probabilities: row.bin_probabilities,
            aal: row.aal,
            method: EstimatorMethod::from_code(&row.method).unwrap_or(EstimatorMethod::Histogram),
            sample_count: row.sample_count,
            calculated_at: row.calculated_at,
        }
    }
}

