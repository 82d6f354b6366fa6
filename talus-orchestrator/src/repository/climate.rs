//! Climate Repository
//!
//! Read-only lookups against the warehouse tables the ingestion pipeline
//! owns: intensity series, hazard indicators and distance-to-source rows.
//! The orchestrator never writes these.

use sqlx::PgPool;
use talus_core::domain::climate::{IndicatorValue, IntensitySample};
use talus_core::domain::hazard::HazardType;

/// Annual-maximum intensity series for one cell and hazard, oldest first
pub async fn intensity_series(
    pool: &PgPool,
    location_key: &str,
    hazard_type: HazardType,
    scenario: &str,
    epoch: &str,
) -> Result<Vec<IntensitySample>, sqlx::Error> {
    let rows = sqlx::query_as::<_, ObservationRow>(
        r#"
        SELECT year, value
        FROM intensity_observations
        WHERE location_key = $1 AND hazard_type = $2 AND scenario = $3 AND epoch = $4
        ORDER BY year ASC
        "#,
    )
    .bind(location_key)
    .bind(hazard_type.code())
    .bind(scenario)
    .bind(epoch)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|r| r.into()).collect())
}

/// Normalized indicator values for one cell and hazard
pub async fn indicator_values(
    pool: &PgPool,
    location_key: &str,
    hazard_type: HazardType,
    scenario: &str,
    epoch: &str,
) -> Result<Vec<IndicatorValue>, sqlx::Error> {
    let rows = sqlx::query_as::<_, IndicatorRow>(
        r#"
        SELECT indicator, value
        FROM hazard_indicators
        WHERE location_key = $1 AND hazard_type = $2 AND scenario = $3 AND epoch = $4
        ORDER BY indicator ASC
        "#,
    )
    .bind(location_key)
    .bind(hazard_type.code())
    .bind(scenario)
    .bind(epoch)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|r| r.into()).collect())
}

/// Distance to the nearest mapped source for one cell and hazard. None when
/// no source row exists within the mapping radius.
pub async fn proximity_distance_m(
    pool: &PgPool,
    location_key: &str,
    hazard_type: HazardType,
) -> Result<Option<f64>, sqlx::Error> {
    let row: Option<(f64,)> = sqlx::query_as(
        r#"
        SELECT distance_m
        FROM hazard_proximity
        WHERE location_key = $1 AND hazard_type = $2
        "#,
    )
    .bind(location_key)
    .bind(hazard_type.code())
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|(distance,)| distance))
}

// =============================================================================
// Database Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct ObservationRow {
    year: i32,
    value: f64,
}

impl From<ObservationRow> for IntensitySample {
    fn from(row: ObservationRow) -> Self {
        IntensitySample { year: row.year, value: row.value }
    }
}

#[derive(sqlx::FromRow)]
struct IndicatorRow {
    indicator: String,
    value: f64,
}

impl From<IndicatorRow> for IndicatorValue {
    fn from(row: IndicatorRow) -> Self {
        IndicatorValue { indicator: row.indicator, value: row.value }
    }
}
