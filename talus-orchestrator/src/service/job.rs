//! Job Service
//!
//! Business logic for job submission and lifecycle. All input validation
//! happens here, before a row is written, so a job can never start with
//! invalid input.

use sqlx::PgPool;
use talus_core::domain::hazard::HazardType;
use talus_core::domain::job::{JobInput, JobKind, JobStatus, RiskJob, SiteRequest};
use talus_core::dto::job::{SubmitAssessment, SubmitPrecompute};
use uuid::Uuid;

use crate::repository::job_repository;

/// Upper bound on sites per submission; larger batches should be split.
const MAX_SITES_PER_JOB: usize = 200;

const DEFAULT_SCENARIO: &str = "baseline";
const DEFAULT_EPOCH: &str = "current";

/// Service error type
#[derive(Debug)]
pub enum JobError {
    NotFound(Uuid),
    ValidationError(String),
    InvalidState(String),
    DatabaseError(sqlx::Error),
}

impl From<sqlx::Error> for JobError {
    fn from(err: sqlx::Error) -> Self {
        JobError::DatabaseError(err)
    }
}

/// Validate and enqueue a site assessment job
pub async fn submit_assessment(
    pool: &PgPool,
    req: SubmitAssessment,
) -> Result<RiskJob, JobError> {
    validate_sites(&req.sites)?;
    let input = build_input(req.sites, req.hazard_types, req.scenario, req.epoch);

    let job = job_repository::create(pool, JobKind::SiteAssessment, &input).await?;

    tracing::info!(
        "Assessment job created: {} ({} sites x {} hazards)",
        job.id,
        input.sites.len(),
        input.hazard_types.len()
    );

    Ok(job)
}

/// Validate and enqueue a hazard precompute job
pub async fn submit_precompute(
    pool: &PgPool,
    req: SubmitPrecompute,
) -> Result<RiskJob, JobError> {
    let sites: Vec<SiteRequest> = req
        .locations
        .into_iter()
        .map(|location| SiteRequest {
            location,
            site_id: None,
            profile: None,
            asset_value: None,
            insurance_rate: None,
        })
        .collect();

    validate_sites(&sites)?;
    let input = build_input(sites, req.hazard_types, req.scenario, req.epoch);

    let job = job_repository::create(pool, JobKind::HazardPrecompute, &input).await?;

    tracing::info!(
        "Precompute job created: {} ({} cells x {} hazards)",
        job.id,
        input.sites.len(),
        input.hazard_types.len()
    );

    Ok(job)
}

/// Get a job by ID
pub async fn get_job(pool: &PgPool, id: Uuid) -> Result<RiskJob, JobError> {
    let job = job_repository::find_by_id(pool, id)
        .await?
        .ok_or(JobError::NotFound(id))?;

    Ok(job)
}

/// List the most recent jobs
pub async fn list_recent_jobs(pool: &PgPool, limit: i64) -> Result<Vec<RiskJob>, JobError> {
    let jobs = job_repository::list_recent(pool, limit).await?;
    Ok(jobs)
}

/// List queued jobs waiting for a runner slot
pub async fn list_scheduled_jobs(pool: &PgPool) -> Result<Vec<RiskJob>, JobError> {
    let jobs = job_repository::find_by_status(pool, JobStatus::Queued).await?;
    Ok(jobs)
}

/// Cancel a queued or running job
pub async fn cancel_job(pool: &PgPool, id: Uuid) -> Result<(), JobError> {
    let job = job_repository::find_by_id(pool, id)
        .await?
        .ok_or(JobError::NotFound(id))?;

    if job.status.is_terminal() {
        return Err(JobError::InvalidState(format!(
            "Cannot cancel job {} in state {}",
            id, job.status
        )));
    }

    // The guarded UPDATE can still lose to a concurrent terminal transition.
    if !job_repository::cancel(pool, id).await? {
        return Err(JobError::InvalidState(format!(
            "Job {} reached a terminal state before the cancel landed",
            id
        )));
    }

    tracing::info!("Job {} cancelled", id);
    Ok(())
}

// =============================================================================
// Validation
// =============================================================================

fn validate_sites(sites: &[SiteRequest]) -> Result<(), JobError> {
    if sites.is_empty() {
        return Err(JobError::ValidationError(
            "at least one site is required".to_string(),
        ));
    }

    if sites.len() > MAX_SITES_PER_JOB {
        return Err(JobError::ValidationError(format!(
            "at most {} sites per job, got {}",
            MAX_SITES_PER_JOB,
            sites.len()
        )));
    }

    for (i, site) in sites.iter().enumerate() {
        if !site.location.is_valid() {
            return Err(JobError::ValidationError(format!(
                "site {} has an invalid location {}",
                i, site.location
            )));
        }

        if let Some(rate) = site.insurance_rate {
            if !(0.0..=1.0).contains(&rate) {
                return Err(JobError::ValidationError(format!(
                    "site {} insurance rate must be within 0..=1, got {}",
                    i, rate
                )));
            }
        }

        if let Some(value) = site.asset_value {
            if !value.is_finite() || value < 0.0 {
                return Err(JobError::ValidationError(format!(
                    "site {} asset value must be finite and non-negative, got {}",
                    i, value
                )));
            }
        }
    }

    Ok(())
}

/// Normalize the hazard list (empty means all, duplicates collapse) and
/// apply scenario/epoch defaults.
fn build_input(
    sites: Vec<SiteRequest>,
    hazard_types: Vec<HazardType>,
    scenario: Option<String>,
    epoch: Option<String>,
) -> JobInput {
    let hazard_types = resolve_hazards(hazard_types);
    JobInput {
        sites,
        hazard_types,
        scenario: scenario.unwrap_or_else(|| DEFAULT_SCENARIO.to_string()),
        epoch: epoch.unwrap_or_else(|| DEFAULT_EPOCH.to_string()),
    }
}

fn resolve_hazards(requested: Vec<HazardType>) -> Vec<HazardType> {
    if requested.is_empty() {
        return HazardType::ALL.to_vec();
    }

    let mut seen = Vec::with_capacity(requested.len());
    for hazard in requested {
        if !seen.contains(&hazard) {
            seen.push(hazard);
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;
    use talus_core::domain::site::GeoPoint;

    fn site(lat: f64, lon: f64) -> SiteRequest {
        SiteRequest {
            location: GeoPoint::new(lat, lon),
            site_id: None,
            profile: None,
            asset_value: None,
            insurance_rate: None,
        }
    }

    #[test]
    fn test_validate_sites_rejects_empty() {
        assert!(validate_sites(&[]).is_err());
    }

    #[test]
    fn test_validate_sites_rejects_bad_coordinates() {
        assert!(validate_sites(&[site(95.0, 139.0)]).is_err());
        assert!(validate_sites(&[site(35.0, 200.0)]).is_err());
        assert!(validate_sites(&[site(35.68, 139.77)]).is_ok());
    }

    #[test]
    fn test_validate_sites_rejects_bad_insurance_rate() {
        let mut s = site(35.68, 139.77);
        s.insurance_rate = Some(1.5);
        assert!(validate_sites(&[s.clone()]).is_err());

        s.insurance_rate = Some(0.7);
        assert!(validate_sites(&[s]).is_ok());
    }

    #[test]
    fn test_validate_sites_rejects_negative_asset_value() {
        let mut s = site(35.68, 139.77);
        s.asset_value = Some(-1.0);
        assert!(validate_sites(&[s]).is_err());
    }

    #[test]
    fn test_validate_sites_rejects_oversized_batches() {
        let sites: Vec<SiteRequest> = (0..=MAX_SITES_PER_JOB)
            .map(|i| site(35.0 + i as f64 * 0.001, 139.0))
            .collect();
        assert!(validate_sites(&sites).is_err());
    }

    #[test]
    fn test_empty_hazard_list_expands_to_all() {
        let hazards = resolve_hazards(Vec::new());
        assert_eq!(hazards.len(), 9);
        assert_eq!(hazards, HazardType::ALL.to_vec());
    }

    #[test]
    fn test_duplicate_hazards_collapse_in_order() {
        let hazards = resolve_hazards(vec![
            HazardType::Typhoon,
            HazardType::RiverFlood,
            HazardType::Typhoon,
        ]);
        assert_eq!(hazards, vec![HazardType::Typhoon, HazardType::RiverFlood]);
    }

    #[test]
    fn test_build_input_applies_defaults() {
        let input = build_input(vec![site(35.68, 139.77)], Vec::new(), None, None);
        assert_eq!(input.scenario, "baseline");
        assert_eq!(input.epoch, "current");
        assert_eq!(input.unit_count(), 9);

        let input = build_input(
            vec![site(35.68, 139.77)],
            vec![HazardType::Drought],
            Some("rcp85".to_string()),
            Some("2050".to_string()),
        );
        assert_eq!(input.scenario, "rcp85");
        assert_eq!(input.unit_count(), 1);
    }
}
