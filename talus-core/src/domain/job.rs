//! Risk jobs and their lifecycle

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::hazard::HazardType;
use crate::domain::site::{GeoPoint, SiteProfile};

/// Lifecycle state of a risk job.
///
/// `queued -> running -> completed | failed | cancelled`. Terminal states
/// never transition again; a cancel that lands after completion is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<JobStatus> {
        match s {
            "queued" => Some(JobStatus::Queued),
            "running" => Some(JobStatus::Running),
            "completed" => Some(JobStatus::Completed),
            "failed" => Some(JobStatus::Failed),
            "cancelled" => Some(JobStatus::Cancelled),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled
        )
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a job computes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    /// Full per-site pipeline: hazard, exposure, vulnerability, AAL scaling
    /// and the integrated summary.
    SiteAssessment,
    /// Hazard and probability stages only, for warming grid cells ahead of
    /// assessment traffic.
    HazardPrecompute,
}

impl JobKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobKind::SiteAssessment => "site_assessment",
            JobKind::HazardPrecompute => "hazard_precompute",
        }
    }

    pub fn parse(s: &str) -> Option<JobKind> {
        match s {
            "site_assessment" => Some(JobKind::SiteAssessment),
            "hazard_precompute" => Some(JobKind::HazardPrecompute),
            _ => None,
        }
    }
}

impl std::fmt::Display for JobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One site in a submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteRequest {
    pub location: GeoPoint,
    /// Caller-supplied identifier echoed back in results. Optional for
    /// precompute submissions, which target bare grid cells.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_id: Option<String>,
    /// Building attributes. When absent the building registry is consulted,
    /// and failing that an all-unknown profile is scored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<SiteProfile>,
    /// Insured asset value in currency units.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_value: Option<f64>,
    /// Fraction of the asset value covered by insurance, in `[0, 1]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insurance_rate: Option<f64>,
}

/// Validated payload a job was submitted with.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobInput {
    pub sites: Vec<SiteRequest>,
    pub hazard_types: Vec<HazardType>,
    /// Climate scenario the warehouse series are read under.
    pub scenario: String,
    /// Time horizon label, e.g. `current` or `2050`.
    pub epoch: String,
}

impl JobInput {
    /// Number of fan-out units: one per `(site, hazard)` pair.
    pub fn unit_count(&self) -> usize {
        self.sites.len() * self.hazard_types.len()
    }
}

/// A risk computation job as persisted by the orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskJob {
    pub id: Uuid,
    pub kind: JobKind,
    pub status: JobStatus,
    pub input: JobInput,
    /// Monotonic percentage in `[0, 100]`. Reaches 100 in every terminal
    /// state, including failure.
    pub progress: i32,
    pub total_items: i32,
    pub completed_items: i32,
    pub failed_items: i32,
    /// Per-site reports and the integrated summary, present once the job
    /// completes. Stored as JSONB alongside the row.
    pub results: Option<serde_json::Value>,
    pub error: Option<String>,
    /// Diagnostic error chain kept out of the compact status view.
    pub error_trace: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Result retention horizon. Rows for this job may be purged after it.
    pub expires_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_strings() {
        for status in [
            JobStatus::Queued,
            JobStatus::Running,
            JobStatus::Completed,
            JobStatus::Failed,
            JobStatus::Cancelled,
        ] {
            assert_eq!(JobStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(JobStatus::parse("paused"), None);
    }

    #[test]
    fn terminal_states() {
        assert!(!JobStatus::Queued.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(JobStatus::Cancelled.is_terminal());
    }

    #[test]
    fn kind_round_trips_through_strings() {
        for kind in [JobKind::SiteAssessment, JobKind::HazardPrecompute] {
            assert_eq!(JobKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(JobKind::parse("backfill"), None);
    }

    #[test]
    fn unit_count_is_sites_times_hazards() {
        let input = JobInput {
            sites: vec![
                SiteRequest {
                    location: GeoPoint::new(35.0, 139.0),
                    site_id: None,
                    profile: None,
                    asset_value: None,
                    insurance_rate: None,
                },
                SiteRequest {
                    location: GeoPoint::new(34.0, 135.0),
                    site_id: None,
                    profile: None,
                    asset_value: None,
                    insurance_rate: None,
                },
            ],
            hazard_types: vec![HazardType::Typhoon, HazardType::RiverFlood, HazardType::Drought],
            scenario: "baseline".into(),
            epoch: "current".into(),
        };
        assert_eq!(input.unit_count(), 6);
    }
}
