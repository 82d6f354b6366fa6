//! Job DTOs for the submission and status endpoints

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::hazard::HazardType;
use crate::domain::job::{JobKind, JobStatus, RiskJob, SiteRequest};
use crate::domain::site::GeoPoint;

/// Request body for `POST /assessment`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitAssessment {
    pub sites: Vec<SiteRequest>,
    /// Hazard types to score. Absent or empty means all nine.
    #[serde(default)]
    pub hazard_types: Vec<HazardType>,
    #[serde(default)]
    pub scenario: Option<String>,
    #[serde(default)]
    pub epoch: Option<String>,
}

/// Request body for `POST /precompute`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitPrecompute {
    pub locations: Vec<GeoPoint>,
    /// Hazard types to warm. Absent or empty means all nine.
    #[serde(default)]
    pub hazard_types: Vec<HazardType>,
    #[serde(default)]
    pub scenario: Option<String>,
    #[serde(default)]
    pub epoch: Option<String>,
}

/// Response to an accepted submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobAccepted {
    pub id: Uuid,
    pub kind: JobKind,
    pub status: JobStatus,
    pub total_items: i32,
}

impl From<&RiskJob> for JobAccepted {
    fn from(job: &RiskJob) -> JobAccepted {
        JobAccepted {
            id: job.id,
            kind: job.kind,
            status: job.status,
            total_items: job.total_items,
        }
    }
}

/// Poll-friendly view returned by `GET /job/{id}/status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatusView {
    pub id: Uuid,
    pub status: JobStatus,
    pub progress: i32,
    pub total_items: i32,
    pub completed_items: i32,
    pub failed_items: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl From<RiskJob> for JobStatusView {
    fn from(job: RiskJob) -> JobStatusView {
        JobStatusView {
            id: job.id,
            status: job.status,
            progress: job.progress,
            total_items: job.total_items,
            completed_items: job.completed_items,
            failed_items: job.failed_items,
            results: job.results,
            error_message: job.error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn minimal_assessment_body_deserializes() {
        let body = r#"{"sites": [{"location": {"lat": 35.68, "lon": 139.77}}]}"#;
        let req: SubmitAssessment = serde_json::from_str(body).unwrap();
        assert_eq!(req.sites.len(), 1);
        assert!(req.hazard_types.is_empty());
        assert!(req.scenario.is_none());
        assert!(req.epoch.is_none());
    }

    #[test]
    fn precompute_body_accepts_hazard_subset() {
        let body = r#"{
            "locations": [{"lat": 35.68, "lon": 139.77}],
            "hazard_types": ["typhoon", "river_flood"],
            "scenario": "rcp85",
            "epoch": "2050"
        }"#;
        let req: SubmitPrecompute = serde_json::from_str(body).unwrap();
        assert_eq!(
            req.hazard_types,
            vec![HazardType::Typhoon, HazardType::RiverFlood]
        );
        assert_eq!(req.scenario.as_deref(), Some("rcp85"));
    }

    #[test]
    fn status_view_mirrors_job_counters() {
        let now = Utc::now();
        let job = RiskJob {
            id: Uuid::new_v4(),
            kind: JobKind::SiteAssessment,
            status: JobStatus::Running,
            input: crate::domain::job::JobInput {
                sites: vec![SiteRequest {
                    location: GeoPoint::new(35.68, 139.77),
                    site_id: Some("hq".into()),
                    profile: None,
                    asset_value: None,
                    insurance_rate: None,
                }],
                hazard_types: vec![HazardType::Typhoon],
                scenario: "baseline".into(),
                epoch: "current".into(),
            },
            progress: 40,
            total_items: 9,
            completed_items: 3,
            failed_items: 1,
            results: None,
            error: None,
            error_trace: None,
            created_at: now,
            started_at: Some(now),
            finished_at: None,
            expires_at: now,
        };
        let id = job.id;
        let view = JobStatusView::from(job);
        assert_eq!(view.id, id);
        assert_eq!(view.progress, 40);
        assert_eq!(view.completed_items, 3);
        assert_eq!(view.failed_items, 1);
        assert!(view.results.is_none());
    }
}
