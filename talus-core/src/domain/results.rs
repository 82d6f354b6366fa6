//! Persisted result rows and the integrated summary
//!
//! Result rows are keyed by location grid key and hazard type and are
//! upserted on recomputation, never appended. `calculated_at` lets readers
//! judge staleness.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::hazard::{HazardType, RiskLevel};

/// How a probability vector was estimated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EstimatorMethod {
    #[serde(rename = "kde")]
    KernelDensity,
    #[serde(rename = "histogram")]
    Histogram,
}

impl EstimatorMethod {
    pub fn code(&self) -> &'static str {
        match self {
            EstimatorMethod::KernelDensity => "kde",
            EstimatorMethod::Histogram => "histogram",
        }
    }

    pub fn from_code(code: &str) -> Option<EstimatorMethod> {
        match code {
            "kde" => Some(EstimatorMethod::KernelDensity),
            "histogram" => Some(EstimatorMethod::Histogram),
            _ => None,
        }
    }
}

/// Probability-of-intensity distribution for one grid cell and hazard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbabilityResult {
    pub location_key: String,
    pub hazard_type: HazardType,
    pub scenario: String,
    pub epoch: String,
    /// One entry per bin of the hazard's `BinSpec`; sums to 1 within 1e-6.
    pub bin_probabilities: Vec<f64>,
    /// Expected annual damage rate, `sum(P[i] * damage_rate[i])`.
    pub aal: f64,
    pub method: EstimatorMethod,
    pub sample_count: i32,
    pub calculated_at: DateTime<Utc>,
}

/// Hazard intensity score for one grid cell and hazard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HazardResult {
    pub location_key: String,
    pub hazard_type: HazardType,
    pub scenario: String,
    pub epoch: String,
    /// Weighted indicator mean in `[0, 1]`.
    pub score: f64,
    pub score_100: i32,
    pub level: RiskLevel,
    pub calculated_at: DateTime<Utc>,
}

/// Exposure score for one site and hazard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExposureResult {
    pub location_key: String,
    pub hazard_type: HazardType,
    pub site_id: Option<String>,
    pub score: f64,
    pub level: RiskLevel,
    pub proximity_factor: f64,
    pub asset_value_norm: f64,
    /// Distance to the nearest hazard source. None for areal hazards.
    pub distance_m: Option<f64>,
    pub calculated_at: DateTime<Utc>,
}

/// One named contribution to a vulnerability score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PenaltyComponent {
    pub attribute: String,
    pub points: f64,
}

/// Vulnerability score for one site and hazard, with its audit breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VulnerabilityResult {
    pub location_key: String,
    pub hazard_type: HazardType,
    pub site_id: Option<String>,
    /// Clamped to `[0, 100]`.
    pub score: f64,
    pub level: RiskLevel,
    /// Base plus per-attribute penalties; sums to the pre-clamp score.
    pub breakdown: Vec<PenaltyComponent>,
    pub calculated_at: DateTime<Utc>,
}

/// Scaled AAL for one site and hazard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AalResult {
    pub location_key: String,
    pub hazard_type: HazardType,
    pub site_id: Option<String>,
    pub base_aal: f64,
    pub vulnerability_factor: f64,
    pub insurance_rate: f64,
    pub final_aal: f64,
    /// `final_aal * asset_value`; None when the asset value is unknown.
    pub expected_loss: Option<f64>,
    pub calculated_at: DateTime<Utc>,
}

/// Everything the pipeline produced for one (site, hazard type) unit.
///
/// `degraded` and `failure` are distinct: a degraded outcome used documented
/// defaults for optional inputs and still counts as completed; a failed
/// outcome carries placeholder zeros, increments the job's failed counter
/// and is excluded from ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HazardTypeOutcome {
    pub hazard_type: HazardType,
    pub hazard_score_100: i32,
    pub hazard_level: RiskLevel,
    pub exposure_score: f64,
    pub exposure_level: RiskLevel,
    pub vulnerability_score: f64,
    pub vulnerability_level: RiskLevel,
    pub base_aal: f64,
    pub final_aal: f64,
    pub expected_loss: Option<f64>,
    pub degraded: bool,
    pub failure: Option<String>,
}

impl HazardTypeOutcome {
    /// Placeholder outcome recorded when a unit fails.
    pub fn failed(hazard_type: HazardType, reason: impl Into<String>) -> HazardTypeOutcome {
        HazardTypeOutcome {
            hazard_type,
            hazard_score_100: 0,
            hazard_level: RiskLevel::VeryLow,
            exposure_score: 0.0,
            exposure_level: RiskLevel::VeryLow,
            vulnerability_score: 0.0,
            vulnerability_level: RiskLevel::VeryLow,
            base_aal: 0.0,
            final_aal: 0.0,
            expected_loss: None,
            degraded: true,
            failure: Some(reason.into()),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }
}

/// One entry of the per-site risk ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedHazard {
    /// 1-based position.
    pub rank: i32,
    pub hazard_type: HazardType,
    pub combined_score: f64,
    pub final_aal: f64,
    pub hazard_score_100: i32,
    pub level: RiskLevel,
}

/// A hazard type left out of the ranking, with the reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExcludedHazard {
    pub hazard_type: HazardType,
    pub reason: String,
}

/// Cross-hazard rollup for one site, derived per run and stored on the job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegratedRiskSummary {
    pub site_id: Option<String>,
    pub location_key: String,
    /// Mean of the ranked hazards' combined scores, in `[0, 100]`.
    pub overall_score: f64,
    pub overall_grade: RiskLevel,
    pub highest_risk: Option<HazardType>,
    /// Sum of known per-hazard expected losses; None when none is known.
    pub total_expected_loss: Option<f64>,
    pub ranking: Vec<RankedHazard>,
    pub excluded: Vec<ExcludedHazard>,
    pub calculated_at: DateTime<Utc>,
}

/// Full per-site report embedded in `risk_jobs.results`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteRiskReport {
    pub site_id: Option<String>,
    pub location_key: String,
    pub outcomes: Vec<HazardTypeOutcome>,
    pub summary: IntegratedRiskSummary,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimator_codes_round_trip() {
        assert_eq!(
            EstimatorMethod::from_code("kde"),
            Some(EstimatorMethod::KernelDensity)
        );
        assert_eq!(
            EstimatorMethod::from_code("histogram"),
            Some(EstimatorMethod::Histogram)
        );
        assert_eq!(EstimatorMethod::from_code("parametric"), None);
    }

    #[test]
    fn estimator_serializes_as_short_tag() {
        let json = serde_json::to_string(&EstimatorMethod::KernelDensity).unwrap();
        assert_eq!(json, "\"kde\"");
    }

    #[test]
    fn failed_outcome_is_zeroed_and_flagged() {
        let outcome = HazardTypeOutcome::failed(HazardType::Typhoon, "lookup timed out");
        assert!(outcome.is_failed());
        assert!(outcome.degraded);
        assert_eq!(outcome.final_aal, 0.0);
        assert_eq!(outcome.hazard_score_100, 0);
        assert_eq!(outcome.failure.as_deref(), Some("lookup timed out"));
    }
}
