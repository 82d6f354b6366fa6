//! Cross-hazard aggregation
//!
//! Rolls the per-hazard outcomes of one site into a ranking, an overall
//! score and an overall grade. Failed hazard types never enter the ranking
//! or the mean; they are listed separately so the report stays honest about
//! what was actually computed.

use chrono::{DateTime, Utc};

use talus_core::domain::hazard::RiskLevel;
use talus_core::domain::results::{
    ExcludedHazard, HazardTypeOutcome, IntegratedRiskSummary, RankedHazard,
};

pub const HAZARD_WEIGHT: f64 = 0.4;
pub const EXPOSURE_WEIGHT: f64 = 0.3;
pub const VULNERABILITY_WEIGHT: f64 = 0.3;

/// Combined 0-100 score of one per-hazard outcome.
pub fn combined_score(outcome: &HazardTypeOutcome) -> f64 {
    HAZARD_WEIGHT * outcome.hazard_score_100 as f64
        + EXPOSURE_WEIGHT * outcome.exposure_score * 100.0
        + VULNERABILITY_WEIGHT * outcome.vulnerability_score
}

/// Build the integrated summary for one site.
pub fn aggregate(
    site_id: Option<String>,
    location_key: &str,
    outcomes: &[HazardTypeOutcome],
    calculated_at: DateTime<Utc>,
) -> IntegratedRiskSummary {
    let mut ranked: Vec<&HazardTypeOutcome> = outcomes.iter().filter(|o| !o.is_failed()).collect();
    ranked.sort_by(|a, b| {
        b.final_aal
            .total_cmp(&a.final_aal)
            .then_with(|| b.hazard_score_100.cmp(&a.hazard_score_100))
            .then_with(|| a.hazard_type.code().cmp(b.hazard_type.code()))
    });

    let ranking: Vec<RankedHazard> = ranked
        .iter()
        .enumerate()
        .map(|(i, outcome)| RankedHazard {
            rank: i as i32 + 1,
            hazard_type: outcome.hazard_type,
            combined_score: combined_score(outcome),
            final_aal: outcome.final_aal,
            hazard_score_100: outcome.hazard_score_100,
            level: RiskLevel::from_score_100(combined_score(outcome).round() as i32),
        })
        .collect();

    let excluded: Vec<ExcludedHazard> = outcomes
        .iter()
        .filter(|o| o.is_failed())
        .map(|o| ExcludedHazard {
            hazard_type: o.hazard_type,
            reason: o.failure.clone().unwrap_or_else(|| "failed".into()),
        })
        .collect();

    let overall_score = if ranking.is_empty() {
        0.0
    } else {
        ranking.iter().map(|r| r.combined_score).sum::<f64>() / ranking.len() as f64
    };

    let known_losses: Vec<f64> = ranked.iter().filter_map(|o| o.expected_loss).collect();
    let total_expected_loss = if known_losses.is_empty() {
        None
    } else {
        Some(known_losses.iter().sum())
    };

    IntegratedRiskSummary {
        site_id,
        location_key: location_key.to_string(),
        overall_score,
        overall_grade: RiskLevel::from_score_100(overall_score.round() as i32),
        highest_risk: ranking.first().map(|r| r.hazard_type),
        total_expected_loss,
        ranking,
        excluded,
        calculated_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use talus_core::domain::hazard::HazardType;

    fn outcome(hazard: HazardType, final_aal: f64, score_100: i32) -> HazardTypeOutcome {
        HazardTypeOutcome {
            hazard_type: hazard,
            hazard_score_100: score_100,
            hazard_level: RiskLevel::from_score_100(score_100),
            exposure_score: 0.5,
            exposure_level: RiskLevel::Moderate,
            vulnerability_score: 50.0,
            vulnerability_level: RiskLevel::Moderate,
            base_aal: final_aal,
            final_aal,
            expected_loss: None,
            degraded: false,
            failure: None,
        }
    }

    #[test]
    fn ranking_orders_by_final_aal_descending() {
        let outcomes = vec![
            outcome(HazardType::Drought, 0.001, 20),
            outcome(HazardType::Typhoon, 0.03, 70),
            outcome(HazardType::RiverFlood, 0.01, 50),
        ];
        let summary = aggregate(None, "35.6812,139.7699", &outcomes, Utc::now());
        let order: Vec<HazardType> = summary.ranking.iter().map(|r| r.hazard_type).collect();
        assert_eq!(
            order,
            vec![HazardType::Typhoon, HazardType::RiverFlood, HazardType::Drought]
        );
        assert_eq!(summary.ranking[0].rank, 1);
        assert_eq!(summary.highest_risk, Some(HazardType::Typhoon));
    }

    #[test]
    fn equal_aal_breaks_ties_on_hazard_score_then_code() {
        let outcomes = vec![
            outcome(HazardType::UrbanFlood, 0.02, 40),
            outcome(HazardType::Typhoon, 0.02, 60),
            outcome(HazardType::Coldwave, 0.02, 40),
        ];
        let summary = aggregate(None, "k", &outcomes, Utc::now());
        let order: Vec<HazardType> = summary.ranking.iter().map(|r| r.hazard_type).collect();
        // typhoon wins on score, then coldwave beats urban_flood lexicographically
        assert_eq!(
            order,
            vec![HazardType::Typhoon, HazardType::Coldwave, HazardType::UrbanFlood]
        );
    }

    #[test]
    fn failed_outcomes_are_excluded_from_ranking_and_mean() {
        let mut outcomes = vec![
            outcome(HazardType::Typhoon, 0.03, 70),
            outcome(HazardType::RiverFlood, 0.01, 50),
        ];
        outcomes.push(HazardTypeOutcome::failed(HazardType::Landslide, "lookup timed out"));
        let summary = aggregate(None, "k", &outcomes, Utc::now());
        assert_eq!(summary.ranking.len(), 2);
        assert_eq!(summary.excluded.len(), 1);
        assert_eq!(summary.excluded[0].hazard_type, HazardType::Landslide);
        assert_eq!(summary.excluded[0].reason, "lookup timed out");

        let expected_mean = (combined_score(&outcomes[0]) + combined_score(&outcomes[1])) / 2.0;
        assert!((summary.overall_score - expected_mean).abs() < 1e-9);
    }

    #[test]
    fn combined_score_blends_the_three_axes() {
        let o = outcome(HazardType::Heatwave, 0.0, 50);
        // 0.4 * 50 + 0.3 * 50 + 0.3 * 50
        assert!((combined_score(&o) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn empty_outcomes_produce_an_empty_summary() {
        let summary = aggregate(Some("hq".into()), "k", &[], Utc::now());
        assert!(summary.ranking.is_empty());
        assert!(summary.excluded.is_empty());
        assert_eq!(summary.overall_score, 0.0);
        assert_eq!(summary.overall_grade, RiskLevel::VeryLow);
        assert_eq!(summary.highest_risk, None);
        assert_eq!(summary.total_expected_loss, None);
    }

    #[test]
    fn expected_loss_sums_only_known_values() {
        let mut a = outcome(HazardType::Typhoon, 0.03, 70);
        a.expected_loss = Some(120_000.0);
        let b = outcome(HazardType::Drought, 0.001, 20);
        let mut c = outcome(HazardType::RiverFlood, 0.01, 50);
        c.expected_loss = Some(30_000.0);
        let summary = aggregate(None, "k", &[a, b, c], Utc::now());
        assert_eq!(summary.total_expected_loss, Some(150_000.0));
    }
}
