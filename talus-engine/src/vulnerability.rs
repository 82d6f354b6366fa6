//! Vulnerability scoring
//!
//! Starts every site at a base score and adds attribute penalties for age,
//! structure, floor layout and building use. Unknown attributes draw fixed
//! neutral penalties instead of being skipped, so a site with no registry
//! record still lands mid-scale rather than at zero. The full breakdown is
//! kept so a score can always be explained.

use talus_core::domain::hazard::{HazardType, RiskLevel};
use talus_core::domain::results::PenaltyComponent;
use talus_core::domain::site::{BuildingUse, SiteProfile, StructureType};

/// Score every site starts from before penalties.
pub const BASE_SCORE: f64 = 20.0;

/// Vulnerability score for one site and hazard.
#[derive(Debug, Clone, PartialEq)]
pub struct VulnerabilityScore {
    /// Clamped to `[0, 100]`.
    pub score: f64,
    pub level: RiskLevel,
    /// Base plus non-zero penalties; sums to the pre-clamp score.
    pub breakdown: Vec<PenaltyComponent>,
}

fn age_penalty(age: Option<i32>) -> (&'static str, f64) {
    match age {
        None => ("building_age_unknown", 10.0),
        Some(a) if a >= 40 => ("building_age", 20.0),
        Some(a) if a >= 30 => ("building_age", 15.0),
        Some(a) if a >= 20 => ("building_age", 10.0),
        Some(a) if a >= 10 => ("building_age", 5.0),
        Some(_) => ("building_age", 0.0),
    }
}

fn structure_penalty(structure: Option<StructureType>) -> (&'static str, f64) {
    match structure {
        None => ("structure_unknown", 8.0),
        Some(StructureType::Wood) => ("structure", 15.0),
        Some(StructureType::Masonry) => ("structure", 10.0),
        Some(StructureType::Other) => ("structure", 8.0),
        Some(StructureType::Steel) => ("structure", 5.0),
        Some(StructureType::ReinforcedConcrete) => ("structure", 0.0),
    }
}

fn usage_penalty(usage: Option<BuildingUse>) -> (&'static str, f64) {
    match usage {
        None => ("usage_unknown", 3.0),
        Some(BuildingUse::Residential) | Some(BuildingUse::Public) => ("building_use", 5.0),
        Some(BuildingUse::Industrial) => ("building_use", 4.0),
        Some(BuildingUse::Commercial) | Some(BuildingUse::Other) => ("building_use", 3.0),
    }
}

/// Floor-layout penalties depend on the hazard: below-grade floors matter
/// for water hazards, height matters for wind and roof load.
fn floor_penalties(hazard: HazardType, profile: &SiteProfile) -> Vec<(&'static str, f64)> {
    let mut penalties = Vec::new();
    match hazard {
        HazardType::RiverFlood | HazardType::UrbanFlood | HazardType::CoastalFlood => {
            if profile.floors_below.is_some_and(|f| f >= 1) {
                penalties.push(("underground_floors", 10.0));
            }
            if profile.floors_above.is_some_and(|f| f <= 1) {
                penalties.push(("single_story", 5.0));
            }
        }
        HazardType::Landslide => {
            if profile.floors_below.is_some_and(|f| f >= 1) {
                penalties.push(("underground_floors", 5.0));
            }
        }
        HazardType::Typhoon => {
            if profile.floors_above.is_some_and(|f| f >= 10) {
                penalties.push(("high_rise", 5.0));
            }
        }
        HazardType::HeavySnow => {
            if profile.floors_above.is_some_and(|f| f <= 1) {
                penalties.push(("single_story", 5.0));
            }
        }
        HazardType::Drought | HazardType::Heatwave | HazardType::Coldwave => {}
    }
    penalties
}

/// Score one site's vulnerability to one hazard. Pure.
pub fn assess(hazard: HazardType, profile: &SiteProfile, assessment_year: i32) -> VulnerabilityScore {
    let mut breakdown = vec![PenaltyComponent { attribute: "base".into(), points: BASE_SCORE }];

    let push = |breakdown: &mut Vec<PenaltyComponent>, attribute: &str, points: f64| {
        if points != 0.0 {
            breakdown.push(PenaltyComponent { attribute: attribute.into(), points });
        }
    };

    let (attribute, points) = age_penalty(profile.age_at(assessment_year));
    push(&mut breakdown, attribute, points);
    let (attribute, points) = structure_penalty(profile.structure);
    push(&mut breakdown, attribute, points);
    let (attribute, points) = usage_penalty(profile.usage);
    push(&mut breakdown, attribute, points);
    for (attribute, points) in floor_penalties(hazard, profile) {
        push(&mut breakdown, attribute, points);
    }

    let total: f64 = breakdown.iter().map(|c| c.points).sum();
    let score = total.clamp(0.0, 100.0);
    VulnerabilityScore {
        score,
        level: RiskLevel::from_score_100(score.round() as i32),
        breakdown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const YEAR: i32 = 2026;

    #[test]
    fn unknown_profile_lands_mid_scale() {
        let result = assess(HazardType::Typhoon, &SiteProfile::default(), YEAR);
        // base 20 + age 10 + structure 8 + usage 3
        assert!((result.score - 41.0).abs() < 1e-9);
        assert_eq!(result.level, RiskLevel::Moderate);
    }

    #[test]
    fn breakdown_sums_to_the_score() {
        let profile = SiteProfile {
            built_year: Some(1970),
            structure: Some(StructureType::Wood),
            floors_above: Some(1),
            floors_below: Some(0),
            usage: Some(BuildingUse::Residential),
        };
        let result = assess(HazardType::RiverFlood, &profile, YEAR);
        let total: f64 = result.breakdown.iter().map(|c| c.points).sum();
        assert!((total - result.score).abs() < 1e-9);
        // base 20 + age 20 + wood 15 + residential 5 + single story 5
        assert!((result.score - 65.0).abs() < 1e-9);
        assert_eq!(result.level, RiskLevel::High);
    }

    #[test]
    fn reinforced_concrete_draws_no_structure_penalty() {
        let profile = SiteProfile {
            built_year: Some(2015),
            structure: Some(StructureType::ReinforcedConcrete),
            floors_above: Some(20),
            floors_below: Some(0),
            usage: Some(BuildingUse::Commercial),
        };
        let result = assess(HazardType::Typhoon, &profile, YEAR);
        // base 20 + age 5 + high rise 5 + commercial 3
        assert!((result.score - 33.0).abs() < 1e-9);
        assert!(!result.breakdown.iter().any(|c| c.attribute == "structure"));
        assert!(result.breakdown.iter().any(|c| c.attribute == "high_rise"));
    }

    #[test]
    fn basements_penalize_water_hazards_only() {
        let profile = SiteProfile {
            built_year: Some(2020),
            structure: Some(StructureType::ReinforcedConcrete),
            floors_above: Some(5),
            floors_below: Some(2),
            usage: Some(BuildingUse::Commercial),
        };
        let flood = assess(HazardType::UrbanFlood, &profile, YEAR);
        let heat = assess(HazardType::Heatwave, &profile, YEAR);
        assert!(flood.breakdown.iter().any(|c| c.attribute == "underground_floors"));
        assert!(!heat.breakdown.iter().any(|c| c.attribute == "underground_floors"));
        assert!(flood.score > heat.score);
    }

    #[test]
    fn age_bands_step_at_decade_boundaries() {
        for (built, expected) in [
            (YEAR - 45, 20.0),
            (YEAR - 40, 20.0),
            (YEAR - 35, 15.0),
            (YEAR - 25, 10.0),
            (YEAR - 12, 5.0),
            (YEAR - 3, 0.0),
        ] {
            let (_, points) = age_penalty(Some(YEAR - built));
            assert_eq!(points, expected, "built {built}");
        }
    }

    #[test]
    fn score_stays_inside_bounds() {
        let worst = SiteProfile {
            built_year: Some(1950),
            structure: Some(StructureType::Wood),
            floors_above: Some(1),
            floors_below: Some(1),
            usage: Some(BuildingUse::Residential),
        };
        let result = assess(HazardType::CoastalFlood, &worst, YEAR);
        assert!(result.score <= 100.0);
        assert!(result.score >= 0.0);
        assert_eq!(result.level, RiskLevel::from_score_100(result.score.round() as i32));
    }
}
