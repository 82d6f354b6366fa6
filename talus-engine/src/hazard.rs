//! Hazard scoring
//!
//! Combines the normalized indicator values of a grid cell into a single
//! hazard score per hazard type. Weights are fixed per hazard; indicators
//! the table does not name still contribute with a small default weight so
//! new warehouse fields degrade gracefully instead of being ignored.

use talus_core::domain::climate::IndicatorValue;
use talus_core::domain::hazard::{HazardType, RiskLevel};

/// Weight applied to indicators absent from the hazard's table.
pub const DEFAULT_INDICATOR_WEIGHT: f64 = 0.2;

/// Hazard intensity score for one grid cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HazardScore {
    /// Weighted indicator mean in `[0, 1]`.
    pub score: f64,
    pub score_100: i32,
    pub level: RiskLevel,
}

fn weights_for(hazard: HazardType) -> &'static [(&'static str, f64)] {
    match hazard {
        HazardType::Typhoon => &[
            ("max_wind_speed", 0.5),
            ("storm_frequency", 0.3),
            ("track_density", 0.2),
        ],
        HazardType::RiverFlood => &[
            ("inundation_depth", 0.5),
            ("flood_frequency", 0.3),
            ("drainage_deficit", 0.2),
        ],
        HazardType::UrbanFlood => &[
            ("rainfall_intensity", 0.4),
            ("imperviousness", 0.3),
            ("drainage_deficit", 0.3),
        ],
        HazardType::CoastalFlood => &[
            ("surge_height", 0.5),
            ("elevation_deficit", 0.3),
            ("tide_range", 0.2),
        ],
        HazardType::Landslide => &[
            ("slope_angle", 0.4),
            ("soil_instability", 0.3),
            ("rainfall_intensity", 0.3),
        ],
        HazardType::Drought => &[
            ("dry_spell_length", 0.4),
            ("water_stress", 0.35),
            ("soil_moisture_deficit", 0.25),
        ],
        HazardType::Heatwave => &[
            ("hot_day_count", 0.4),
            ("max_temperature", 0.35),
            ("urban_heat_island", 0.25),
        ],
        HazardType::Coldwave => &[
            ("cold_day_count", 0.5),
            ("min_temperature", 0.5),
        ],
        HazardType::HeavySnow => &[
            ("max_snow_depth", 0.5),
            ("snowfall_intensity", 0.3),
            ("snow_day_count", 0.2),
        ],
    }
}

fn weight_of(hazard: HazardType, indicator: &str) -> f64 {
    weights_for(hazard)
        .iter()
        .find(|(name, _)| *name == indicator)
        .map(|(_, w)| *w)
        .unwrap_or(DEFAULT_INDICATOR_WEIGHT)
}

/// Score one grid cell for one hazard type. Pure; an empty indicator set
/// scores 0.
pub fn score(hazard: HazardType, indicators: &[IndicatorValue]) -> HazardScore {
    let mut weighted_sum = 0.0;
    let mut weight_total = 0.0;
    for indicator in indicators {
        if !indicator.value.is_finite() {
            continue;
        }
        let weight = weight_of(hazard, &indicator.indicator);
        weighted_sum += weight * indicator.value.clamp(0.0, 1.0);
        weight_total += weight;
    }

    let score = if weight_total > 0.0 {
        (weighted_sum / weight_total).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let score_100 = (score * 100.0).round() as i32;
    HazardScore {
        score,
        score_100,
        level: RiskLevel::from_score_100(score_100),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn indicator(name: &str, value: f64) -> IndicatorValue {
        IndicatorValue { indicator: name.into(), value }
    }

    #[test]
    fn empty_indicator_set_scores_zero() {
        let result = score(HazardType::Typhoon, &[]);
        assert_eq!(result.score, 0.0);
        assert_eq!(result.score_100, 0);
        assert_eq!(result.level, RiskLevel::VeryLow);
    }

    #[test]
    fn uniform_indicators_score_their_value() {
        let indicators = vec![
            indicator("max_wind_speed", 0.6),
            indicator("storm_frequency", 0.6),
            indicator("track_density", 0.6),
        ];
        let result = score(HazardType::Typhoon, &indicators);
        assert!((result.score - 0.6).abs() < 1e-9);
        assert_eq!(result.score_100, 60);
        assert_eq!(result.level, RiskLevel::High);
    }

    #[test]
    fn heavier_indicator_dominates() {
        let high_primary = score(
            HazardType::RiverFlood,
            &[indicator("inundation_depth", 1.0), indicator("drainage_deficit", 0.0)],
        );
        let high_secondary = score(
            HazardType::RiverFlood,
            &[indicator("inundation_depth", 0.0), indicator("drainage_deficit", 1.0)],
        );
        assert!(high_primary.score > high_secondary.score);
    }

    #[test]
    fn unknown_indicators_get_the_default_weight() {
        let result = score(HazardType::Drought, &[indicator("novel_metric", 1.0)]);
        assert!((result.score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn values_outside_unit_interval_are_clamped() {
        let result = score(HazardType::Heatwave, &[indicator("hot_day_count", 3.5)]);
        assert_eq!(result.score_100, 100);
        assert_eq!(result.level, RiskLevel::VeryHigh);
    }

    #[test]
    fn level_is_always_consistent_with_score() {
        for step in 0..=100 {
            let value = step as f64 / 100.0;
            let result = score(HazardType::Landslide, &[indicator("slope_angle", value)]);
            assert_eq!(result.level, RiskLevel::from_score_100(result.score_100));
        }
    }

    #[test]
    fn table_weights_sum_to_one_per_hazard() {
        for hazard in HazardType::ALL {
            let total: f64 = weights_for(hazard).iter().map(|(_, w)| w).sum();
            assert!((total - 1.0).abs() < 1e-9, "{hazard} weights sum to {total}");
        }
    }
}
