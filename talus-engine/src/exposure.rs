//! Exposure scoring
//!
//! Exposure combines how close a site sits to the hazard source with how
//! much value is concentrated there. Source-bound hazards carry a cutoff
//! radius beyond which proximity is zero; areal hazards act on the whole
//! grid cell and score full proximity.

use talus_core::domain::hazard::{HazardType, RiskLevel};

pub const PROXIMITY_WEIGHT: f64 = 0.6;
pub const ASSET_WEIGHT: f64 = 0.4;

/// Normalization cap for asset values; values at or above this map to 1.
pub const ASSET_VALUE_CAP: f64 = 1.0e9;

/// Exposure score for one site and hazard.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExposureScore {
    /// `[0, 1]`, weighted blend of proximity and asset concentration.
    pub score: f64,
    pub level: RiskLevel,
    pub proximity_factor: f64,
    pub asset_value_norm: f64,
}

/// Cutoff radius in meters for source-bound hazards. None means the hazard
/// is areal and proximity is always full.
pub fn cutoff_radius_m(hazard: HazardType) -> Option<f64> {
    match hazard {
        HazardType::RiverFlood => Some(3000.0),
        HazardType::UrbanFlood => Some(2500.0),
        HazardType::CoastalFlood => Some(5000.0),
        HazardType::Landslide => Some(1500.0),
        HazardType::Typhoon
        | HazardType::Drought
        | HazardType::Heatwave
        | HazardType::Coldwave
        | HazardType::HeavySnow => None,
    }
}

/// Log-scale normalization of an asset value into `[0, 1]`.
///
/// Unknown values map to 0.5, the documented neutral default.
pub fn normalize_asset_value(asset_value: Option<f64>) -> f64 {
    match asset_value {
        None => 0.5,
        Some(value) if !value.is_finite() || value <= 1.0 => 0.0,
        Some(value) => (value.log10() / ASSET_VALUE_CAP.log10()).clamp(0.0, 1.0),
    }
}

/// Score exposure for one site and hazard. Pure.
///
/// `distance_m` is the distance to the nearest mapped source; None for a
/// source-bound hazard means no source was found within the lookup radius
/// and scores zero proximity.
pub fn assess(hazard: HazardType, distance_m: Option<f64>, asset_value_norm: f64) -> ExposureScore {
    let proximity_factor = match cutoff_radius_m(hazard) {
        None => 1.0,
        Some(cutoff) => {
            let distance = distance_m.unwrap_or(cutoff);
            (1.0 - distance / cutoff).clamp(0.0, 1.0)
        }
    };
    let asset_value_norm = asset_value_norm.clamp(0.0, 1.0);
    let score = (PROXIMITY_WEIGHT * proximity_factor + ASSET_WEIGHT * asset_value_norm)
        .clamp(0.0, 1.0);
    ExposureScore {
        score,
        level: RiskLevel::from_unit_score(score),
        proximity_factor,
        asset_value_norm,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_beyond_cutoff_zeroes_proximity() {
        let result = assess(HazardType::RiverFlood, Some(4500.0), 1.0);
        assert_eq!(result.proximity_factor, 0.0);
        assert!((result.score - ASSET_WEIGHT).abs() < 1e-9);
    }

    #[test]
    fn distance_at_cutoff_zeroes_proximity() {
        let result = assess(HazardType::Landslide, Some(1500.0), 0.0);
        assert_eq!(result.proximity_factor, 0.0);
        assert_eq!(result.score, 0.0);
        assert_eq!(result.level, RiskLevel::VeryLow);
    }

    #[test]
    fn adjacent_site_scores_full_proximity() {
        let result = assess(HazardType::CoastalFlood, Some(0.0), 0.5);
        assert_eq!(result.proximity_factor, 1.0);
        assert!((result.score - (0.6 + 0.4 * 0.5)).abs() < 1e-9);
    }

    #[test]
    fn areal_hazards_ignore_distance() {
        let near = assess(HazardType::Drought, Some(100.0), 0.5);
        let far = assess(HazardType::Drought, Some(50_000.0), 0.5);
        assert_eq!(near.proximity_factor, 1.0);
        assert_eq!(near.score, far.score);
    }

    #[test]
    fn missing_distance_for_source_hazard_means_no_proximity() {
        let result = assess(HazardType::UrbanFlood, None, 0.8);
        assert_eq!(result.proximity_factor, 0.0);
    }

    #[test]
    fn asset_normalization_is_logarithmic() {
        assert_eq!(normalize_asset_value(None), 0.5);
        assert_eq!(normalize_asset_value(Some(0.0)), 0.0);
        assert_eq!(normalize_asset_value(Some(-10.0)), 0.0);
        assert_eq!(normalize_asset_value(Some(ASSET_VALUE_CAP)), 1.0);
        assert_eq!(normalize_asset_value(Some(ASSET_VALUE_CAP * 10.0)), 1.0);
        let mid = normalize_asset_value(Some(10_000.0));
        assert!((mid - 4.0 / 9.0).abs() < 1e-9);
    }

    #[test]
    fn proximity_decreases_linearly_inside_cutoff() {
        let half = assess(HazardType::RiverFlood, Some(1500.0), 0.0);
        assert!((half.proximity_factor - 0.5).abs() < 1e-9);
    }
}
