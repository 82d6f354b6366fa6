//! Hazard categories and risk levels
//!
//! `HazardType` is the closed set of hazard categories the platform scores.
//! It is a dimension key everywhere: result tables, job fan-out units and
//! rankings are all keyed by it. New categories are a schema change, never a
//! runtime event.

use serde::{Deserialize, Serialize};

/// The nine hazard categories covered by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HazardType {
    Typhoon,
    RiverFlood,
    UrbanFlood,
    CoastalFlood,
    Landslide,
    Drought,
    Heatwave,
    Coldwave,
    HeavySnow,
}

impl HazardType {
    /// All categories, in canonical order.
    pub const ALL: [HazardType; 9] = [
        HazardType::Typhoon,
        HazardType::RiverFlood,
        HazardType::UrbanFlood,
        HazardType::CoastalFlood,
        HazardType::Landslide,
        HazardType::Drought,
        HazardType::Heatwave,
        HazardType::Coldwave,
        HazardType::HeavySnow,
    ];

    /// Stable code used in database columns and API payloads.
    pub fn code(&self) -> &'static str {
        match self {
            HazardType::Typhoon => "typhoon",
            HazardType::RiverFlood => "river_flood",
            HazardType::UrbanFlood => "urban_flood",
            HazardType::CoastalFlood => "coastal_flood",
            HazardType::Landslide => "landslide",
            HazardType::Drought => "drought",
            HazardType::Heatwave => "heatwave",
            HazardType::Coldwave => "coldwave",
            HazardType::HeavySnow => "heavy_snow",
        }
    }

    /// Parse a stable code back into a category.
    pub fn from_code(code: &str) -> Option<HazardType> {
        HazardType::ALL.iter().copied().find(|h| h.code() == code)
    }
}

impl std::fmt::Display for HazardType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Five-tier categorical level shared by all score kinds.
///
/// The banding is fixed: a 0-100 score maps to <20 / <40 / <60 / <80 / >=80.
/// The same table is used for hazard, exposure and vulnerability levels and
/// for the overall grade of an integrated summary, so level and score can
/// never drift apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    VeryLow,
    Low,
    Moderate,
    High,
    VeryHigh,
}

impl RiskLevel {
    /// Derive the level from a 0-100 score. Out-of-range inputs saturate.
    pub fn from_score_100(score: i32) -> RiskLevel {
        match score {
            i32::MIN..20 => RiskLevel::VeryLow,
            20..40 => RiskLevel::Low,
            40..60 => RiskLevel::Moderate,
            60..80 => RiskLevel::High,
            _ => RiskLevel::VeryHigh,
        }
    }

    /// Derive the level from a score in the unit interval.
    pub fn from_unit_score(score: f64) -> RiskLevel {
        RiskLevel::from_score_100((score * 100.0).round() as i32)
    }

    /// Stable code used in database columns and API payloads.
    pub fn code(&self) -> &'static str {
        match self {
            RiskLevel::VeryLow => "very_low",
            RiskLevel::Low => "low",
            RiskLevel::Moderate => "moderate",
            RiskLevel::High => "high",
            RiskLevel::VeryHigh => "very_high",
        }
    }

    /// Parse a stable code back into a level.
    pub fn from_code(code: &str) -> Option<RiskLevel> {
        [
            RiskLevel::VeryLow,
            RiskLevel::Low,
            RiskLevel::Moderate,
            RiskLevel::High,
            RiskLevel::VeryHigh,
        ]
        .into_iter()
        .find(|l| l.code() == code)
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hazard_codes_round_trip() {
        for hazard in HazardType::ALL {
            assert_eq!(HazardType::from_code(hazard.code()), Some(hazard));
        }
    }

    #[test]
    fn hazard_codes_are_unique() {
        let mut codes: Vec<&str> = HazardType::ALL.iter().map(|h| h.code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), HazardType::ALL.len());
    }

    #[test]
    fn level_bands_match_thresholds() {
        assert_eq!(RiskLevel::from_score_100(0), RiskLevel::VeryLow);
        assert_eq!(RiskLevel::from_score_100(19), RiskLevel::VeryLow);
        assert_eq!(RiskLevel::from_score_100(20), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score_100(39), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score_100(40), RiskLevel::Moderate);
        assert_eq!(RiskLevel::from_score_100(59), RiskLevel::Moderate);
        assert_eq!(RiskLevel::from_score_100(60), RiskLevel::High);
        assert_eq!(RiskLevel::from_score_100(79), RiskLevel::High);
        assert_eq!(RiskLevel::from_score_100(80), RiskLevel::VeryHigh);
        assert_eq!(RiskLevel::from_score_100(100), RiskLevel::VeryHigh);
    }

    #[test]
    fn level_saturates_out_of_range() {
        assert_eq!(RiskLevel::from_score_100(-5), RiskLevel::VeryLow);
        assert_eq!(RiskLevel::from_score_100(140), RiskLevel::VeryHigh);
    }

    #[test]
    fn level_codes_round_trip() {
        for code in ["very_low", "low", "moderate", "high", "very_high"] {
            let level = RiskLevel::from_code(code).unwrap();
            assert_eq!(level.code(), code);
        }
    }
}
