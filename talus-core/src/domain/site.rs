//! Site geometry and building profiles

use serde::{Deserialize, Serialize};

/// A WGS84 point. Latitude and longitude in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> GeoPoint {
        GeoPoint { lat, lon }
    }

    /// True when the point lies inside the valid WGS84 envelope.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }

    /// Canonical grid cell key at four decimal places (roughly 11 m).
    ///
    /// Every climate lookup and result row is keyed by this string, so two
    /// coordinates that round to the same cell share cached hazard data.
    pub fn grid_key(&self) -> String {
        format!("{:.4},{:.4}", self.lat, self.lon)
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.4}, {:.4})", self.lat, self.lon)
    }
}

/// Load-bearing structure of a building.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructureType {
    ReinforcedConcrete,
    Steel,
    Masonry,
    Wood,
    Other,
}

impl StructureType {
    pub fn code(&self) -> &'static str {
        match self {
            StructureType::ReinforcedConcrete => "reinforced_concrete",
            StructureType::Steel => "steel",
            StructureType::Masonry => "masonry",
            StructureType::Wood => "wood",
            StructureType::Other => "other",
        }
    }

    pub fn from_code(code: &str) -> Option<StructureType> {
        [
            StructureType::ReinforcedConcrete,
            StructureType::Steel,
            StructureType::Masonry,
            StructureType::Wood,
            StructureType::Other,
        ]
        .into_iter()
        .find(|s| s.code() == code)
    }
}

/// Primary use of a building.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildingUse {
    Residential,
    Commercial,
    Industrial,
    Public,
    Other,
}

impl BuildingUse {
    pub fn code(&self) -> &'static str {
        match self {
            BuildingUse::Residential => "residential",
            BuildingUse::Commercial => "commercial",
            BuildingUse::Industrial => "industrial",
            BuildingUse::Public => "public",
            BuildingUse::Other => "other",
        }
    }

    pub fn from_code(code: &str) -> Option<BuildingUse> {
        [
            BuildingUse::Residential,
            BuildingUse::Commercial,
            BuildingUse::Industrial,
            BuildingUse::Public,
            BuildingUse::Other,
        ]
        .into_iter()
        .find(|u| u.code() == code)
    }
}

/// Building attributes used by vulnerability scoring.
///
/// Every field is optional. A site with no registry record scores against
/// `SiteProfile::default()`, which is all-unknown and draws the neutral
/// penalties.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SiteProfile {
    /// Construction year, e.g. 1998.
    pub built_year: Option<i32>,
    pub structure: Option<StructureType>,
    pub floors_above: Option<i32>,
    pub floors_below: Option<i32>,
    pub usage: Option<BuildingUse>,
}

impl SiteProfile {
    /// Building age in whole years at the given assessment year.
    pub fn age_at(&self, assessment_year: i32) -> Option<i32> {
        self.built_year.map(|y| (assessment_year - y).max(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_key_rounds_to_four_decimals() {
        let point = GeoPoint::new(35.68123456, 139.76987654);
        assert_eq!(point.grid_key(), "35.6812,139.7699");
    }

    #[test]
    fn nearby_points_share_a_grid_cell() {
        let a = GeoPoint::new(35.68121, 139.76988);
        let b = GeoPoint::new(35.68123, 139.76991);
        assert_eq!(a.grid_key(), b.grid_key());
    }

    #[test]
    fn validity_envelope() {
        assert!(GeoPoint::new(35.0, 139.0).is_valid());
        assert!(GeoPoint::new(-90.0, 180.0).is_valid());
        assert!(!GeoPoint::new(90.1, 0.0).is_valid());
        assert!(!GeoPoint::new(0.0, -180.5).is_valid());
        assert!(!GeoPoint::new(f64::NAN, 0.0).is_valid());
    }

    #[test]
    fn age_clamps_future_construction() {
        let profile = SiteProfile {
            built_year: Some(2030),
            ..SiteProfile::default()
        };
        assert_eq!(profile.age_at(2026), Some(0));
        assert_eq!(SiteProfile::default().age_at(2026), None);
    }

    #[test]
    fn structure_codes_round_trip() {
        for code in ["reinforced_concrete", "steel", "masonry", "wood", "other"] {
            assert_eq!(StructureType::from_code(code).unwrap().code(), code);
        }
    }
}
