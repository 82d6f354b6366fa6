//! Intensity bin tables
//!
//! One static `BinSpec` per hazard type: ordered half-open intervals
//! `[lower, upper)` over that hazard's intensity domain, each carrying the
//! base damage rate used for the AAL dot product. The last bin of every
//! table is open-ended. Changing a table is a recalibration, not a runtime
//! concern.

use talus_core::domain::hazard::HazardType;

/// One intensity interval with its base damage rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bin {
    pub lower: f64,
    /// None marks the open-ended top interval.
    pub upper: Option<f64>,
    /// Expected damage as a fraction of asset value for events in this bin.
    pub damage_rate: f64,
}

/// Ordered bin table for one hazard type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinSpec {
    pub hazard_type: HazardType,
    /// Unit of the intensity axis, for logs and payloads.
    pub unit: &'static str,
    pub bins: &'static [Bin],
}

impl BinSpec {
    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    /// Index of the bin containing `value`. Values below the first edge
    /// land in bin 0 and values beyond the last bounded edge land in the
    /// final bin, so every finite observation is counted somewhere.
    pub fn index_of(&self, value: f64) -> usize {
        for (i, bin) in self.bins.iter().enumerate() {
            match bin.upper {
                Some(upper) if value < upper => return i,
                None => return i,
                Some(_) => {}
            }
        }
        self.bins.len().saturating_sub(1)
    }

    pub fn damage_rates(&self) -> impl Iterator<Item = f64> + '_ {
        self.bins.iter().map(|b| b.damage_rate)
    }
}

static TYPHOON: BinSpec = BinSpec {
    hazard_type: HazardType::Typhoon,
    unit: "m/s",
    bins: &[
        Bin { lower: 0.0, upper: Some(17.0), damage_rate: 0.0002 },
        Bin { lower: 17.0, upper: Some(25.0), damage_rate: 0.0010 },
        Bin { lower: 25.0, upper: Some(33.0), damage_rate: 0.0040 },
        Bin { lower: 33.0, upper: Some(45.0), damage_rate: 0.0150 },
        Bin { lower: 45.0, upper: None, damage_rate: 0.0500 },
    ],
};

static RIVER_FLOOD: BinSpec = BinSpec {
    hazard_type: HazardType::RiverFlood,
    unit: "m",
    bins: &[
        Bin { lower: 0.0, upper: Some(0.5), damage_rate: 0.0010 },
        Bin { lower: 0.5, upper: Some(1.0), damage_rate: 0.0080 },
        Bin { lower: 1.0, upper: Some(2.0), damage_rate: 0.0300 },
        Bin { lower: 2.0, upper: Some(5.0), damage_rate: 0.1200 },
        Bin { lower: 5.0, upper: None, damage_rate: 0.3500 },
    ],
};

static URBAN_FLOOD: BinSpec = BinSpec {
    hazard_type: HazardType::UrbanFlood,
    unit: "m",
    bins: &[
        Bin { lower: 0.0, upper: Some(0.3), damage_rate: 0.0010 },
        Bin { lower: 0.3, upper: Some(0.7), damage_rate: 0.0060 },
        Bin { lower: 0.7, upper: Some(1.5), damage_rate: 0.0200 },
        Bin { lower: 1.5, upper: Some(3.0), damage_rate: 0.0800 },
        Bin { lower: 3.0, upper: None, damage_rate: 0.2000 },
    ],
};

static COASTAL_FLOOD: BinSpec = BinSpec {
    hazard_type: HazardType::CoastalFlood,
    unit: "m",
    bins: &[
        Bin { lower: 0.0, upper: Some(0.5), damage_rate: 0.0010 },
        Bin { lower: 0.5, upper: Some(1.5), damage_rate: 0.0100 },
        Bin { lower: 1.5, upper: Some(3.0), damage_rate: 0.0500 },
        Bin { lower: 3.0, upper: Some(5.0), damage_rate: 0.1500 },
        Bin { lower: 5.0, upper: None, damage_rate: 0.4000 },
    ],
};

static LANDSLIDE: BinSpec = BinSpec {
    hazard_type: HazardType::Landslide,
    unit: "mm/24h",
    bins: &[
        Bin { lower: 0.0, upper: Some(50.0), damage_rate: 0.0005 },
        Bin { lower: 50.0, upper: Some(100.0), damage_rate: 0.0050 },
        Bin { lower: 100.0, upper: Some(200.0), damage_rate: 0.0300 },
        Bin { lower: 200.0, upper: None, damage_rate: 0.1500 },
    ],
};

static DROUGHT: BinSpec = BinSpec {
    hazard_type: HazardType::Drought,
    unit: "dry days",
    bins: &[
        Bin { lower: 0.0, upper: Some(30.0), damage_rate: 0.0002 },
        Bin { lower: 30.0, upper: Some(60.0), damage_rate: 0.0020 },
        Bin { lower: 60.0, upper: Some(90.0), damage_rate: 0.0100 },
        Bin { lower: 90.0, upper: None, damage_rate: 0.0400 },
    ],
};

static HEATWAVE: BinSpec = BinSpec {
    hazard_type: HazardType::Heatwave,
    unit: "deg C",
    bins: &[
        Bin { lower: 0.0, upper: Some(30.0), damage_rate: 0.0001 },
        Bin { lower: 30.0, upper: Some(33.0), damage_rate: 0.0008 },
        Bin { lower: 33.0, upper: Some(36.0), damage_rate: 0.0040 },
        Bin { lower: 36.0, upper: Some(40.0), damage_rate: 0.0150 },
        Bin { lower: 40.0, upper: None, damage_rate: 0.0500 },
    ],
};

static COLDWAVE: BinSpec = BinSpec {
    hazard_type: HazardType::Coldwave,
    unit: "frost days",
    bins: &[
        Bin { lower: 0.0, upper: Some(5.0), damage_rate: 0.0002 },
        Bin { lower: 5.0, upper: Some(10.0), damage_rate: 0.0020 },
        Bin { lower: 10.0, upper: Some(20.0), damage_rate: 0.0100 },
        Bin { lower: 20.0, upper: None, damage_rate: 0.0300 },
    ],
};

static HEAVY_SNOW: BinSpec = BinSpec {
    hazard_type: HazardType::HeavySnow,
    unit: "cm",
    bins: &[
        Bin { lower: 0.0, upper: Some(20.0), damage_rate: 0.0005 },
        Bin { lower: 20.0, upper: Some(50.0), damage_rate: 0.0040 },
        Bin { lower: 50.0, upper: Some(100.0), damage_rate: 0.0200 },
        Bin { lower: 100.0, upper: Some(150.0), damage_rate: 0.0800 },
        Bin { lower: 150.0, upper: None, damage_rate: 0.2500 },
    ],
};

/// The calibrated bin table for a hazard type.
pub fn spec_for(hazard: HazardType) -> &'static BinSpec {
    match hazard {
        HazardType::Typhoon => &TYPHOON,
        HazardType::RiverFlood => &RIVER_FLOOD,
        HazardType::UrbanFlood => &URBAN_FLOOD,
        HazardType::CoastalFlood => &COASTAL_FLOOD,
        HazardType::Landslide => &LANDSLIDE,
        HazardType::Drought => &DROUGHT,
        HazardType::Heatwave => &HEATWAVE,
        HazardType::Coldwave => &COLDWAVE,
        HazardType::HeavySnow => &HEAVY_SNOW,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_hazard_has_a_contiguous_table() {
        for hazard in HazardType::ALL {
            let spec = spec_for(hazard);
            assert!(!spec.is_empty(), "{hazard} has no bins");
            assert_eq!(spec.hazard_type, hazard);
            assert!(spec.bins.last().unwrap().upper.is_none(), "{hazard} top bin must be open");
            for pair in spec.bins.windows(2) {
                assert_eq!(pair[0].upper, Some(pair[1].lower), "{hazard} bins must be contiguous");
            }
            for bin in spec.bins {
                assert!(bin.damage_rate >= 0.0 && bin.damage_rate <= 1.0);
            }
        }
    }

    #[test]
    fn index_lookup_respects_half_open_edges() {
        let spec = spec_for(HazardType::Typhoon);
        assert_eq!(spec.index_of(0.0), 0);
        assert_eq!(spec.index_of(16.999), 0);
        assert_eq!(spec.index_of(17.0), 1);
        assert_eq!(spec.index_of(44.999), 3);
        assert_eq!(spec.index_of(45.0), 4);
        assert_eq!(spec.index_of(120.0), 4);
    }

    #[test]
    fn values_below_the_table_clamp_to_the_first_bin() {
        let spec = spec_for(HazardType::Coldwave);
        assert_eq!(spec.index_of(-3.0), 0);
    }
}
