//! Climate observations as read from the warehouse

use serde::{Deserialize, Serialize};

/// One annual-maximum intensity observation for a grid cell and hazard.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntensitySample {
    pub year: i32,
    pub value: f64,
}

/// A named hazard indicator value for a grid cell, already normalized to
/// the unit interval by the upstream ingestion pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorValue {
    pub indicator: String,
    pub value: f64,
}
