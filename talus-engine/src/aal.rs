//! AAL scaling
//!
//! Turns the per-cell base AAL into a site-specific figure by applying the
//! vulnerability factor and the insurance haircut. This is the one engine
//! stage with strict input validation: submissions carrying out-of-range
//! rates must be rejected before a job ever runs.

use crate::error::EngineError;

/// Result of scaling one base AAL.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AalComputation {
    /// `[0.9, 1.1]`, from the vulnerability score.
    pub vulnerability_factor: f64,
    pub final_aal: f64,
    /// `final_aal * asset_value`; None when the asset value is unknown.
    pub expected_loss: Option<f64>,
}

/// Vulnerability factor `F = 0.9 + (v / 100) * 0.2`.
///
/// Monotone in `v`, bounded to `[0.9, 1.1]`, and exactly 1.0 at the
/// mid-scale score of 50.
pub fn vulnerability_scale(vulnerability_score: f64) -> f64 {
    0.9 + (vulnerability_score / 100.0) * 0.2
}

/// Scale a base AAL for one site.
pub fn scale(
    base_aal: f64,
    vulnerability_score: f64,
    insurance_rate: f64,
    asset_value: Option<f64>,
) -> Result<AalComputation, EngineError> {
    if !(0.0..=1.0).contains(&base_aal) {
        return Err(EngineError::validation(format!(
            "base AAL must be within 0..=1, got {base_aal}"
        )));
    }
    if !(0.0..=100.0).contains(&vulnerability_score) {
        return Err(EngineError::validation(format!(
            "vulnerability score must be within 0..=100, got {vulnerability_score}"
        )));
    }
    if !(0.0..=1.0).contains(&insurance_rate) {
        return Err(EngineError::validation(format!(
            "insurance rate must be within 0..=1, got {insurance_rate}"
        )));
    }
    if let Some(value) = asset_value {
        if !value.is_finite() || value < 0.0 {
            return Err(EngineError::validation(format!(
                "asset value must be finite and non-negative, got {value}"
            )));
        }
    }

    let vulnerability_factor = vulnerability_scale(vulnerability_score);
    let final_aal = base_aal * vulnerability_factor * (1.0 - insurance_rate);
    Ok(AalComputation {
        vulnerability_factor,
        final_aal,
        expected_loss: asset_value.map(|value| final_aal * value),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factor_is_monotone_and_bounded() {
        let mut last = f64::NEG_INFINITY;
        for v in [0.0, 25.0, 50.0, 75.0, 100.0] {
            let factor = vulnerability_scale(v);
            assert!(factor > last);
            assert!((0.9..=1.1).contains(&factor));
            last = factor;
        }
    }

    #[test]
    fn mid_scale_score_leaves_aal_unchanged() {
        assert_eq!(vulnerability_scale(50.0), 1.0);
        let result = scale(0.02, 50.0, 0.0, None).unwrap();
        assert_eq!(result.final_aal, 0.02);
    }

    #[test]
    fn worked_example() {
        let result = scale(0.05, 100.0, 0.3, None).unwrap();
        assert!((result.vulnerability_factor - 1.1).abs() < 1e-12);
        assert!((result.final_aal - 0.0385).abs() < 1e-12);
        assert_eq!(result.expected_loss, None);
    }

    #[test]
    fn expected_loss_scales_with_asset_value() {
        let result = scale(0.05, 100.0, 0.3, Some(2_000_000.0)).unwrap();
        let loss = result.expected_loss.unwrap();
        assert!((loss - 0.0385 * 2_000_000.0).abs() < 1e-6);
    }

    #[test]
    fn out_of_range_inputs_are_rejected() {
        assert!(scale(1.5, 50.0, 0.0, None).is_err());
        assert!(scale(-0.1, 50.0, 0.0, None).is_err());
        assert!(scale(0.05, 120.0, 0.0, None).is_err());
        assert!(scale(0.05, -1.0, 0.0, None).is_err());
        assert!(scale(0.05, 50.0, 1.2, None).is_err());
        assert!(scale(0.05, 50.0, -0.2, None).is_err());
        assert!(scale(0.05, 50.0, 0.0, Some(-100.0)).is_err());
    }

    #[test]
    fn nan_inputs_are_rejected() {
        assert!(scale(f64::NAN, 50.0, 0.0, None).is_err());
        assert!(scale(0.05, f64::NAN, 0.0, None).is_err());
        assert!(scale(0.05, 50.0, f64::NAN, None).is_err());
        assert!(scale(0.05, 50.0, 0.0, Some(f64::NAN)).is_err());
    }

    #[test]
    fn full_insurance_eliminates_the_final_aal() {
        let result = scale(0.08, 70.0, 1.0, Some(1_000_000.0)).unwrap();
        assert_eq!(result.final_aal, 0.0);
        assert_eq!(result.expected_loss, Some(0.0));
    }
}
