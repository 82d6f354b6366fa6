//! Probability-of-intensity estimation
//!
//! `estimate` turns an annual-maximum intensity series into a probability
//! vector over the hazard's bin table, plus the base AAL as the
//! probability-weighted damage rate. The kernel path needs at least
//! [`MIN_KDE_SAMPLES`] observations and positive variance; every other
//! input, including the empty series, takes the histogram path. The
//! function never fails and never returns an invalid distribution.

use talus_core::domain::climate::IntensitySample;
use talus_core::domain::results::EstimatorMethod;

use crate::bins::BinSpec;

/// Minimum observation count for the kernel density path.
pub const MIN_KDE_SAMPLES: usize = 3;

/// Total-mass floor below which a kernel result is considered degenerate.
const TOTAL_MASS_FLOOR: f64 = 1e-9;

/// Output of [`estimate`].
#[derive(Debug, Clone, PartialEq)]
pub struct ProbabilityEstimate {
    /// One entry per bin; sums to 1 within 1e-6 whenever bins exist.
    pub bin_probabilities: Vec<f64>,
    /// Probability-weighted damage rate over the bin table.
    pub aal: f64,
    pub method: EstimatorMethod,
    /// Finite observations actually used.
    pub sample_count: usize,
}

/// Estimate the per-bin probability vector for one intensity series.
pub fn estimate(samples: &[IntensitySample], spec: &BinSpec) -> ProbabilityEstimate {
    if spec.is_empty() {
        return ProbabilityEstimate {
            bin_probabilities: Vec::new(),
            aal: 0.0,
            method: EstimatorMethod::Histogram,
            sample_count: samples.len(),
        };
    }

    // Non-finite warehouse values carry no information about the
    // distribution and would poison every downstream mass.
    let values: Vec<f64> = samples
        .iter()
        .map(|s| s.value)
        .filter(|v| v.is_finite())
        .collect();

    let (bin_probabilities, method) = if values.len() >= MIN_KDE_SAMPLES {
        match kernel_masses(&values, spec) {
            Some(masses) => (masses, EstimatorMethod::KernelDensity),
            None => (histogram_masses(&values, spec), EstimatorMethod::Histogram),
        }
    } else {
        (histogram_masses(&values, spec), EstimatorMethod::Histogram)
    };

    let aal = expected_damage(&bin_probabilities, spec);
    ProbabilityEstimate {
        bin_probabilities,
        aal,
        method,
        sample_count: values.len(),
    }
}

/// Gaussian KDE with Scott's bandwidth `h = sigma * n^(-1/5)`.
///
/// Per-bin mass is the exact Gaussian CDF difference averaged over the
/// sample kernels. The open edges of the table are substituted with an
/// outward extension of the observed range before integration. Returns
/// None on any numerical degeneracy so the caller can fall back.
fn kernel_masses(values: &[f64], spec: &BinSpec) -> Option<Vec<f64>> {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let sigma = variance.sqrt();
    if !sigma.is_finite() || sigma <= 0.0 {
        return None;
    }
    let bandwidth = sigma * n.powf(-0.2);
    if !bandwidth.is_finite() || bandwidth <= 0.0 {
        return None;
    }

    let min_observed = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max_observed = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let mut masses = Vec::with_capacity(spec.len());
    for (i, bin) in spec.bins.iter().enumerate() {
        // The first bin absorbs everything below the table and the open
        // top bin everything above it; the substituted edges extend the
        // observed range by 20% so no kernel mass is stranded.
        let lower = if i == 0 {
            bin.lower.min(min_observed * 0.8)
        } else {
            bin.lower
        };
        let upper = match bin.upper {
            Some(upper) => upper,
            None => (max_observed * 1.2).max(bin.lower),
        };
        let mass = values
            .iter()
            .map(|&x| normal_cdf(upper, x, bandwidth) - normal_cdf(lower, x, bandwidth))
            .sum::<f64>()
            / n;
        if !mass.is_finite() {
            return None;
        }
        masses.push(mass.clamp(0.0, 1.0));
    }

    let total: f64 = masses.iter().sum();
    if !total.is_finite() || total < TOTAL_MASS_FLOOR {
        return None;
    }
    for mass in &mut masses {
        *mass /= total;
    }
    Some(masses)
}

/// Normalized per-bin counts. The empty series yields the uniform vector.
fn histogram_masses(values: &[f64], spec: &BinSpec) -> Vec<f64> {
    if values.is_empty() {
        return vec![1.0 / spec.len() as f64; spec.len()];
    }
    let mut counts = vec![0.0_f64; spec.len()];
    for &value in values {
        counts[spec.index_of(value)] += 1.0;
    }
    let n = values.len() as f64;
    for count in &mut counts {
        *count /= n;
    }
    counts
}

fn expected_damage(probabilities: &[f64], spec: &BinSpec) -> f64 {
    probabilities
        .iter()
        .zip(spec.damage_rates())
        .map(|(p, rate)| p * rate)
        .sum()
}

/// CDF of a Gaussian kernel centered at `mean` with width `sd`.
fn normal_cdf(x: f64, mean: f64, sd: f64) -> f64 {
    0.5 * (1.0 + erf((x - mean) / (sd * std::f64::consts::SQRT_2)))
}

/// Abramowitz & Stegun 7.1.26 rational approximation, max error 1.5e-7.
fn erf(x: f64) -> f64 {
    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();

    const A1: f64 = 0.254829592;
    const A2: f64 = -0.284496736;
    const A3: f64 = 1.421413741;
    const A4: f64 = -1.453152027;
    const A5: f64 = 1.061405429;
    const P: f64 = 0.3275911;

    let t = 1.0 / (1.0 + P * x);
    let poly = ((((A5 * t + A4) * t + A3) * t + A2) * t + A1) * t;
    sign * (1.0 - poly * (-x * x).exp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bins::{Bin, spec_for};
    use talus_core::domain::hazard::HazardType;

    fn toy_spec() -> BinSpec {
        BinSpec {
            hazard_type: HazardType::RiverFlood,
            unit: "m",
            bins: &[
                Bin { lower: 0.0, upper: Some(5.0), damage_rate: 0.01 },
                Bin { lower: 5.0, upper: Some(15.0), damage_rate: 0.05 },
                Bin { lower: 15.0, upper: None, damage_rate: 0.2 },
            ],
        }
    }

    fn series(values: &[f64]) -> Vec<IntensitySample> {
        values
            .iter()
            .enumerate()
            .map(|(i, &value)| IntensitySample { year: 2000 + i as i32, value })
            .collect()
    }

    #[test]
    fn identical_samples_fall_back_to_histogram() {
        let estimate = estimate(&series(&[10.0, 10.0, 10.0, 10.0, 10.0]), &toy_spec());
        assert_eq!(estimate.method, EstimatorMethod::Histogram);
        assert_eq!(estimate.bin_probabilities, vec![0.0, 1.0, 0.0]);
        assert!((estimate.aal - 0.05).abs() < 1e-12);
        assert_eq!(estimate.sample_count, 5);
    }

    #[test]
    fn empty_series_yields_uniform_vector() {
        let estimate = estimate(&[], &toy_spec());
        assert_eq!(estimate.method, EstimatorMethod::Histogram);
        assert_eq!(estimate.sample_count, 0);
        for p in &estimate.bin_probabilities {
            assert!((p - 1.0 / 3.0).abs() < 1e-12);
        }
        let total: f64 = estimate.bin_probabilities.iter().sum();
        assert!((total - 1.0).abs() < 1e-6);
    }

    #[test]
    fn small_series_uses_histogram_counts() {
        let estimate = estimate(&series(&[4.0, 12.0]), &toy_spec());
        assert_eq!(estimate.method, EstimatorMethod::Histogram);
        assert_eq!(estimate.bin_probabilities, vec![0.5, 0.5, 0.0]);
    }

    #[test]
    fn kernel_vector_is_a_distribution() {
        let spec = spec_for(HazardType::Typhoon);
        let estimate = estimate(&series(&[12.0, 18.0, 22.0, 27.0, 35.0, 41.0, 15.0]), spec);
        assert_eq!(estimate.method, EstimatorMethod::KernelDensity);
        let total: f64 = estimate.bin_probabilities.iter().sum();
        assert!((total - 1.0).abs() < 1e-6, "total mass {total}");
        for p in &estimate.bin_probabilities {
            assert!((0.0..=1.0).contains(p));
        }
    }

    #[test]
    fn kernel_mass_concentrates_where_the_samples_are() {
        let estimate = estimate(&series(&[9.0, 10.0, 11.0, 10.5, 9.5]), &toy_spec());
        assert_eq!(estimate.method, EstimatorMethod::KernelDensity);
        assert!(
            estimate.bin_probabilities[1] > 0.8,
            "middle bin got {}",
            estimate.bin_probabilities[1]
        );
    }

    #[test]
    fn zero_variance_never_panics() {
        let estimate = estimate(&series(&[7.0, 7.0, 7.0, 7.0]), &toy_spec());
        assert_eq!(estimate.method, EstimatorMethod::Histogram);
        assert_eq!(estimate.bin_probabilities, vec![0.0, 1.0, 0.0]);
    }

    #[test]
    fn non_finite_observations_are_dropped() {
        let mut samples = series(&[10.0]);
        samples.push(IntensitySample { year: 2001, value: f64::NAN });
        samples.push(IntensitySample { year: 2002, value: f64::INFINITY });
        let estimate = estimate(&samples, &toy_spec());
        assert_eq!(estimate.sample_count, 1);
        assert_eq!(estimate.bin_probabilities, vec![0.0, 1.0, 0.0]);
    }

    #[test]
    fn aal_is_the_probability_weighted_damage_rate() {
        let estimate = estimate(&series(&[4.0, 12.0]), &toy_spec());
        assert!((estimate.aal - (0.5 * 0.01 + 0.5 * 0.05)).abs() < 1e-12);
    }

    #[test]
    fn erf_matches_reference_values() {
        assert_eq!(erf(0.0), 0.0);
        assert!((erf(1.0) - 0.842_700_79).abs() < 1e-6);
        assert!((erf(-1.0) + 0.842_700_79).abs() < 1e-6);
        assert!((erf(3.0) - 0.999_977_91).abs() < 1e-6);
    }

    #[test]
    fn kernel_cdf_is_centered_on_the_sample() {
        assert!((normal_cdf(10.0, 10.0, 1.5) - 0.5).abs() < 1e-12);
        assert!(normal_cdf(13.0, 10.0, 1.5) > 0.95);
        assert!(normal_cdf(7.0, 10.0, 1.5) < 0.05);
    }
}
