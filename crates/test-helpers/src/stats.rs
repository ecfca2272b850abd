//! Goodness-of-fit checks at a fixed significance level.
//!
//! Both checks use α = 0.001, so a correct sampler driven by a fixed seed
//! fails them with negligible probability.

/// Standard normal quantile for 1 - α with α = 0.001.
const Z_999: f64 = 3.090_232;

/// Kolmogorov–Smirnov coefficient `sqrt(-ln(α / 2) / 2)` for α = 0.001.
const KS_COEFFICIENT: f64 = 1.949_5;

/// Pearson's chi-square statistic.
pub fn chi_square(observed: &[f64], expected: &[f64]) -> f64 {
    assert_eq!(observed.len(), expected.len(), "length mismatch");
    observed
        .iter()
        .zip(expected)
        .map(|(o, e)| (o - e).powi(2) / e)
        .sum()
}

/// Upper critical value of the chi-square distribution at α = 0.001,
/// using the Wilson–Hilferty approximation.
pub fn chi_square_critical(degrees_of_freedom: usize) -> f64 {
    let k = degrees_of_freedom as f64;
    let term = 2.0 / (9.0 * k);
    k * (1.0 - term + Z_999 * term.sqrt()).powi(3)
}

/// Whether observed counts are consistent with expected counts.
pub fn chi_square_passes(observed: &[f64], expected: &[f64]) -> bool {
    let statistic = chi_square(observed, expected);
    let critical = chi_square_critical(observed.len().saturating_sub(1).max(1));
    statistic < critical
}

/// Kolmogorov–Smirnov distance between `samples` and Exponential(`rate`).
pub fn ks_exponential(samples: &[f64], rate: f64) -> f64 {
    let mut sorted = samples.to_vec();
    sorted.sort_by(f64::total_cmp);
    let n = sorted.len() as f64;

    sorted
        .iter()
        .enumerate()
        .map(|(i, x)| {
            let cdf = 1.0 - (-rate * x).exp();
            let below = (cdf - i as f64 / n).abs();
            let above = ((i + 1) as f64 / n - cdf).abs();
            below.max(above)
        })
        .fold(0.0, f64::max)
}

/// Whether `samples` are consistent with Exponential(`rate`).
pub fn ks_exponential_passes(samples: &[f64], rate: f64) -> bool {
    let critical = KS_COEFFICIENT / (samples.len() as f64).sqrt();
    ks_exponential(samples, rate) < critical
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chi_square_critical_values() {
        // Tabulated: df=1 -> 10.83, df=10 -> 29.59
        assert!((chi_square_critical(1) - 10.83).abs() < 0.6);
        assert!((chi_square_critical(10) - 29.59).abs() < 0.3);
    }

    #[test]
    fn test_chi_square_detects_bias() {
        let expected = [500.0, 500.0];
        assert!(chi_square_passes(&[510.0, 490.0], &expected));
        assert!(!chi_square_passes(&[700.0, 300.0], &expected));
    }

    #[test]
    fn test_ks_detects_wrong_rate() {
        // Exact quantiles of Exponential(2)
        let n = 1_000;
        let samples: Vec<f64> = (0..n)
            .map(|i| -((1.0 - (i as f64 + 0.5) / n as f64).ln()) / 2.0)
            .collect();
        assert!(ks_exponential_passes(&samples, 2.0));
        assert!(!ks_exponential_passes(&samples, 1.0));
    }
}
