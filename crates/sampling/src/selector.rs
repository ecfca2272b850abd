//! Weighted random selection.

use crate::SelectError;
use rand::distributions::{Distribution, WeightedError, WeightedIndex};
use rand::Rng;

/// Pick one candidate with probability proportional to its weight.
///
/// Weights must be non-negative, not all zero, and sum to a finite value.
pub fn choose_weighted<K, R>(
    candidates: impl IntoIterator<Item = (K, f64)>,
    rng: &mut R,
) -> Result<K, SelectError>
where
    R: Rng + ?Sized,
{
    let (mut keys, weights): (Vec<K>, Vec<f64>) = candidates.into_iter().unzip();
    if keys.is_empty() {
        return Err(SelectError::Empty);
    }
    if !weights.iter().sum::<f64>().is_finite() {
        return Err(SelectError::InvalidWeights(WeightedError::InvalidWeight));
    }

    let index = WeightedIndex::new(&weights)?.sample(rng);
    Ok(keys.swap_remove(index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use epinet_test_helpers::stats::chi_square_passes;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_frequencies_follow_weights() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let weights = [("a", 1.0), ("b", 2.0), ("c", 7.0)];
        let trials = 20_000;

        let mut hits = [0.0f64; 3];
        for _ in 0..trials {
            match choose_weighted(weights, &mut rng).unwrap() {
                "a" => hits[0] += 1.0,
                "b" => hits[1] += 1.0,
                _ => hits[2] += 1.0,
            }
        }

        let expected: Vec<f64> = weights.iter().map(|(_, w)| w / 10.0 * trials as f64).collect();
        assert!(chi_square_passes(&hits, &expected));
    }

    #[test]
    fn test_zero_weight_never_chosen() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        for _ in 0..1_000 {
            assert_eq!(
                choose_weighted([("never", 0.0), ("always", 0.3)], &mut rng).unwrap(),
                "always"
            );
        }
    }

    #[test]
    fn test_invalid_inputs() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let empty: [(u8, f64); 0] = [];
        assert_eq!(choose_weighted(empty, &mut rng), Err(SelectError::Empty));
        assert!(matches!(
            choose_weighted([(1, 0.0), (2, 0.0)], &mut rng),
            Err(SelectError::InvalidWeights(_))
        ));
        assert!(matches!(
            choose_weighted([(1, -1.0), (2, 3.0)], &mut rng),
            Err(SelectError::InvalidWeights(_))
        ));
    }

    #[test]
    fn test_overflowing_total_is_rejected() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert_eq!(
            choose_weighted([(1, f64::MAX), (2, f64::MAX)], &mut rng),
            Err(SelectError::InvalidWeights(WeightedError::InvalidWeight))
        );
        assert!(matches!(
            choose_weighted([(1, f64::INFINITY), (2, 1.0)], &mut rng),
            Err(SelectError::InvalidWeights(_))
        ));
        assert!(matches!(
            choose_weighted([(1, f64::NAN)], &mut rng),
            Err(SelectError::InvalidWeights(_))
        ));
    }
}
