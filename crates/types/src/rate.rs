//! Transition rates.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use thiserror::Error;

/// Errors raised when a value cannot be used as a transition rate.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum RateError {
    /// Rates must be strictly positive.
    #[error("rate must be strictly positive, got {0}")]
    NotPositive(f64),

    /// Rates must be finite numbers.
    #[error("rate must be finite, got {0}")]
    NotFinite(f64),
}

/// A strictly positive, finite firing rate.
///
/// Equality and hashing use the bit pattern of the value, which is sound
/// because NaN is rejected at construction. This lets a resolved rate key
/// the scheduler's rate groups.
#[derive(Clone, Copy, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Rate(f64);

impl Rate {
    /// Validate and wrap a rate value.
    pub fn new(value: f64) -> Result<Self, RateError> {
        if !value.is_finite() {
            return Err(RateError::NotFinite(value));
        }
        if value <= 0.0 {
            return Err(RateError::NotPositive(value));
        }
        Ok(Rate(value))
    }

    /// Get the raw value.
    pub fn get(self) -> f64 {
        self.0
    }
}

impl PartialEq for Rate {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for Rate {}

impl Hash for Rate {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl TryFrom<f64> for Rate {
    type Error = RateError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Rate::new(value)
    }
}

impl From<Rate> for f64 {
    fn from(rate: Rate) -> Self {
        rate.0
    }
}

impl fmt::Debug for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Rate({})", self.0)
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Rate of an edge rule: either fixed, or a function of the edge weight.
#[derive(Clone)]
pub enum EdgeRate {
    /// The same rate on every edge.
    Constant(f64),

    /// Rate computed from the weight of the edge the event fires across.
    OfWeight(Arc<dyn Fn(f64) -> f64 + Send + Sync>),
}

impl EdgeRate {
    /// Wrap a weight-dependent rate function.
    pub fn of_weight(f: impl Fn(f64) -> f64 + Send + Sync + 'static) -> Self {
        EdgeRate::OfWeight(Arc::new(f))
    }

    /// Whether resolving this rate needs the edge weight.
    pub fn needs_weight(&self) -> bool {
        matches!(self, EdgeRate::OfWeight(_))
    }

    /// Resolve to a concrete rate. `weight` is only consulted for
    /// [`EdgeRate::OfWeight`].
    pub fn resolve(&self, weight: f64) -> Result<Rate, RateError> {
        match self {
            EdgeRate::Constant(value) => Rate::new(*value),
            EdgeRate::OfWeight(f) => Rate::new(f(weight)),
        }
    }
}

impl From<f64> for EdgeRate {
    fn from(value: f64) -> Self {
        EdgeRate::Constant(value)
    }
}

impl fmt::Debug for EdgeRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdgeRate::Constant(value) => f.debug_tuple("Constant").field(value).finish(),
            EdgeRate::OfWeight(_) => f.write_str("OfWeight(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_rate_validation() {
        assert!(Rate::new(0.5).is_ok());
        assert_eq!(Rate::new(0.0), Err(RateError::NotPositive(0.0)));
        assert_eq!(Rate::new(-1.0), Err(RateError::NotPositive(-1.0)));
        assert!(matches!(Rate::new(f64::NAN), Err(RateError::NotFinite(_))));
        assert!(matches!(
            Rate::new(f64::INFINITY),
            Err(RateError::NotFinite(_))
        ));
    }

    #[test]
    fn test_rate_hashes_by_value() {
        let mut set = HashSet::new();
        set.insert(Rate::new(1.0).unwrap());
        set.insert(Rate::new(1.0).unwrap());
        set.insert(Rate::new(2.0).unwrap());
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_edge_rate_resolution() {
        let constant = EdgeRate::from(1.5);
        assert!(!constant.needs_weight());
        assert_eq!(constant.resolve(99.0).unwrap().get(), 1.5);

        let scaled = EdgeRate::of_weight(|w| 2.0 * w);
        assert!(scaled.needs_weight());
        assert_eq!(scaled.resolve(3.0).unwrap().get(), 6.0);
        assert_eq!(scaled.resolve(0.0), Err(RateError::NotPositive(0.0)));
    }
}
