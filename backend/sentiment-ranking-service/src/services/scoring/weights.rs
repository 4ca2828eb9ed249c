// ============================================
// Window Weights
// ============================================
//
// Position 0 is the newest rating. Weights fall off in plateaus so recent
// messages dominate, but a burst of new messages cannot erase older
// behaviour in one step.
//
//   user    (10): 5 5 5 | 4 4 | 3 3 | 2 2 2
//   channel (20): 2.5 x5 | 2.0 x5 | 1.5 x5 | 1.0 x5
//
// Both vectors sum to 35, so a window full of identical ratings moves a
// user and a channel by the same amount.

use super::{Result, ScoringError};
use crate::models::EntityClass;
use once_cell::sync::Lazy;

static USER_WEIGHTS: Lazy<WeightVector> = Lazy::new(|| {
    WeightVector::from_tiers(&[(5.0, 3), (4.0, 2), (3.0, 2), (2.0, 3)])
        .unwrap_or_else(|e| unreachable!("built-in user weights are valid: {e}"))
});

static CHANNEL_WEIGHTS: Lazy<WeightVector> = Lazy::new(|| {
    WeightVector::from_tiers(&[(2.5, 5), (2.0, 5), (1.5, 5), (1.0, 5)])
        .unwrap_or_else(|e| unreachable!("built-in channel weights are valid: {e}"))
});

/// Static, strictly positive, non-increasing weights; one per window slot.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightVector {
    weights: Vec<f64>,
}

impl WeightVector {
    pub fn new(weights: Vec<f64>) -> Result<Self> {
        if weights.is_empty() {
            return Err(ScoringError::InvalidWeights(
                "weight vector must not be empty".to_string(),
            ));
        }

        if let Some(bad) = weights.iter().find(|w| !w.is_finite() || **w <= 0.0) {
            return Err(ScoringError::InvalidWeights(format!(
                "weights must be finite and positive, got {}",
                bad
            )));
        }

        if let Some(pos) = weights.windows(2).position(|pair| pair[1] > pair[0]) {
            return Err(ScoringError::InvalidWeights(format!(
                "weights must be non-increasing, position {} ({}) exceeds position {} ({})",
                pos + 1,
                weights[pos + 1],
                pos,
                weights[pos]
            )));
        }

        Ok(Self { weights })
    }

    /// Build from `(weight, repeat)` plateaus, heaviest first
    pub fn from_tiers(tiers: &[(f64, usize)]) -> Result<Self> {
        let weights = tiers
            .iter()
            .flat_map(|&(weight, count)| std::iter::repeat(weight).take(count))
            .collect();
        Self::new(weights)
    }

    pub fn for_class(class: EntityClass) -> &'static WeightVector {
        match class {
            EntityClass::User => &*USER_WEIGHTS,
            EntityClass::Channel => &*CHANNEL_WEIGHTS,
        }
    }

    /// Look up the built-in vector whose length equals `capacity`
    pub fn for_capacity(capacity: usize) -> Option<&'static WeightVector> {
        EntityClass::from_capacity(capacity).map(Self::for_class)
    }

    /// Window capacity this vector covers
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.weights
    }

    pub fn total(&self) -> f64 {
        self.weights.iter().sum()
    }
}
