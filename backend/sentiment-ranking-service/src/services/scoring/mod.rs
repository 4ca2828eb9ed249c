// ============================================
// Windowed Score Aggregator (滑動窗口評分)
// ============================================
//
// Turns the last N ratings of an entity into one integer score:
//
//   score = floor(base + Σ weight[i] * rating[i])     i = 0 is newest
//   score = max(floor, score), min(ceiling, score) if a ceiling is set
//
// A window shorter than its capacity is not renormalised: fewer ratings
// simply contribute less, so new entities start near `base`.

pub mod weights;
pub mod window;

pub use weights::WeightVector;
pub use window::RatingWindow;

use crate::models::EntityClass;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Aggregated entity score; what leaderboards rank by
pub type Score = i64;

#[derive(Debug, Error, PartialEq)]
pub enum ScoringError {
    #[error("Invalid weight vector: {0}")]
    InvalidWeights(String),

    #[error("Invalid score bounds: {0}")]
    InvalidBounds(String),

    #[error("Window capacity must be positive")]
    ZeroCapacity,

    #[error("No weight vector for window capacity {0}")]
    UnknownCapacity(usize),
}

pub type Result<T> = std::result::Result<T, ScoringError>;

/// Offset and clamps applied around the weighted sum
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBounds {
    pub base: f64,
    pub floor: Score,
    /// Upper clamp; `None` leaves the top open
    pub ceiling: Option<Score>,
}

impl Default for ScoreBounds {
    fn default() -> Self {
        Self {
            base: 70.0,
            floor: 0,
            ceiling: None,
        }
    }
}

impl ScoreBounds {
    pub fn validate(&self) -> Result<()> {
        if !self.base.is_finite() {
            return Err(ScoringError::InvalidBounds(format!(
                "base must be finite, got {}",
                self.base
            )));
        }
        if let Some(ceiling) = self.ceiling {
            if ceiling < self.floor {
                return Err(ScoringError::InvalidBounds(format!(
                    "ceiling {} is below floor {}",
                    ceiling, self.floor
                )));
            }
        }
        Ok(())
    }

    fn clamp(&self, raw: f64) -> Score {
        // `as` saturates and maps NaN to 0, so every input yields a score
        let mut score = (self.base + raw).floor() as Score;
        score = score.max(self.floor);
        if let Some(ceiling) = self.ceiling {
            score = score.min(ceiling);
        }
        score
    }
}

/// Weighted score over `ratings` (newest first). Positions beyond the
/// weight vector are ignored.
pub fn compute_score<I>(ratings: I, weights: &WeightVector, bounds: &ScoreBounds) -> Score
where
    I: IntoIterator<Item = f64>,
{
    let weighted: f64 = ratings
        .into_iter()
        .zip(weights.as_slice())
        .map(|(rating, weight)| weight * rating)
        .sum();

    bounds.clamp(weighted)
}

/// Same as [`compute_score`], selecting the built-in weights whose length
/// equals `capacity`.
pub fn compute_score_for_capacity(
    ratings: &[f64],
    capacity: usize,
    bounds: &ScoreBounds,
) -> Result<Score> {
    let weights =
        WeightVector::for_capacity(capacity).ok_or(ScoringError::UnknownCapacity(capacity))?;
    Ok(compute_score(ratings.iter().copied(), weights, bounds))
}

/// Scoring parameters for one entity class.
#[derive(Debug, Clone)]
pub struct WindowScorer {
    weights: WeightVector,
    bounds: ScoreBounds,
}

impl WindowScorer {
    pub fn new(weights: WeightVector, bounds: ScoreBounds) -> Result<Self> {
        bounds.validate()?;
        Ok(Self { weights, bounds })
    }

    pub fn for_class(class: EntityClass, bounds: ScoreBounds) -> Result<Self> {
        Self::new(WeightVector::for_class(class).clone(), bounds)
    }

    pub fn capacity(&self) -> usize {
        self.weights.len()
    }

    pub fn bounds(&self) -> &ScoreBounds {
        &self.bounds
    }

    /// Empty window sized for this scorer
    pub fn new_window(&self) -> RatingWindow {
        // weights are never empty, so capacity is positive
        RatingWindow::new(self.capacity())
            .unwrap_or_else(|_| unreachable!("weight vectors are non-empty"))
    }

    /// Window pre-filled from chronological history
    pub fn window_from_history(&self, chronological: &[f64]) -> RatingWindow {
        RatingWindow::with_history(self.capacity(), chronological.iter().copied())
            .unwrap_or_else(|_| unreachable!("weight vectors are non-empty"))
    }

    pub fn score(&self, window: &RatingWindow) -> Score {
        debug_assert_eq!(window.capacity(), self.capacity());
        compute_score(window.iter(), &self.weights, &self.bounds)
    }

    /// Fold `rating` into `window` and return the new score
    pub fn ingest(&self, window: &mut RatingWindow, rating: f64) -> Score {
        window.push(rating);
        self.score(window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_scorer() -> WindowScorer {
        WindowScorer::for_class(EntityClass::User, ScoreBounds::default()).unwrap()
    }

    #[test]
    fn test_full_window_of_ones_scores_105() {
        let scorer = user_scorer();
        let mut window = scorer.new_window();
        let mut score = 0;
        for _ in 0..10 {
            score = scorer.ingest(&mut window, 1.0);
        }

        assert_eq!(score, 105);
    }

    #[test]
    fn test_empty_window_is_neutral() {
        let scorer = user_scorer();
        assert_eq!(scorer.score(&scorer.new_window()), 70);
    }

    #[test]
    fn test_partial_window_uses_available_positions() {
        let scorer = user_scorer();
        let mut window = scorer.new_window();
        scorer.ingest(&mut window, 2.0);
        let score = scorer.ingest(&mut window, 1.0);

        // newest 1.0 * 5 + older 2.0 * 5
        assert_eq!(score, 85);
    }

    #[test]
    fn test_floor_is_applied_not_rounding() {
        let score = compute_score(
            vec![0.39],
            WeightVector::for_class(EntityClass::User),
            &ScoreBounds::default(),
        );
        // 70 + 1.95
        assert_eq!(score, 71);

        let negative = compute_score(
            vec![-0.1],
            WeightVector::for_class(EntityClass::User),
            &ScoreBounds::default(),
        );
        // 70 - 0.5 floors to 69
        assert_eq!(negative, 69);
    }

    #[test]
    fn test_low_side_clamped_to_zero() {
        let ratings = vec![-5.0; 10];
        let score = compute_score_for_capacity(&ratings, 10, &ScoreBounds::default()).unwrap();
        assert_eq!(score, 0);
    }

    #[test]
    fn test_high_side_open_unless_configured() {
        let ratings = vec![5.0; 10];
        let open = compute_score_for_capacity(&ratings, 10, &ScoreBounds::default()).unwrap();
        assert_eq!(open, 245);

        let capped = ScoreBounds {
            ceiling: Some(100),
            ..ScoreBounds::default()
        };
        assert_eq!(compute_score_for_capacity(&ratings, 10, &capped).unwrap(), 100);
    }

    #[test]
    fn test_unknown_capacity() {
        let err = compute_score_for_capacity(&[1.0], 11, &ScoreBounds::default()).unwrap_err();
        assert_eq!(err, ScoringError::UnknownCapacity(11));
    }

    #[test]
    fn test_eviction_changes_score() {
        let scorer = user_scorer();
        let mut window = scorer.new_window();
        scorer.ingest(&mut window, -4.0);
        for _ in 0..9 {
            scorer.ingest(&mut window, 0.0);
        }
        // oldest slot weight 2 * -4
        assert_eq!(scorer.score(&window), 62);

        let score = scorer.ingest(&mut window, 0.0);
        assert_eq!(window.len(), 10);
        assert_eq!(score, 70);
    }

    #[test]
    fn test_channel_class_uses_longer_window() {
        let scorer = WindowScorer::for_class(EntityClass::Channel, ScoreBounds::default()).unwrap();
        let window = scorer.window_from_history(&[1.0; 25]);

        assert_eq!(window.len(), 20);
        assert_eq!(scorer.score(&window), 105);
    }

    #[test]
    fn test_history_keeps_most_recent_newest_first() {
        let scorer = user_scorer();
        let history: Vec<f64> = (1..=12).map(f64::from).collect();
        let window = scorer.window_from_history(&history);

        let expected: Vec<f64> = (3..=12).rev().map(f64::from).collect();
        assert_eq!(window.to_vec(), expected);
        assert_eq!(window.capacity(), 10);
    }

    #[test]
    fn test_non_finite_input_is_total() {
        let scorer = user_scorer();
        let mut window = scorer.new_window();

        assert_eq!(scorer.ingest(&mut window, f64::NAN), 0);
        let mut other = scorer.new_window();
        assert_eq!(scorer.ingest(&mut other, f64::NEG_INFINITY), 0);
    }

    #[test]
    fn test_score_is_deterministic() {
        let ratings = [0.3, -1.2, 2.5, 0.0, 0.7];
        let a = compute_score_for_capacity(&ratings, 10, &ScoreBounds::default()).unwrap();
        let b = compute_score_for_capacity(&ratings, 10, &ScoreBounds::default()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_bounds_validation() {
        let bounds = ScoreBounds {
            floor: 10,
            ceiling: Some(5),
            ..ScoreBounds::default()
        };
        assert!(matches!(
            WindowScorer::for_class(EntityClass::User, bounds),
            Err(ScoringError::InvalidBounds(_))
        ));
    }
}
