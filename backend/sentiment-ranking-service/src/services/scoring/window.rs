use super::{Result, ScoringError};
use std::collections::VecDeque;

/// Bounded history of ratings for one entity, newest first.
#[derive(Debug, Clone, PartialEq)]
pub struct RatingWindow {
    capacity: usize,
    ratings: VecDeque<f64>,
}

impl RatingWindow {
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(ScoringError::ZeroCapacity);
        }

        Ok(Self {
            capacity,
            ratings: VecDeque::with_capacity(capacity),
        })
    }

    /// Pre-populate from historical ratings given oldest first. Only the
    /// most recent `capacity` ratings are retained.
    pub fn with_history<I>(capacity: usize, chronological: I) -> Result<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        let mut window = Self::new(capacity)?;
        for rating in chronological {
            window.push(rating);
        }
        Ok(window)
    }

    /// Put `rating` at the front; returns the evicted oldest rating when the
    /// window was already full.
    pub fn push(&mut self, rating: f64) -> Option<f64> {
        self.ratings.push_front(rating);
        if self.ratings.len() > self.capacity {
            self.ratings.pop_back()
        } else {
            None
        }
    }

    /// Ratings in newest-first order
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.ratings.iter().copied()
    }

    pub fn newest(&self) -> Option<f64> {
        self.ratings.front().copied()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.ratings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ratings.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.ratings.len() == self.capacity
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.iter().collect()
    }
}
