// ============================================
// Entity Registry
// ============================================
//
// Owns, for one entity class, every entity's rating window plus the class
// leaderboard. Each event goes: payload → rating → window → score →
// leaderboard reposition, as one step with no suspension point.
//
// The registry is not internally synchronised; the dispatcher holds it
// exclusively and feeds it one command at a time.

use crate::models::EntityClass;
use crate::services::leaderboard::{Leaderboard, LeaderboardEntry, LeaderboardError};
use crate::services::rating::RatingFunction;
use crate::services::scoring::{RatingWindow, Score, ScoreBounds, ScoringError, WindowScorer};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Entity already seeded: {0}")]
    AlreadySeeded(String),

    /// Leaderboard and registry disagree about an entity's score. Fatal.
    #[error("Leaderboard invariant violated: {0}")]
    Leaderboard(#[from] LeaderboardError),

    #[error("Scoring configuration error: {0}")]
    Scoring(#[from] ScoringError),
}

impl RegistryError {
    /// Whether the registry can keep serving after this error
    pub fn is_fatal(&self) -> bool {
        matches!(self, RegistryError::Leaderboard(_))
    }
}

pub type Result<T> = std::result::Result<T, RegistryError>;

#[derive(Debug, Clone, Serialize)]
pub struct EntityMetadata {
    pub display_name: Option<String>,
    pub first_seen: DateTime<Utc>,
    pub last_activity: Option<DateTime<Utc>>,
    /// Events recorded since startup (seeded history not included)
    pub event_count: u64,
}

impl EntityMetadata {
    fn new(display_name: Option<String>) -> Self {
        Self {
            display_name,
            first_seen: Utc::now(),
            last_activity: None,
            event_count: 0,
        }
    }
}

#[derive(Debug)]
struct EntityState {
    metadata: EntityMetadata,
    window: RatingWindow,
    score: Score,
}

pub struct EntityRegistry {
    class: EntityClass,
    scorer: WindowScorer,
    rating: Arc<dyn RatingFunction>,
    entities: HashMap<String, EntityState>,
    leaderboard: Leaderboard,
}

impl EntityRegistry {
    pub fn new(
        class: EntityClass,
        bounds: ScoreBounds,
        rating: Arc<dyn RatingFunction>,
    ) -> Result<Self> {
        let scorer = WindowScorer::for_class(class, bounds)?;

        Ok(Self {
            class,
            scorer,
            rating,
            entities: HashMap::new(),
            leaderboard: Leaderboard::new(),
        })
    }

    pub fn class(&self) -> EntityClass {
        self.class
    }

    /// Rate `payload` and fold it into the entity's window. Unknown entities
    /// are registered on their first event.
    pub fn record_event(&mut self, entity_id: &str, payload: &str) -> Result<Score> {
        let rating = self.rating.rate(payload);
        self.record_rating(entity_id, rating)
    }

    /// Fold an already computed rating into the entity's window
    pub fn record_rating(&mut self, entity_id: &str, rating: f64) -> Result<Score> {
        let rating = if rating.is_finite() {
            rating
        } else {
            warn!(
                class = %self.class,
                entity_id,
                rating,
                "Non-finite rating replaced with neutral 0.0"
            );
            0.0
        };

        let (mut window, previous) = match self.entities.get(entity_id) {
            Some(state) => (state.window.clone(), Some(state.score)),
            None => (self.scorer.new_window(), None),
        };
        let score = self.scorer.ingest(&mut window, rating);

        // Board first: a failure here must leave the registry unchanged
        self.leaderboard.update(entity_id, score, previous)?;

        let state = match self.entities.entry(entity_id.to_string()) {
            Entry::Occupied(entry) => {
                let state = entry.into_mut();
                state.window = window;
                state.score = score;
                state
            }
            Entry::Vacant(entry) => entry.insert(EntityState {
                metadata: EntityMetadata::new(None),
                window,
                score,
            }),
        };
        state.metadata.last_activity = Some(Utc::now());
        state.metadata.event_count += 1;

        debug!(
            class = %self.class,
            entity_id,
            rating,
            previous = ?previous,
            score,
            "Event recorded"
        );

        Ok(score)
    }

    /// Pre-populate an entity from chronological history and place it on the
    /// leaderboard. Intended to run once per entity at startup.
    pub fn seed(
        &mut self,
        entity_id: &str,
        display_name: Option<String>,
        historical: &[f64],
    ) -> Result<Score> {
        if self.entities.contains_key(entity_id) {
            return Err(RegistryError::AlreadySeeded(entity_id.to_string()));
        }

        let (sanitized, replaced) = sanitize_history(historical);
        if replaced > 0 {
            warn!(
                class = %self.class,
                entity_id,
                replaced,
                "Non-finite historical ratings replaced with neutral 0.0"
            );
        }
        let window = self.scorer.window_from_history(&sanitized);
        let score = self.scorer.score(&window);

        self.leaderboard.update(entity_id, score, None)?;
        self.entities.insert(
            entity_id.to_string(),
            EntityState {
                metadata: EntityMetadata::new(display_name),
                window,
                score,
            },
        );

        debug!(
            class = %self.class,
            entity_id,
            history = historical.len(),
            score,
            "Entity seeded"
        );

        Ok(score)
    }

    pub fn query_score(&self, entity_id: &str) -> Option<Score> {
        self.entities.get(entity_id).map(|state| state.score)
    }

    /// 1-based leaderboard standing, ties sharing a rank
    pub fn query_rank(&self, entity_id: &str) -> Option<usize> {
        self.query_score(entity_id).map(|score| self.leaderboard.rank(score))
    }

    pub fn query_top(&self, k: usize) -> Vec<LeaderboardEntry> {
        self.leaderboard.get_highest(k)
    }

    pub fn query_bottom(&self, k: usize) -> Vec<LeaderboardEntry> {
        self.leaderboard.get_lowest(k)
    }

    pub fn metadata(&self, entity_id: &str) -> Option<&EntityMetadata> {
        self.entities.get(entity_id).map(|state| &state.metadata)
    }

    pub fn window(&self, entity_id: &str) -> Option<&RatingWindow> {
        self.entities.get(entity_id).map(|state| &state.window)
    }

    pub fn leaderboard(&self) -> &Leaderboard {
        &self.leaderboard
    }

    #[cfg(test)]
    pub(crate) fn leaderboard_mut(&mut self) -> &mut Leaderboard {
        &mut self.leaderboard
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn log_summary(&self) {
        info!(
            class = %self.class,
            entities = self.entities.len(),
            capacity = self.scorer.capacity(),
            top = ?self.leaderboard.get_highest(1).first(),
            "Registry summary"
        );
    }
}

/// Neutralise non-finite ratings; returns the cleaned history and how many
/// entries were replaced.
fn sanitize_history(historical: &[f64]) -> (Vec<f64>, usize) {
    let mut replaced = 0;
    let sanitized: Vec<f64> = historical
        .iter()
        .map(|&r| {
            if r.is_finite() {
                r
            } else {
                replaced += 1;
                0.0
            }
        })
        .collect();
    (sanitized, replaced)
}
