// ============================================
// Rating Functions (情緒評分)
// ============================================
//
// A rating function turns one raw event payload (message text) into a real
// number. Scoring only ever sees that number; how it is produced is up to
// the implementation plugged into the registry.

pub mod lexicon;

pub use lexicon::LexiconAnalyzer;

/// Converts a raw event payload into a numeric rating.
///
/// Implementations must be pure and fast: they run on the dispatch task
/// between two leaderboard updates.
#[cfg_attr(test, mockall::automock)]
pub trait RatingFunction: Send + Sync {
    fn rate(&self, payload: &str) -> f64;

    /// Name for logging
    fn name(&self) -> &str;
}

/// Fixed rating regardless of payload; useful for replaying pre-rated data.
#[derive(Debug, Clone, Copy)]
pub struct ConstantRating(pub f64);

impl RatingFunction for ConstantRating {
    fn rate(&self, _payload: &str) -> f64 {
        self.0
    }

    fn name(&self) -> &str {
        "constant"
    }
}
