pub mod dispatch;
pub mod leaderboard;
pub mod rating;
pub mod registry;
pub mod scoring;

pub use dispatch::{spawn_engine, EngineHandle, ScoringEngine};
pub use leaderboard::Leaderboard;
pub use rating::{LexiconAnalyzer, RatingFunction};
pub use registry::EntityRegistry;
