pub mod config;
pub mod jobs;
pub mod models;
pub mod server;
pub mod services;
pub mod utils;

pub use config::Config;
pub use services::{
    spawn_engine, EngineHandle, EntityRegistry, Leaderboard, LexiconAnalyzer, RatingFunction,
    ScoringEngine,
};
