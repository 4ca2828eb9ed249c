use crate::services::scoring::{Score, ScoreBounds};
use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read environment: {0}")]
    Env(#[from] envy::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub scoring: ScoringConfig,
    pub bootstrap: BootstrapConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// SERVICE_NAME, LOG_FORMAT, DISPATCH_QUEUE_CAPACITY
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "default_service_name")]
    pub service_name: String,
    #[serde(default)]
    pub log_format: LogFormat,
    #[serde(default = "default_dispatch_queue_capacity")]
    pub dispatch_queue_capacity: usize,
}

/// SCORING_BASE, SCORING_FLOOR, SCORING_CEILING
#[derive(Debug, Clone, Deserialize)]
pub struct ScoringConfig {
    #[serde(default = "default_base")]
    pub base: f64,
    #[serde(default)]
    pub floor: Score,
    /// Unset means scores are not capped from above
    #[serde(default)]
    pub ceiling: Option<Score>,
}

/// BOOTSTRAP_SEED_FILE
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BootstrapConfig {
    #[serde(default)]
    pub seed_file: Option<PathBuf>,
}

fn default_service_name() -> String {
    "sentiment-ranking-service".to_string()
}

fn default_dispatch_queue_capacity() -> usize {
    1024
}

fn default_base() -> f64 {
    ScoreBounds::default().base
}

impl ScoringConfig {
    pub fn bounds(&self) -> ScoreBounds {
        ScoreBounds {
            base: self.base,
            floor: self.floor,
            ceiling: self.ceiling,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_vars(std::env::vars())
    }

    /// Build from an explicit set of `(KEY, value)` pairs
    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let vars: Vec<(String, String)> = vars.into_iter().collect();

        let config = Config {
            service: envy::from_iter(vars.clone())?,
            scoring: envy::prefixed("SCORING_").from_iter(vars.clone())?,
            bootstrap: envy::prefixed("BOOTSTRAP_").from_iter(vars)?,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.service.dispatch_queue_capacity == 0 {
            return Err(ConfigError::Invalid(
                "DISPATCH_QUEUE_CAPACITY must be positive".to_string(),
            ));
        }

        self.scoring
            .bounds()
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }
}
