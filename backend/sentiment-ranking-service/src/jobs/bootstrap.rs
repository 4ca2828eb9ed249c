// ============================================
// Bootstrap Job (啟動時載入歷史評分)
// ============================================
//
// Runs once at startup, before the service reads any live events.
//
// Workflow:
// 1. Read the seed file (JSON, see `models::SeedFile`)
// 2. For each user and channel, seed its window from historical ratings
// 3. Report how many entities were placed on each leaderboard
//
// Usage:
//   BOOTSTRAP_SEED_FILE=/data/seed.json sentiment-ranking-service

use crate::models::{EntityClass, SeedFile};
use crate::services::dispatch::{DispatchError, EngineHandle};
use crate::services::registry::RegistryError;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("Failed to read seed file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid seed file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Scoring engine rejected seed: {0}")]
    Dispatch(#[from] DispatchError),
}

/// Bootstrap job statistics
#[derive(Debug, Clone, Default)]
pub struct BootstrapStats {
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub users_seeded: u32,
    pub channels_seeded: u32,
    pub skipped: u32,
    pub total_duration_ms: u64,
}

impl BootstrapStats {
    fn record_seeded(&mut self, class: EntityClass) {
        match class {
            EntityClass::User => self.users_seeded += 1,
            EntityClass::Channel => self.channels_seeded += 1,
        }
    }
}

pub struct BootstrapJob {
    path: PathBuf,
}

impl BootstrapJob {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn load(&self) -> Result<SeedFile, BootstrapError> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| BootstrapError::Io {
                path: self.path.clone(),
                source,
            })?;

        serde_json::from_str(&raw).map_err(|source| BootstrapError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    /// Load the seed file and feed every entity to the engine
    pub async fn run(&self, handle: &EngineHandle) -> Result<BootstrapStats, BootstrapError> {
        let start_time = Instant::now();
        let mut stats = BootstrapStats {
            started_at: Some(Utc::now()),
            ..Default::default()
        };

        info!(path = %self.path.display(), "Loading bootstrap seed file");
        let seed = self.load().await?;

        for class in EntityClass::ALL {
            for entity in seed.entities(class) {
                let result = handle
                    .seed(
                        class,
                        entity.id.clone(),
                        entity.name.clone(),
                        entity.ratings.clone(),
                    )
                    .await;

                match result {
                    Ok(_) => stats.record_seeded(class),
                    Err(DispatchError::Registry(RegistryError::AlreadySeeded(id))) => {
                        warn!(class = %class, entity_id = %id, "Duplicate seed entry skipped");
                        stats.skipped += 1;
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        }

        stats.completed_at = Some(Utc::now());
        stats.total_duration_ms = start_time.elapsed().as_millis() as u64;

        info!(
            users = stats.users_seeded,
            channels = stats.channels_seeded,
            skipped = stats.skipped,
            duration_ms = stats.total_duration_ms,
            "Bootstrap completed"
        );

        Ok(stats)
    }
}
