// ============================================
// Scoring Dispatcher (單線程調度佇列)
// ============================================
//
// One tokio task owns both registries. Every other task talks to it through
// an `EngineHandle`, which queues a command on a bounded mpsc channel and
// waits for the reply on a oneshot. Commands run strictly in arrival order,
// so a window update and its leaderboard reposition are never interleaved
// with another mutation.
//
// A leaderboard invariant violation stops the task; afterwards every
// handle call fails with `DispatchError::Closed`.

use crate::models::{EntityClass, InboundRequest, OutboundResponse};
use crate::services::leaderboard::LeaderboardEntry;
use crate::services::rating::RatingFunction;
use crate::services::registry::{EntityRegistry, RegistryError};
use crate::services::scoring::{Score, ScoreBounds};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Scoring engine is not running")]
    Closed,

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

pub type Result<T> = std::result::Result<T, DispatchError>;

/// Score plus leaderboard standing of one entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Standing {
    pub score: Score,
    pub rank: usize,
}

/// User and channel registries, scored with the same bounds and rating
/// function but separate windows and leaderboards.
pub struct ScoringEngine {
    users: EntityRegistry,
    channels: EntityRegistry,
}

impl ScoringEngine {
    pub fn new(
        bounds: ScoreBounds,
        rating: Arc<dyn RatingFunction>,
    ) -> std::result::Result<Self, RegistryError> {
        Ok(Self {
            users: EntityRegistry::new(EntityClass::User, bounds, rating.clone())?,
            channels: EntityRegistry::new(EntityClass::Channel, bounds, rating)?,
        })
    }

    pub fn registry(&self, class: EntityClass) -> &EntityRegistry {
        match class {
            EntityClass::User => &self.users,
            EntityClass::Channel => &self.channels,
        }
    }

    pub fn registry_mut(&mut self, class: EntityClass) -> &mut EntityRegistry {
        match class {
            EntityClass::User => &mut self.users,
            EntityClass::Channel => &mut self.channels,
        }
    }

    pub fn standing(&self, class: EntityClass, entity_id: &str) -> Option<Standing> {
        let registry = self.registry(class);
        let score = registry.query_score(entity_id)?;
        let rank = registry.query_rank(entity_id)?;
        Some(Standing { score, rank })
    }

    /// Run one command; returns false once the engine must stop.
    fn apply(&mut self, command: EngineCommand) -> bool {
        match command {
            EngineCommand::RecordEvent {
                class,
                entity_id,
                payload,
                reply,
            } => {
                let registry = self.registry_mut(class);
                // rank is read before the next command can move the board
                let result = registry
                    .record_event(&entity_id, &payload)
                    .map(|score| Standing {
                        score,
                        rank: registry.leaderboard().rank(score),
                    });
                Self::reply_mutation(reply, result)
            }
            EngineCommand::Seed {
                class,
                entity_id,
                display_name,
                ratings,
                reply,
            } => {
                let result = self
                    .registry_mut(class)
                    .seed(&entity_id, display_name, &ratings);
                Self::reply_mutation(reply, result)
            }
            EngineCommand::QueryStanding {
                class,
                entity_id,
                reply,
            } => {
                let _ = reply.send(self.standing(class, &entity_id));
                true
            }
            EngineCommand::QueryTop { class, k, reply } => {
                let _ = reply.send(self.registry(class).query_top(k));
                true
            }
            EngineCommand::QueryBottom { class, k, reply } => {
                let _ = reply.send(self.registry(class).query_bottom(k));
                true
            }
        }
    }

    fn reply_mutation<T>(
        reply: oneshot::Sender<std::result::Result<T, RegistryError>>,
        result: std::result::Result<T, RegistryError>,
    ) -> bool {
        let keep_running = match &result {
            Err(e) if e.is_fatal() => {
                error!(error = %e, "Scoring state is inconsistent, stopping engine");
                false
            }
            _ => true,
        };
        // Caller may have gone away; the mutation stands either way
        let _ = reply.send(result);
        keep_running
    }
}

enum EngineCommand {
    RecordEvent {
        class: EntityClass,
        entity_id: String,
        payload: String,
        reply: oneshot::Sender<std::result::Result<Standing, RegistryError>>,
    },
    Seed {
        class: EntityClass,
        entity_id: String,
        display_name: Option<String>,
        ratings: Vec<f64>,
        reply: oneshot::Sender<std::result::Result<Score, RegistryError>>,
    },
    QueryStanding {
        class: EntityClass,
        entity_id: String,
        reply: oneshot::Sender<Option<Standing>>,
    },
    QueryTop {
        class: EntityClass,
        k: usize,
        reply: oneshot::Sender<Vec<LeaderboardEntry>>,
    },
    QueryBottom {
        class: EntityClass,
        k: usize,
        reply: oneshot::Sender<Vec<LeaderboardEntry>>,
    },
}

/// Start the engine task. It runs until every handle is dropped or a fatal
/// error occurs, and hands the engine back when it finishes.
pub fn spawn_engine(
    engine: ScoringEngine,
    queue_capacity: usize,
) -> (EngineHandle, JoinHandle<ScoringEngine>) {
    let (tx, rx) = mpsc::channel(queue_capacity.max(1));
    let task = tokio::spawn(run_engine(engine, rx));
    (EngineHandle { tx }, task)
}

async fn run_engine(
    mut engine: ScoringEngine,
    mut rx: mpsc::Receiver<EngineCommand>,
) -> ScoringEngine {
    info!("Scoring engine started");

    while let Some(command) = rx.recv().await {
        if !engine.apply(command) {
            break;
        }
    }

    for class in EntityClass::ALL {
        engine.registry(class).log_summary();
    }
    info!("Scoring engine stopped");
    engine
}

#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<EngineCommand>,
}

impl EngineHandle {
    async fn send(&self, command: EngineCommand) -> Result<()> {
        self.tx
            .send(command)
            .await
            .map_err(|_| DispatchError::Closed)
    }

    async fn receive<T>(rx: oneshot::Receiver<T>) -> Result<T> {
        rx.await.map_err(|_| DispatchError::Closed)
    }

    /// Rate `payload` for the entity and return its new score
    pub async fn record_event(
        &self,
        class: EntityClass,
        entity_id: impl Into<String>,
        payload: impl Into<String>,
    ) -> Result<Score> {
        Ok(self
            .record_event_standing(class, entity_id, payload)
            .await?
            .score)
    }

    /// Like `record_event`, but also returns the rank the new score holds
    /// right after the update.
    pub async fn record_event_standing(
        &self,
        class: EntityClass,
        entity_id: impl Into<String>,
        payload: impl Into<String>,
    ) -> Result<Standing> {
        let (reply, rx) = oneshot::channel();
        self.send(EngineCommand::RecordEvent {
            class,
            entity_id: entity_id.into(),
            payload: payload.into(),
            reply,
        })
        .await?;
        Ok(Self::receive(rx).await??)
    }

    /// Bootstrap an entity from chronological historical ratings
    pub async fn seed(
        &self,
        class: EntityClass,
        entity_id: impl Into<String>,
        display_name: Option<String>,
        ratings: Vec<f64>,
    ) -> Result<Score> {
        let (reply, rx) = oneshot::channel();
        self.send(EngineCommand::Seed {
            class,
            entity_id: entity_id.into(),
            display_name,
            ratings,
            reply,
        })
        .await?;
        Ok(Self::receive(rx).await??)
    }

    pub async fn query_score(
        &self,
        class: EntityClass,
        entity_id: impl Into<String>,
    ) -> Result<Option<Score>> {
        Ok(self
            .query_standing(class, entity_id)
            .await?
            .map(|standing| standing.score))
    }

    pub async fn query_standing(
        &self,
        class: EntityClass,
        entity_id: impl Into<String>,
    ) -> Result<Option<Standing>> {
        let (reply, rx) = oneshot::channel();
        self.send(EngineCommand::QueryStanding {
            class,
            entity_id: entity_id.into(),
            reply,
        })
        .await?;
        Self::receive(rx).await
    }

    pub async fn query_top(&self, class: EntityClass, k: usize) -> Result<Vec<LeaderboardEntry>> {
        let (reply, rx) = oneshot::channel();
        self.send(EngineCommand::QueryTop { class, k, reply }).await?;
        Self::receive(rx).await
    }

    pub async fn query_bottom(
        &self,
        class: EntityClass,
        k: usize,
    ) -> Result<Vec<LeaderboardEntry>> {
        let (reply, rx) = oneshot::channel();
        self.send(EngineCommand::QueryBottom { class, k, reply }).await?;
        Self::receive(rx).await
    }

    /// Serve one request line from the service surface
    pub async fn handle_request(&self, request: InboundRequest) -> OutboundResponse {
        let result = match request {
            InboundRequest::Message {
                class,
                entity,
                text,
            } => self
                .record_event_standing(class, entity.clone(), text)
                .await
                .map(|standing| OutboundResponse::Scored {
                    class,
                    entity,
                    score: standing.score,
                    rank: Some(standing.rank),
                }),
            InboundRequest::Score { class, entity } => self.standing_response(class, entity).await,
            InboundRequest::Top { class, k } => self
                .query_top(class, k)
                .await
                .map(|entries| OutboundResponse::Ranking { class, entries }),
            InboundRequest::Bottom { class, k } => self
                .query_bottom(class, k)
                .await
                .map(|entries| OutboundResponse::Ranking { class, entries }),
        };

        result.unwrap_or_else(|e| {
            debug!(error = %e, "Request failed");
            OutboundResponse::error(e.to_string())
        })
    }

    async fn standing_response(
        &self,
        class: EntityClass,
        entity: String,
    ) -> Result<OutboundResponse> {
        Ok(match self.query_standing(class, entity.clone()).await? {
            Some(standing) => OutboundResponse::Scored {
                class,
                entity,
                score: standing.score,
                rank: Some(standing.rank),
            },
            None => OutboundResponse::NotFound { class, entity },
        })
    }
}
