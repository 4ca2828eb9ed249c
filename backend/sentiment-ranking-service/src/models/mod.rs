use crate::services::{leaderboard::LeaderboardEntry, scoring::Score};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of scored entity. Each class has its own window capacity and its
/// own leaderboard; the two classes never share a capacity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EntityClass {
    User,    // individual chat members
    Channel, // rooms, scored over a longer window
}

impl EntityClass {
    pub const ALL: [EntityClass; 2] = [EntityClass::User, EntityClass::Channel];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityClass::User => "user",
            EntityClass::Channel => "channel",
        }
    }

    /// Number of ratings retained per entity of this class
    pub fn capacity(&self) -> usize {
        match self {
            EntityClass::User => 10,
            EntityClass::Channel => 20,
        }
    }

    pub fn from_capacity(capacity: usize) -> Option<Self> {
        Self::ALL.into_iter().find(|class| class.capacity() == capacity)
    }
}

impl fmt::Display for EntityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One line of input read by the service binary.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InboundRequest {
    /// A chat message from `entity`; the text is rated and folded into its window
    Message {
        class: EntityClass,
        entity: String,
        text: String,
    },
    Score {
        class: EntityClass,
        entity: String,
    },
    Top {
        class: EntityClass,
        k: usize,
    },
    Bottom {
        class: EntityClass,
        k: usize,
    },
}

/// One line of output written by the service binary.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OutboundResponse {
    Scored {
        class: EntityClass,
        entity: String,
        score: Score,
        rank: Option<usize>,
    },
    NotFound {
        class: EntityClass,
        entity: String,
    },
    Ranking {
        class: EntityClass,
        entries: Vec<LeaderboardEntry>,
    },
    Error {
        message: String,
    },
}

impl OutboundResponse {
    pub fn error(message: impl Into<String>) -> Self {
        OutboundResponse::Error {
            message: message.into(),
        }
    }
}

/// Bootstrap file consumed once at startup.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeedFile {
    #[serde(default)]
    pub users: Vec<SeedEntity>,
    #[serde(default)]
    pub channels: Vec<SeedEntity>,
}

impl SeedFile {
    pub fn entities(&self, class: EntityClass) -> &[SeedEntity] {
        match class {
            EntityClass::User => &self.users,
            EntityClass::Channel => &self.channels,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedEntity {
    pub id: String,
    pub name: Option<String>,
    /// Historical ratings, oldest first
    #[serde(default)]
    pub ratings: Vec<f64>,
}
