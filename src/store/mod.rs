//! Game State Store - durable per-game fields.
//!
//! Each game owns three independent entries: the ordered move log, the
//! transient selected square and the last opponent error. The store keeps
//! raw strings; turning them back into a position is the job of
//! [`crate::models::replay`]. No position is ever persisted.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StoreError;

/// Opaque game identifier, generated once at creation
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameId(String);

impl GameId {
    /// Allocate a fresh, collision-free id
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for GameId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for GameId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ordered UCI moves played since the starting position
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MoveLog(Vec<String>);

impl MoveLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of this log with one more move appended
    pub fn with_move(&self, uci: impl Into<String>) -> Self {
        let mut moves = self.0.clone();
        moves.push(uci.into());
        Self(moves)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn last(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl From<Vec<String>> for MoveLog {
    fn from(moves: Vec<String>) -> Self {
        Self(moves)
    }
}

impl<'a> FromIterator<&'a str> for MoveLog {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        Self(iter.into_iter().map(str::to_string).collect())
    }
}

/// The raw fields stored for one game
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StoredGame {
    pub moves: MoveLog,
    /// Square the human picked as a move source, if any
    pub selection: Option<String>,
    /// Name of the last opponent error kind, if any
    pub error: Option<String>,
}

/// Key of the move-log entry
pub fn moves_key(id: &GameId) -> String {
    format!("chess::{}::moves", id)
}

/// Key of the transient-selection entry
pub fn selection_key(id: &GameId) -> String {
    format!("chess::{}::current", id)
}

/// Key of the last-error entry
pub fn error_key(id: &GameId) -> String {
    format!("chess::{}::error", id)
}

/// Durable storage for games.
///
/// `put` overwrites all three fields. Backends may write them separately;
/// callers only ever write values they computed from one loaded snapshot,
/// and only one writer touches a given id at a time.
#[async_trait]
pub trait GameStore: Send + Sync {
    /// Allocate a new id and persist an empty game under it
    async fn create(&self) -> Result<GameId, StoreError>;

    /// Current fields of a game, or `None` if the id is unknown
    async fn get(&self, id: &GameId) -> Result<Option<StoredGame>, StoreError>;

    /// Overwrite the fields of a game
    async fn put(&self, id: &GameId, game: &StoredGame) -> Result<(), StoreError>;
}
