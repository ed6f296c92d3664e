//! In-process key-value store.
//!
//! Mirrors the key layout of an external key-value server so the service
//! can run without one (tests, single-instance demos).

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::{GameId, GameStore, MoveLog, StoredGame, error_key, moves_key, selection_key};
use crate::error::StoreError;

#[derive(Clone, Debug)]
enum Entry {
    List(Vec<String>),
    Value(String),
}

/// Games kept in a process-local map
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Entry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn set_value(entries: &mut HashMap<String, Entry>, key: String, value: Option<&String>) {
        match value {
            Some(v) => {
                entries.insert(key, Entry::Value(v.clone()));
            }
            None => {
                entries.remove(&key);
            }
        }
    }

    fn value(entries: &HashMap<String, Entry>, key: &str) -> Result<Option<String>, StoreError> {
        match entries.get(key) {
            None => Ok(None),
            Some(Entry::Value(v)) => Ok(Some(v.clone())),
            Some(Entry::List(_)) => Err(StoreError::Corrupt {
                key: key.to_string(),
                message: "expected a value, found a list".to_string(),
            }),
        }
    }
}

#[async_trait]
impl GameStore for MemoryStore {
    async fn create(&self) -> Result<GameId, StoreError> {
        let id = GameId::generate();
        tracing::trace!("Creating new game: {}", id);
        self.entries
            .write()
            .insert(moves_key(&id), Entry::List(Vec::new()));
        Ok(id)
    }

    async fn get(&self, id: &GameId) -> Result<Option<StoredGame>, StoreError> {
        let entries = self.entries.read();
        let key = moves_key(id);
        let moves = match entries.get(&key) {
            None => return Ok(None),
            Some(Entry::List(moves)) => MoveLog::from(moves.clone()),
            Some(Entry::Value(_)) => {
                return Err(StoreError::Corrupt {
                    key,
                    message: "expected a list, found a value".to_string(),
                });
            }
        };
        Ok(Some(StoredGame {
            moves,
            selection: Self::value(&entries, &selection_key(id))?,
            error: Self::value(&entries, &error_key(id))?,
        }))
    }

    async fn put(&self, id: &GameId, game: &StoredGame) -> Result<(), StoreError> {
        tracing::trace!("Saving game {}: {:?}", id, game);
        let mut entries = self.entries.write();
        Self::set_value(&mut entries, selection_key(id), game.selection.as_ref());
        Self::set_value(&mut entries, error_key(id), game.error.as_ref());
        entries.insert(moves_key(id), Entry::List(game.moves.as_slice().to_vec()));
        Ok(())
    }
}
