//! State reconstruction: stored fields in, [`GameView`] out.
//!
//! The move log is the only source of truth for the position. Replaying
//! the same log always yields the same position; any log that does not
//! replay cleanly is treated as corruption and the game is reported as
//! not found rather than shown half-built.

use std::sync::Arc;

use shakmaty::uci::UciMove;
use shakmaty::{Chess, Move, Position};

use crate::domain::chess::{self, STANDARD_FEN, Side};
use crate::error::{ReplayError, ServiceError, ServiceResult, StoreError};
use crate::models::game::{GameView, LastError};
use crate::store::{GameId, GameStore, MoveLog, StoredGame};

/// Rebuilds game views from a store
#[derive(Clone)]
pub struct Reconstructor {
    store: Arc<dyn GameStore>,
    start: Chess,
    start_is_standard: bool,
    human: Side,
}

impl Reconstructor {
    pub fn new(store: Arc<dyn GameStore>, start: Chess, human: Side) -> Self {
        let start_is_standard = chess::to_fen(&start) == STANDARD_FEN;
        Self {
            store,
            start,
            start_is_standard,
            human,
        }
    }

    pub fn store(&self) -> &Arc<dyn GameStore> {
        &self.store
    }

    pub fn human(&self) -> Side {
        self.human
    }

    /// Replay `moves` from the configured start
    pub fn replay(&self, moves: &MoveLog) -> Result<(Chess, Vec<Move>), ReplayError> {
        if !moves.is_empty() && !self.start_is_standard {
            return Err(ReplayError::NonStandardStart { moves: moves.len() });
        }

        let mut position = self.start.clone();
        let mut history = Vec::with_capacity(moves.len());
        for (ply, uci) in moves.iter().enumerate() {
            let parsed: UciMove = uci.parse().map_err(|_| ReplayError::InvalidMove {
                ply,
                uci: uci.to_string(),
            })?;
            let illegal = || ReplayError::IllegalMove {
                ply,
                uci: uci.to_string(),
            };
            let m = parsed.to_move(&position).map_err(|_| illegal())?;
            position = position.play(m.clone()).map_err(|_| illegal())?;
            history.push(m);
        }
        Ok((position, history))
    }

    /// Build a view from raw stored fields
    pub fn view_from(&self, id: GameId, stored: StoredGame) -> Result<GameView, ReplayError> {
        let (position, history) = self.replay(&stored.moves)?;
        let selection = stored
            .selection
            .map(|s| chess::parse_square(&s).map_err(|_| ReplayError::InvalidSelection(s)))
            .transpose()?;
        let last_error = stored
            .error
            .map(|e| e.parse::<LastError>().map_err(ReplayError::UnknownErrorKind))
            .transpose()?;

        let repetitions = chess::repetitions(&self.start, &history);
        Ok(GameView {
            id,
            start: self.start.clone(),
            position,
            moves: stored.moves,
            history,
            repetitions,
            selection,
            last_error,
            human: self.human,
        })
    }

    /// Load and rebuild a game.
    ///
    /// Unknown ids and games that fail to replay are both `NotFound`.
    pub async fn reconstruct(&self, id: &GameId) -> ServiceResult<GameView> {
        tracing::trace!("Loading game: {}", id);
        let stored = match self.store.get(id).await {
            Ok(Some(stored)) => stored,
            Ok(None) => return Err(ServiceError::NotFound(id.clone())),
            Err(e @ StoreError::Corrupt { .. }) => {
                tracing::warn!("Failed to load game {}: {}", id, e);
                return Err(ServiceError::NotFound(id.clone()));
            }
            Err(e) => return Err(e.into()),
        };

        self.view_from(id.clone(), stored).map_err(|e| {
            tracing::warn!("Failed to load game {}: {}", id, e);
            ServiceError::NotFound(id.clone())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use shakmaty::Square;

    fn reconstructor(start: Chess) -> Reconstructor {
        Reconstructor::new(Arc::new(MemoryStore::new()), start, Side::White)
    }

    fn stored(moves: &[&str]) -> StoredGame {
        StoredGame {
            moves: moves.iter().copied().collect(),
            ..StoredGame::default()
        }
    }

    #[test]
    fn test_replay_is_deterministic() {
        let r = reconstructor(Chess::default());
        let log = stored(&["e2e4", "c7c5", "g1f3", "d7d6", "e1e2"]).moves;
        let (a, _) = r.replay(&log).unwrap();
        let (b, history) = r.replay(&log).unwrap();
        assert_eq!(chess::to_fen(&a), chess::to_fen(&b));
        assert_eq!(history.len(), 5);
    }

    #[test]
    fn test_view_attaches_transient_fields() {
        let r = reconstructor(Chess::default());
        let game = StoredGame {
            moves: ["e2e4", "e7e5"].into_iter().collect(),
            selection: Some("g1".to_string()),
            error: Some("SERVER_ERROR".to_string()),
        };
        let view = r.view_from(GameId::from("g"), game).unwrap();
        assert_eq!(view.selection, Some(Square::G1));
        assert_eq!(view.last_error, Some(LastError::ServerError));
        assert_eq!(view.side_to_move(), Side::White);
    }

    #[test]
    fn test_view_counts_repetitions() {
        let r = reconstructor(Chess::default());
        let shuffle = ["g1f3", "g8f6", "f3g1", "f6g8"];
        let view = r
            .view_from(GameId::from("g"), stored(&[&shuffle[..], &shuffle[..]].concat()))
            .unwrap();
        assert_eq!(view.repetitions, 3);
        assert!(view.is_game_over());
    }

    #[test]
    fn test_illegal_stored_move_fails_closed() {
        let r = reconstructor(Chess::default());
        let err = r.replay(&stored(&["e2e4", "e2e4"]).moves).unwrap_err();
        assert!(matches!(err, ReplayError::IllegalMove { ply: 1, .. }));
    }

    #[test]
    fn test_garbage_stored_move_fails_closed() {
        let r = reconstructor(Chess::default());
        let err = r.replay(&stored(&["hello"]).moves).unwrap_err();
        assert!(matches!(err, ReplayError::InvalidMove { ply: 0, .. }));
    }

    #[test]
    fn test_non_standard_start_rejects_moves() {
        let start = chess::position_from_fen("7k/P7/8/8/8/8/8/K7 w - - 0 1").unwrap();
        let r = reconstructor(start);
        assert!(r.replay(&MoveLog::new()).is_ok());
        let err = r.replay(&stored(&["a7a8q"]).moves).unwrap_err();
        assert!(matches!(err, ReplayError::NonStandardStart { moves: 1 }));
    }

    #[test]
    fn test_unknown_error_kind_fails_closed() {
        let r = reconstructor(Chess::default());
        let game = StoredGame {
            error: Some("OOPS".to_string()),
            ..StoredGame::default()
        };
        assert!(matches!(
            r.view_from(GameId::from("g"), game),
            Err(ReplayError::UnknownErrorKind(_))
        ));
    }

    #[tokio::test]
    async fn test_reconstruct_unknown_and_corrupt_are_not_found() {
        let store = Arc::new(MemoryStore::new());
        let r = Reconstructor::new(store.clone(), Chess::default(), Side::White);

        let missing = r.reconstruct(&GameId::from("missing")).await;
        assert!(matches!(missing, Err(ServiceError::NotFound(_))));

        let id = store.create().await.unwrap();
        store.put(&id, &stored(&["e2e5"])).await.unwrap();
        let corrupt = r.reconstruct(&id).await;
        assert!(matches!(corrupt, Err(ServiceError::NotFound(_))));
    }
}
