//! Game service - the stateless request handler.
//!
//! Every operation rebuilds the game from the store, applies at most one
//! change and persists it. Nothing about a game survives in memory between
//! requests.

use crate::domain::chess;
use crate::error::{ServiceError, ServiceResult};
use crate::models::{GameView, Reconstructor, on_click};
use crate::opponent::OpponentRunner;
use crate::store::GameId;

/// Entry point used by the web layer
#[derive(Clone)]
pub struct GameService {
    games: Reconstructor,
    runner: OpponentRunner,
}

impl GameService {
    pub fn new(games: Reconstructor, runner: OpponentRunner) -> Self {
        Self { games, runner }
    }

    /// Create an empty game; the opponent opens if it has the first move
    pub async fn create_game(&self) -> ServiceResult<GameId> {
        let id = self.games.store().create().await?;
        tracing::info!("Created game: {}", id);

        let view = self.games.reconstruct(&id).await?;
        if view.awaits_opponent() {
            self.runner.schedule(id.clone());
        }
        Ok(id)
    }

    pub async fn get_view(&self, id: &GameId) -> ServiceResult<GameView> {
        self.games.reconstruct(id).await
    }

    /// Apply a click on the square named `square` and return the new state
    pub async fn handle_click(&self, id: &GameId, square: &str) -> ServiceResult<GameView> {
        let clicked = chess::parse_square(square)
            .map_err(|_| ServiceError::InvalidSquare(square.to_string()))?;
        let view = self.games.reconstruct(id).await?;

        let outcome = on_click(&view, clicked);
        let Some(next) = outcome.next_stored(&view) else {
            tracing::debug!("Ignoring click on {} for game {}", clicked, id);
            return Ok(view);
        };

        self.games.store().put(id, &next).await?;
        tracing::debug!("Saved click on {} for game {}", clicked, id);
        if let Some(uci) = next.moves.last().filter(|_| next.moves.len() > view.moves.len()) {
            tracing::info!("Human played on game {}: {}", id, uci);
        }

        let updated = self.games.view_from(id.clone(), next).map_err(|e| {
            tracing::warn!("Failed to rebuild game {} after click: {}", id, e);
            ServiceError::NotFound(id.clone())
        })?;
        if outcome.handoff() {
            self.runner.schedule(id.clone());
        }
        Ok(updated)
    }

    /// Ask the opponent again after a failed turn.
    ///
    /// A no-op unless the opponent is to move in an unfinished game.
    pub async fn retry_opponent(&self, id: &GameId) -> ServiceResult<GameView> {
        let view = self.games.reconstruct(id).await?;
        if view.awaits_opponent() {
            tracing::info!("Retrying opponent move on game: {}", id);
            self.runner.schedule(id.clone());
        }
        Ok(view)
    }
}
