//! Opponent turn runner.
//!
//! Hand-offs run as detached tokio tasks, at most `workers` at a time, so a
//! click never waits on the opponent thinking. Each task reloads the game,
//! asks the selector, classifies the answer into an [`OpponentOutcome`],
//! persists it and publishes exactly one refresh event, whether the turn
//! succeeded or failed.
//!
//! At most one turn per game is in flight: scheduling a game whose turn is
//! still running is a no-op. Each task also re-checks the side to move after
//! reloading to drop late hand-offs.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use parking_lot::Mutex;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use super::{MoveRequest, MoveSelector, OpponentOutcome, RequestForm, classify, is_no_move};
use crate::models::{GameView, LastError, Reconstructor};
use crate::notify::{ChessEvent, Notifier, game_topic};
use crate::store::{GameId, StoredGame};

/// Runs opponent turns in the background
#[derive(Clone)]
pub struct OpponentRunner {
    games: Reconstructor,
    selector: Arc<dyn MoveSelector>,
    notifier: Arc<dyn Notifier>,
    permits: Arc<Semaphore>,
    in_flight: Arc<Mutex<HashSet<GameId>>>,
    timeout: Option<Duration>,
}

/// Marks a game as having a turn in flight until dropped
struct InFlight {
    ids: Arc<Mutex<HashSet<GameId>>>,
    id: GameId,
}

impl InFlight {
    fn claim(ids: &Arc<Mutex<HashSet<GameId>>>, id: &GameId) -> Option<Self> {
        ids.lock().insert(id.clone()).then(|| Self {
            ids: ids.clone(),
            id: id.clone(),
        })
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.ids.lock().remove(&self.id);
    }
}

impl OpponentRunner {
    pub fn new(
        games: Reconstructor,
        selector: Arc<dyn MoveSelector>,
        notifier: Arc<dyn Notifier>,
        workers: usize,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            games,
            selector,
            notifier,
            permits: Arc::new(Semaphore::new(workers.max(1))),
            in_flight: Arc::new(Mutex::new(HashSet::new())),
            timeout,
        }
    }

    /// Queue an opponent turn for `id` and return immediately.
    ///
    /// Returns `None` when a turn for `id` is already queued or running.
    pub fn schedule(&self, id: GameId) -> Option<JoinHandle<()>> {
        let Some(claim) = InFlight::claim(&self.in_flight, &id) else {
            tracing::debug!("Opponent turn already in flight for game: {}", id);
            return None;
        };
        let runner = self.clone();
        Some(tokio::spawn(async move {
            let _claim = claim;
            let Ok(_permit) = runner.permits.clone().acquire_owned().await else {
                return;
            };
            runner.play_turn(&id).await;
        }))
    }

    /// Play one opponent turn for `id`, if the opponent is to move
    pub async fn play_turn(&self, id: &GameId) {
        let view = match self.games.reconstruct(id).await {
            Ok(view) => view,
            Err(e) => {
                tracing::warn!("Skipping opponent move for game {}: {}", id, e);
                return;
            }
        };
        if !view.awaits_opponent() {
            tracing::warn!("Skipping opponent move, not its turn on game: {}", id);
            return;
        }

        let stored = match self.next_move(&view).await {
            OpponentOutcome::Moved(uci) => {
                tracing::info!("Playing opponent move on game {}: {}", id, uci);
                StoredGame {
                    moves: view.moves.with_move(uci),
                    selection: None,
                    error: None,
                }
            }
            OpponentOutcome::Failed(kind) => {
                tracing::warn!("Opponent failed to move on game {}: {}", id, kind);
                StoredGame {
                    error: Some(kind.as_str().to_string()),
                    ..view.to_stored()
                }
            }
        };

        if let Err(e) = self.games.store().put(id, &stored).await {
            tracing::warn!("Failed to save opponent turn for game {}: {}", id, e);
        }
        self.refresh(id);
    }

    /// Ask the selector, falling back to the notation form when it has no
    /// answer for the primary one
    async fn next_move(&self, view: &GameView) -> OpponentOutcome {
        for form in [RequestForm::Position, RequestForm::Notation] {
            let request = MoveRequest::from_view(view, form);
            match self.ask(request).await {
                Ok(Some(answer)) if !is_no_move(&answer) => {
                    return classify(&view.position, Some(&answer));
                }
                Ok(_) => {
                    tracing::debug!("No move from opponent for game {} using {:?} form", view.id, form);
                }
                Err(e) => {
                    tracing::warn!("Opponent error on game {}: {:#}", view.id, e);
                    return OpponentOutcome::Failed(LastError::ServerError);
                }
            }
        }
        OpponentOutcome::Failed(LastError::UnableToGuessNextMove)
    }

    /// One selector call on its own task, bounded by the configured timeout
    async fn ask(&self, request: MoveRequest) -> anyhow::Result<Option<String>> {
        let selector = self.selector.clone();
        let mut task = tokio::spawn(async move { selector.select_move(&request).await });

        let joined = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, &mut task).await {
                Ok(joined) => joined,
                Err(_) => {
                    task.abort();
                    return Err(anyhow!("no answer within {:?}", limit));
                }
            },
            None => task.await,
        };
        joined.map_err(|e| anyhow!("move selection task failed: {}", e))?
    }

    fn refresh(&self, id: &GameId) {
        tracing::debug!("Refreshing board UI: {}", id);
        self.notifier
            .publish(&game_topic(id), ChessEvent::update_board());
    }
}
