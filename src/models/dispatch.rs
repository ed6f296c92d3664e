//! Turn dispatcher - what a square click means in context.
//!
//! Pure state machine over a [`GameView`]. It never touches the store; the
//! service persists whatever [`ClickOutcome::next_stored`] returns.

use shakmaty::{CastlingMode, Chess, Color, Position, Square};

use crate::domain::chess;
use crate::models::game::{GameView, GameStatus, TurnPhase};
use crate::store::StoredGame;

/// Result of one click
#[derive(Clone, Debug)]
pub enum ClickOutcome {
    /// Nothing changes (game over, opponent's turn, or empty/foreign square)
    Ignored,
    /// The human picked a source square
    Selected(Square),
    /// The target did not make a legal move; the selection is dropped
    Cancelled,
    /// A human move was committed
    Moved {
        /// UCI of the committed move
        uci: String,
        /// Position after the move
        position: Chess,
        /// Whether the opponent must now be asked for a move
        handoff: bool,
    },
}

impl ClickOutcome {
    /// Fields to persist after this click, or `None` when nothing changes.
    ///
    /// A committed move appends to the log and clears both transient
    /// fields; selection changes leave the log and last error alone.
    pub fn next_stored(&self, view: &GameView) -> Option<StoredGame> {
        match self {
            ClickOutcome::Ignored => None,
            ClickOutcome::Selected(square) => Some(StoredGame {
                selection: Some(square.to_string()),
                ..view.to_stored()
            }),
            ClickOutcome::Cancelled => Some(StoredGame {
                selection: None,
                ..view.to_stored()
            }),
            ClickOutcome::Moved { uci, .. } => Some(StoredGame {
                moves: view.moves.with_move(uci.clone()),
                selection: None,
                error: None,
            }),
        }
    }

    pub fn handoff(&self) -> bool {
        matches!(self, ClickOutcome::Moved { handoff: true, .. })
    }
}

/// Interpret a click on `clicked` for the game in `view`
pub fn on_click(view: &GameView, clicked: Square) -> ClickOutcome {
    match view.phase() {
        TurnPhase::GameOver | TurnPhase::NotHumanTurn => ClickOutcome::Ignored,
        TurnPhase::AwaitingSelection => {
            if chess::owns_piece(&view.position, clicked) {
                ClickOutcome::Selected(clicked)
            } else {
                ClickOutcome::Ignored
            }
        }
        TurnPhase::AwaitingTarget(from) => {
            let Some(candidate) = chess::candidate_move(&view.position, from, clicked) else {
                return ClickOutcome::Cancelled;
            };
            let Ok(m) = candidate.to_move(&view.position) else {
                return ClickOutcome::Cancelled;
            };
            let uci = m.to_uci(CastlingMode::Standard).to_string();
            let Ok(position) = view.position.clone().play(m.clone()) else {
                return ClickOutcome::Cancelled;
            };
            let mut history = view.history.clone();
            history.push(m);
            let repetitions = chess::repetitions(&view.start, &history);
            let handoff = position.turn() != Color::from(view.human)
                && !GameStatus::of(&position, repetitions).is_over();
            ClickOutcome::Moved {
                uci,
                position,
                handoff,
            }
        }
    }
}
