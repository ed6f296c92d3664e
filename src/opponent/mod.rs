//! The automated opponent.
//!
//! A [`MoveSelector`] proposes a move in UCI notation (or nothing). The
//! [`runner::OpponentRunner`] decides what that proposal means for the
//! game: it validates, persists and notifies.

pub mod engine;
pub mod random;
pub mod remote;
pub mod runner;

pub use engine::{EngineSettings, UciEngineSelector};
pub use random::RandomSelector;
pub use remote::RemoteSelector;
pub use runner::OpponentRunner;

use async_trait::async_trait;
use shakmaty::uci::UciMove;
use shakmaty::{CastlingMode, Chess, Move};

use crate::domain::chess::Side;
use crate::models::{GameView, LastError};

/// Shape of the question put to a selector
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestForm {
    /// Position plus the full move history
    Position,
    /// Fallback: FEN and PGN text only
    Notation,
}

/// Everything a selector may look at to pick a move
#[derive(Clone, Debug)]
pub struct MoveRequest {
    pub form: RequestForm,
    /// Current position
    pub position: Chess,
    /// FEN of the starting configuration
    pub start_fen: String,
    /// UCI moves played so far
    pub moves: Vec<String>,
    /// FEN of the current position
    pub fen: String,
    /// PGN of the game so far
    pub pgn: String,
    /// Side the opponent plays
    pub side: Side,
}

impl MoveRequest {
    pub fn from_view(view: &GameView, form: RequestForm) -> Self {
        Self {
            form,
            position: view.position.clone(),
            start_fen: crate::domain::chess::to_fen(&view.start),
            moves: view.moves.as_slice().to_vec(),
            fen: view.fen(),
            pgn: view.pgn(),
            side: view.human.opponent(),
        }
    }
}

/// Pluggable move-selection capability.
///
/// `Ok(None)` means the selector is indecisive; `Err` is an unexpected
/// failure. The returned string is not trusted: it is validated by the
/// runner before anything is stored.
#[async_trait]
pub trait MoveSelector: Send + Sync {
    async fn select_move(&self, request: &MoveRequest) -> anyhow::Result<Option<String>>;
}

/// Tagged result of one opponent turn
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OpponentOutcome {
    /// A legal move, in canonical UCI
    Moved(String),
    /// The turn failed with this kind; the log is unchanged
    Failed(LastError),
}

/// Whether a raw answer is the "no move" sentinel
pub fn is_no_move(raw: &str) -> bool {
    matches!(raw.trim(), "" | "null" | "(none)" | "0000")
}

/// Classify a selector's answer against the current position
pub fn classify(position: &Chess, answer: Option<&str>) -> OpponentOutcome {
    let Some(raw) = answer.filter(|raw| !is_no_move(raw)) else {
        return OpponentOutcome::Failed(LastError::UnableToGuessNextMove);
    };
    let Ok(uci) = raw.trim().parse::<UciMove>() else {
        return OpponentOutcome::Failed(LastError::UnableToGuessNextMove);
    };
    match uci.to_move(position) {
        Ok(m) => OpponentOutcome::Moved(canonical_uci(&m)),
        Err(_) => OpponentOutcome::Failed(LastError::IllegalMoveFromAi),
    }
}

fn canonical_uci(m: &Move) -> String {
    m.to_uci(CastlingMode::Standard).to_string()
}
