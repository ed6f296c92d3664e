//! Game view model - the per-request, never-persisted picture of one game.
//!
//! A [`GameView`] is rebuilt from the store on every read (see
//! [`crate::models::replay`]) and dropped when the request or task is done.
//! Playing a move never mutates it; the dispatcher produces the next
//! stored fields instead.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use shakmaty::{Chess, Move, Position, Square};

use crate::domain::chess::{self, Side};
use crate::domain::pgn;
use crate::store::{GameId, MoveLog, StoredGame};

/// Error kinds recorded against a game
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LastError {
    /// Unexpected failure while running the opponent
    ServerError,
    /// The opponent proposed a move that is not legal
    IllegalMoveFromAi,
    /// The opponent produced no usable move
    UnableToGuessNextMove,
    /// Game-over marker, not an operational failure
    CheckMate,
}

impl LastError {
    pub fn as_str(&self) -> &'static str {
        match self {
            LastError::ServerError => "SERVER_ERROR",
            LastError::IllegalMoveFromAi => "ILLEGAL_MOVE_FROM_AI",
            LastError::UnableToGuessNextMove => "UNABLE_TO_GUESS_NEXT_MOVE",
            LastError::CheckMate => "CHECK_MATE",
        }
    }
}

impl fmt::Display for LastError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LastError {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SERVER_ERROR" => Ok(LastError::ServerError),
            "ILLEGAL_MOVE_FROM_AI" => Ok(LastError::IllegalMoveFromAi),
            "UNABLE_TO_GUESS_NEXT_MOVE" => Ok(LastError::UnableToGuessNextMove),
            "CHECK_MATE" => Ok(LastError::CheckMate),
            other => Err(other.to_string()),
        }
    }
}

/// Terminal-result status of a position
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    Ongoing,
    Check,
    Checkmate,
    Stalemate,
    Draw,
}

impl GameStatus {
    /// Status of `position`, reached for the `repetitions`-th time in its game
    pub fn of(position: &Chess, repetitions: usize) -> Self {
        if position.is_checkmate() {
            GameStatus::Checkmate
        } else if position.is_stalemate() {
            GameStatus::Stalemate
        } else if position.is_insufficient_material()
            || chess::is_rule_draw(position, repetitions)
        {
            GameStatus::Draw
        } else if position.is_check() {
            GameStatus::Check
        } else {
            GameStatus::Ongoing
        }
    }

    pub fn is_over(self) -> bool {
        matches!(
            self,
            GameStatus::Checkmate | GameStatus::Stalemate | GameStatus::Draw
        )
    }
}

/// Where the human is in the click protocol
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TurnPhase {
    /// A terminal result was reached
    GameOver,
    /// The opponent is to move
    NotHumanTurn,
    /// Human to move, no source square picked yet
    AwaitingSelection,
    /// Human to move, waiting for the target of a move from this square
    AwaitingTarget(Square),
}

/// Reconstructed state of one game
#[derive(Clone, Debug)]
pub struct GameView {
    pub id: GameId,
    /// Starting configuration the log is replayed from
    pub start: Chess,
    /// Position after replaying `moves`
    pub position: Chess,
    /// The stored move log, verbatim
    pub moves: MoveLog,
    /// `moves` as engine moves, in order
    pub history: Vec<Move>,
    /// Occurrences of `position` in the game, itself included
    pub repetitions: usize,
    pub selection: Option<Square>,
    pub last_error: Option<LastError>,
    /// Side played by the human
    pub human: Side,
}

impl GameView {
    pub fn side_to_move(&self) -> Side {
        self.position.turn().into()
    }

    pub fn is_human_turn(&self) -> bool {
        self.side_to_move() == self.human
    }

    pub fn status(&self) -> GameStatus {
        GameStatus::of(&self.position, self.repetitions)
    }

    pub fn is_game_over(&self) -> bool {
        self.status().is_over()
    }

    /// Whether the opponent should be (or is being) asked for a move
    pub fn awaits_opponent(&self) -> bool {
        !self.is_game_over() && !self.is_human_turn()
    }

    pub fn phase(&self) -> TurnPhase {
        if self.is_game_over() {
            TurnPhase::GameOver
        } else if !self.is_human_turn() {
            TurnPhase::NotHumanTurn
        } else {
            match self.selection {
                Some(square) => TurnPhase::AwaitingTarget(square),
                None => TurnPhase::AwaitingSelection,
            }
        }
    }

    /// Stored error, or the checkmate marker when the game ended in mate
    pub fn displayed_error(&self) -> Option<LastError> {
        self.last_error.or_else(|| {
            self.position
                .is_checkmate()
                .then_some(LastError::CheckMate)
        })
    }

    pub fn last_move(&self) -> Option<&str> {
        self.moves.last()
    }

    pub fn checked_king(&self) -> Option<Square> {
        chess::checked_king(&self.position)
    }

    /// Squares the selected piece may legally move to
    pub fn legal_targets(&self) -> Vec<Square> {
        let Some(from) = self.selection else {
            return Vec::new();
        };
        chess::squares_top_down()
            .filter(|&to| {
                chess::candidate_move(&self.position, from, to)
                    .is_some_and(|candidate| candidate.to_move(&self.position).is_ok())
            })
            .collect()
    }

    pub fn fen(&self) -> String {
        chess::to_fen(&self.position)
    }

    pub fn pgn(&self) -> String {
        let (white, black) = match self.human {
            Side::White => ("Human", "AI"),
            Side::Black => ("AI", "Human"),
        };
        pgn::write_pgn(&self.start, &self.history, white, black)
    }

    /// Fields to persist for this view as it stands
    pub fn to_stored(&self) -> StoredGame {
        StoredGame {
            moves: self.moves.clone(),
            selection: self.selection.map(|s| s.to_string()),
            error: self.last_error.map(|e| e.as_str().to_string()),
        }
    }
}
