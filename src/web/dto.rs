//! Response bodies for the HTTP API.
//!
//! These types prepare game state for an external board UI. They live in
//! the web layer, not the model layer.

use serde::Serialize;
use shakmaty::san::San;
use shakmaty::{Position, Square};

use crate::domain::chess::{self, Side};
use crate::models::{GameStatus, GameView, LastError};
use crate::store::GameId;

/// Highlight class of one board square
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Highlight {
    /// The selected source square
    Current,
    /// The king of the side to move, while in check
    KingAttacked,
    /// Origin or destination of the last move
    LastMove,
    None,
}

/// One square as the board UI draws it
#[derive(Clone, Debug, Serialize)]
pub struct SquareDto {
    pub square: String,
    /// FEN letter of the occupying piece (uppercase for White)
    pub piece: Option<char>,
    pub highlight: Highlight,
    /// Whether the selected piece may move here
    pub legal: bool,
}

/// Full board state returned by every game endpoint
#[derive(Clone, Debug, Serialize)]
pub struct BoardDto {
    pub id: GameId,
    pub fen: String,
    pub side_to_move: Side,
    pub human: Side,
    pub status: GameStatus,
    pub selection: Option<String>,
    pub last_error: Option<LastError>,
    /// Last move in UCI
    pub last_move: Option<String>,
    pub checked_king: Option<String>,
    pub legal_targets: Vec<String>,
    /// Moves played so far in SAN
    pub moves: Vec<String>,
    /// Rank 8 to rank 1, files a to h
    pub squares: Vec<SquareDto>,
}

#[derive(Clone, Debug, Serialize)]
pub struct CreatedGame {
    pub id: GameId,
}

impl From<&GameView> for BoardDto {
    fn from(view: &GameView) -> Self {
        let legal_targets = view.legal_targets();
        let checked_king = view.checked_king();
        let last_move = last_move_squares(view);

        let squares = chess::squares_top_down()
            .map(|square| {
                let highlight = if view.selection == Some(square) {
                    Highlight::Current
                } else if checked_king == Some(square) {
                    Highlight::KingAttacked
                } else if last_move.contains(&square) {
                    Highlight::LastMove
                } else {
                    Highlight::None
                };
                SquareDto {
                    square: square.to_string(),
                    piece: view.position.board().piece_at(square).map(|p| p.char()),
                    highlight,
                    legal: legal_targets.contains(&square),
                }
            })
            .collect();

        BoardDto {
            id: view.id.clone(),
            fen: view.fen(),
            side_to_move: view.side_to_move(),
            human: view.human,
            status: view.status(),
            selection: view.selection.map(|s| s.to_string()),
            last_error: view.displayed_error(),
            last_move: view.last_move().map(str::to_string),
            checked_king: checked_king.map(|s| s.to_string()),
            legal_targets: legal_targets.iter().map(|s| s.to_string()).collect(),
            moves: san_moves(view),
            squares,
        }
    }
}

fn last_move_squares(view: &GameView) -> Vec<Square> {
    let Some(m) = view.history.last() else {
        return Vec::new();
    };
    let mut squares = vec![m.to()];
    if let Some(from) = m.from() {
        squares.push(from);
    }
    squares
}

fn san_moves(view: &GameView) -> Vec<String> {
    let mut position = view.start.clone();
    let mut moves = Vec::with_capacity(view.history.len());
    for m in &view.history {
        moves.push(San::from_move(&position, m.clone()).to_string());
        let Ok(next) = position.clone().play(m.clone()) else {
            break;
        };
        position = next;
    }
    moves
}
