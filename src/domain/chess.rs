//! Pure chess domain types and utilities.
//! No I/O here - this is the domain layer sitting on top of shakmaty.

use serde::{Deserialize, Serialize};
use shakmaty::fen::Fen;
use shakmaty::uci::UciMove;
use shakmaty::zobrist::{Zobrist64, ZobristHash};
use shakmaty::{
    CastlingMode, Chess, Color, EnPassantMode, File, Move, Piece, Position, Rank, Role, Square,
};

/// FEN of the standard initial arrangement
pub const STANDARD_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

#[derive(Debug, thiserror::Error)]
pub enum ChessError {
    #[error("invalid square name: {0}")]
    InvalidSquare(String),

    #[error("invalid FEN {fen:?}: {message}")]
    InvalidFen { fen: String, message: String },
}

/// One of the two players
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    White,
    Black,
}

impl Side {
    pub fn opponent(self) -> Side {
        match self {
            Side::White => Side::Black,
            Side::Black => Side::White,
        }
    }

    pub fn parse(s: &str) -> Option<Side> {
        match s.trim().to_ascii_lowercase().as_str() {
            "white" | "w" => Some(Side::White),
            "black" | "b" => Some(Side::Black),
            _ => None,
        }
    }
}

impl From<Color> for Side {
    fn from(color: Color) -> Self {
        match color {
            Color::White => Side::White,
            Color::Black => Side::Black,
        }
    }
}

impl From<Side> for Color {
    fn from(side: Side) -> Self {
        match side {
            Side::White => Color::White,
            Side::Black => Color::Black,
        }
    }
}

/// Parse a square name such as `e4`
pub fn parse_square(name: &str) -> Result<Square, ChessError> {
    name.trim()
        .to_ascii_lowercase()
        .parse::<Square>()
        .map_err(|_| ChessError::InvalidSquare(name.to_string()))
}

/// Rank a pawn of the given color promotes on
pub fn promotion_rank(color: Color) -> Rank {
    match color {
        Color::White => Rank::Eighth,
        Color::Black => Rank::First,
    }
}

/// Whether `from -> to` is a pawn stepping onto an empty square of its
/// promotion rank, in which case it is always played as a queen promotion.
pub fn is_auto_queen(position: &Chess, from: Square, to: Square) -> bool {
    let board = position.board();
    match board.piece_at(from) {
        Some(Piece {
            role: Role::Pawn,
            color,
        }) => to.rank() == promotion_rank(color) && board.piece_at(to).is_none(),
        _ => false,
    }
}

/// Build the UCI candidate for a click pair, auto-queening where it applies.
///
/// A target holding a piece of the mover's own color is never a candidate,
/// so king-takes-own-rook castling notation is not reachable by clicks.
pub fn candidate_move(position: &Chess, from: Square, to: Square) -> Option<UciMove> {
    let mover = position.board().piece_at(from)?;
    if position
        .board()
        .piece_at(to)
        .is_some_and(|target| target.color == mover.color)
    {
        return None;
    }
    let promotion = is_auto_queen(position, from, to).then_some(Role::Queen);
    Some(UciMove::Normal {
        from,
        to,
        promotion,
    })
}

/// Whether the side to move owns the piece on `square`
pub fn owns_piece(position: &Chess, square: Square) -> bool {
    position
        .board()
        .piece_at(square)
        .is_some_and(|piece| piece.color == position.turn())
}

/// Parse a FEN and set up a position from it
pub fn position_from_fen(fen: &str) -> Result<Chess, ChessError> {
    let invalid = |message: String| ChessError::InvalidFen {
        fen: fen.to_string(),
        message,
    };
    let parsed: Fen = fen.trim().parse().map_err(|e| invalid(format!("{e}")))?;
    parsed
        .into_position(CastlingMode::Standard)
        .map_err(|e| invalid(format!("{e}")))
}

/// Render a position as FEN
pub fn to_fen(position: &Chess) -> String {
    Fen::from_position(position, EnPassantMode::Legal).to_string()
}

/// How many times the final position of `history`, played from `start`,
/// has occurred in the game so far (itself included)
pub fn repetitions(start: &Chess, history: &[Move]) -> usize {
    let hash = |position: &Chess| position.zobrist_hash::<Zobrist64>(EnPassantMode::Legal);
    let mut position = start.clone();
    let mut seen = vec![hash(&position)];
    for m in history {
        let Ok(next) = position.clone().play(m.clone()) else {
            break;
        };
        position = next;
        seen.push(hash(&position));
    }
    let last = hash(&position);
    seen.iter().filter(|h| **h == last).count()
}

/// Draw by the fifty-move rule or by threefold repetition
pub fn is_rule_draw(position: &Chess, repetitions: usize) -> bool {
    position.halfmoves() >= 100 || repetitions >= 3
}

/// Square of the king of the side to move, when that king is in check
pub fn checked_king(position: &Chess) -> Option<Square> {
    if !position.is_check() {
        return None;
    }
    position.board().king_of(position.turn())
}

/// All 64 squares, rank 8 down to rank 1, files a to h (board reading order)
pub fn squares_top_down() -> impl Iterator<Item = Square> {
    (0..8u32).rev().flat_map(|rank| {
        (0..8u32).map(move |file| Square::from_coords(File::new(file), Rank::new(rank)))
    })
}
