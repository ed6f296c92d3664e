pub mod chess;
pub mod pgn;
pub mod uci;

pub use chess::{ChessError, STANDARD_FEN, Side};
