//! Minimal PGN export for a linear game.
//!
//! Used as the fallback prompt form for the opponent and for the
//! `/pgn` endpoint.

use std::fmt::Write;

use shakmaty::san::San;
use shakmaty::{Chess, Color, Move, Position};

use crate::domain::chess::{STANDARD_FEN, is_rule_draw, repetitions, to_fen};

/// PGN result token for a position reached for the `repetitions`-th time
pub fn result_token(position: &Chess, repetitions: usize) -> &'static str {
    if position.is_checkmate() {
        match position.turn() {
            Color::White => "0-1",
            Color::Black => "1-0",
        }
    } else if position.is_stalemate()
        || position.is_insufficient_material()
        || is_rule_draw(position, repetitions)
    {
        "1/2-1/2"
    } else {
        "*"
    }
}

/// Render `history` played from `start` as PGN with the given player names.
///
/// Moves are expected to be legal in sequence; the caller obtained them by
/// replaying the log.
pub fn write_pgn(start: &Chess, history: &[Move], white: &str, black: &str) -> String {
    let mut out = String::new();
    let mut position = start.clone();
    let mut movetext = Vec::with_capacity(history.len() + 1);

    for (i, m) in history.iter().enumerate() {
        let number = position.fullmoves().get();
        match position.turn() {
            Color::White => movetext.push(format!("{}.", number)),
            Color::Black if i == 0 => movetext.push(format!("{}...", number)),
            Color::Black => {}
        }

        let mut san = San::from_move(&position, m.clone()).to_string();
        let Ok(next) = position.clone().play(m.clone()) else {
            break;
        };
        position = next;
        if position.is_checkmate() {
            san.push('#');
        } else if position.is_check() {
            san.push('+');
        }
        movetext.push(san);
    }

    let result = result_token(&position, repetitions(start, history));
    movetext.push(result.to_string());

    let _ = writeln!(out, "[Event \"Casual game\"]");
    let _ = writeln!(out, "[White \"{}\"]", white);
    let _ = writeln!(out, "[Black \"{}\"]", black);
    let _ = writeln!(out, "[Result \"{}\"]", result);
    let start_fen = to_fen(start);
    if start_fen != STANDARD_FEN {
        let _ = writeln!(out, "[SetUp \"1\"]");
        let _ = writeln!(out, "[FEN \"{}\"]", start_fen);
    }
    out.push('\n');
    out.push_str(&movetext.join(" "));
    out.push('\n');
    out
}
