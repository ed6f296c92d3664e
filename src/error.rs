//! Error types for the game core
//!
//! Store and replay failures never reach the player as a game error kind;
//! the service folds them into [`ServiceError::NotFound`].

use crate::store::GameId;

/// Errors raised by a [`crate::store::GameStore`] backend
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Underlying database failure
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored entry has an unexpected shape
    #[error("corrupt entry {key}: {message}")]
    Corrupt { key: String, message: String },
}

/// Reasons a stored game cannot be turned back into a position
#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    /// Moves were stored but the deployment starts from a custom position
    #[error("move log of {moves} moves cannot be replayed from a non-standard start")]
    NonStandardStart { moves: usize },

    /// A stored move is not valid UCI
    #[error("unparseable move {uci:?} at ply {ply}")]
    InvalidMove { ply: usize, uci: String },

    /// A stored move is not legal in the replayed position
    #[error("illegal move {uci:?} at ply {ply}")]
    IllegalMove { ply: usize, uci: String },

    /// The stored selection is not a square name
    #[error("invalid stored selection {0:?}")]
    InvalidSelection(String),

    /// The stored error string is not one of the known kinds
    #[error("unknown stored error kind {0:?}")]
    UnknownErrorKind(String),
}

/// Errors surfaced by [`crate::service::GameService`]
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Unknown id, or a stored game that failed to load
    #[error("game not found: {0}")]
    NotFound(GameId),

    /// Clicked square is not a square name
    #[error("invalid square: {0}")]
    InvalidSquare(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type alias for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;
