//! HTTP and WebSocket adapter over [`GameService`].
//!
//! Renders nothing itself: every game endpoint answers with a [`dto::BoardDto`]
//! for an external board UI.

pub mod dto;
mod events;
mod handlers;

use axum::Router;
use axum::routing::{get, post};

use crate::notify::BroadcastNotifier;
use crate::service::GameService;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub service: GameService,
    pub notifier: BroadcastNotifier,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/chess/new", post(handlers::create_game))
        .route("/chess/{id}", get(handlers::get_game))
        .route("/chess/{id}/click/{square}", post(handlers::click))
        .route("/chess/{id}/retry", post(handlers::retry))
        .route("/chess/{id}/pgn", get(handlers::pgn))
        .route("/chess/{id}/events", get(events::subscribe))
        .with_state(state)
}
