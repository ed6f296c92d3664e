//! Game flow tests against the service facade.
//!
//! The opponent is scripted and refresh events are observed through the
//! broadcast notifier.

mod common;

use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use chess_ai::config::Config;
use chess_ai::domain::chess::Side;
use chess_ai::error::ServiceError;
use chess_ai::models::{GameStatus, LastError, TurnPhase};
use chess_ai::notify::game_topic;
use chess_ai::opponent::RequestForm;
use chess_ai::store::{GameId, GameStore, MemoryStore, StoredGame};
use shakmaty::{Position, Square};

use common::{Scripted, assert_no_more_events, memory_state, next_event, state_with};

#[tokio::test]
async fn test_new_game_round_trip() {
    let state = memory_state(Scripted::moves(&[]));
    let id = state.service.create_game().await.unwrap();
    let view = state.service.get_view(&id).await.unwrap();

    assert_eq!(view.fen(), chess_ai::domain::STANDARD_FEN);
    assert!(view.moves.is_empty());
    assert_eq!(view.selection, None);
    assert_eq!(view.last_error, None);
    assert_eq!(view.phase(), TurnPhase::AwaitingSelection);
}

#[tokio::test]
async fn test_unknown_game_is_not_found() {
    let state = memory_state(Scripted::moves(&[]));
    let missing = GameId::from("no-such-game");
    assert!(matches!(
        state.service.get_view(&missing).await,
        Err(ServiceError::NotFound(_))
    ));
    assert!(matches!(
        state.service.handle_click(&missing, "e2").await,
        Err(ServiceError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_invalid_square_is_rejected() {
    let state = memory_state(Scripted::moves(&[]));
    let id = state.service.create_game().await.unwrap();
    assert!(matches!(
        state.service.handle_click(&id, "z9").await,
        Err(ServiceError::InvalidSquare(_))
    ));
}

#[tokio::test]
async fn test_human_move_then_opponent_reply() {
    let state = memory_state(Scripted::moves(&["e7e5"]));
    let mut events = state.notifier.subscribe();
    let id = state.service.create_game().await.unwrap();

    let selected = state.service.handle_click(&id, "e2").await.unwrap();
    assert_eq!(selected.selection, Some(Square::E2));

    let moved = state.service.handle_click(&id, "e4").await.unwrap();
    assert_eq!(moved.moves.as_slice(), ["e2e4".to_string()]);
    assert_eq!(moved.selection, None);

    let event = next_event(&mut events).await;
    assert_eq!(event.topic, game_topic(&id));
    assert_eq!(event.event.kind, "UPDATE_BOARD");

    let view = state.service.get_view(&id).await.unwrap();
    assert_eq!(view.moves.as_slice(), ["e2e4".to_string(), "e7e5".to_string()]);
    assert_eq!(view.last_error, None);
    assert!(view.is_human_turn());
    assert_no_more_events(&mut events).await;
}

#[tokio::test]
async fn test_replay_is_position_equivalent() {
    let state = memory_state(Scripted::moves(&["e7e5", "b8c6"]));
    let mut events = state.notifier.subscribe();
    let id = state.service.create_game().await.unwrap();

    for (from, to) in [("e2", "e4"), ("g1", "f3")] {
        state.service.handle_click(&id, from).await.unwrap();
        state.service.handle_click(&id, to).await.unwrap();
        next_event(&mut events).await;
    }

    let first = state.service.get_view(&id).await.unwrap();
    let second = state.service.get_view(&id).await.unwrap();
    assert_eq!(first.fen(), second.fen());
    assert_eq!(first.side_to_move(), second.side_to_move());
    assert_eq!(first.status(), second.status());
    assert_eq!(first.position.board(), second.position.board());
    assert_eq!(first.moves.len(), 4);
}

#[tokio::test]
async fn test_illegal_target_cancels_selection() {
    let state = memory_state(Scripted::moves(&[]));
    let id = state.service.create_game().await.unwrap();

    state.service.handle_click(&id, "e2").await.unwrap();
    let view = state.service.handle_click(&id, "e5").await.unwrap();
    assert_eq!(view.selection, None);
    assert!(view.moves.is_empty());
    assert_eq!(view.phase(), TurnPhase::AwaitingSelection);

    let reloaded = state.service.get_view(&id).await.unwrap();
    assert_eq!(reloaded.selection, None);
}

#[tokio::test]
async fn test_clicks_on_opponent_turn_are_ignored() {
    // No answer at all: the opponent stays to move with an error shown
    let state = memory_state(Scripted::moves(&[]));
    let mut events = state.notifier.subscribe();
    let id = state.service.create_game().await.unwrap();

    state.service.handle_click(&id, "d2").await.unwrap();
    state.service.handle_click(&id, "d4").await.unwrap();
    next_event(&mut events).await;

    let view = state.service.handle_click(&id, "d7").await.unwrap();
    assert_eq!(view.phase(), TurnPhase::NotHumanTurn);
    assert_eq!(view.selection, None);
    assert_eq!(view.moves.len(), 1);
}

#[tokio::test]
async fn test_no_move_sentinel_is_visible_once() {
    let selector = Scripted::new(vec![Ok(Some("(none)".into())), Ok(Some("null".into()))]);
    let state = memory_state(selector.clone());
    let mut events = state.notifier.subscribe();
    let id = state.service.create_game().await.unwrap();

    state.service.handle_click(&id, "e2").await.unwrap();
    state.service.handle_click(&id, "e4").await.unwrap();
    next_event(&mut events).await;
    assert_no_more_events(&mut events).await;

    let view = state.service.get_view(&id).await.unwrap();
    assert_eq!(view.last_error, Some(LastError::UnableToGuessNextMove));
    assert_eq!(view.moves.len(), 1);
    assert_eq!(
        selector.forms(),
        [RequestForm::Position, RequestForm::Notation]
    );
}

#[tokio::test]
async fn test_illegal_opponent_move_is_recorded() {
    let state = memory_state(Scripted::moves(&["e8e6"]));
    let mut events = state.notifier.subscribe();
    let id = state.service.create_game().await.unwrap();

    state.service.handle_click(&id, "e2").await.unwrap();
    state.service.handle_click(&id, "e4").await.unwrap();
    next_event(&mut events).await;

    let view = state.service.get_view(&id).await.unwrap();
    assert_eq!(view.last_error, Some(LastError::IllegalMoveFromAi));
    assert_eq!(view.moves.len(), 1);
}

#[tokio::test]
async fn test_selector_failure_then_retry() {
    let selector = Scripted::new(vec![Err(anyhow!("engine crashed")), Ok(Some("c7c5".into()))]);
    let state = memory_state(selector);
    let mut events = state.notifier.subscribe();
    let id = state.service.create_game().await.unwrap();

    state.service.handle_click(&id, "e2").await.unwrap();
    state.service.handle_click(&id, "e4").await.unwrap();
    next_event(&mut events).await;

    let failed = state.service.get_view(&id).await.unwrap();
    assert_eq!(failed.last_error, Some(LastError::ServerError));
    assert!(failed.awaits_opponent());

    state.service.retry_opponent(&id).await.unwrap();
    next_event(&mut events).await;

    let recovered = state.service.get_view(&id).await.unwrap();
    assert_eq!(recovered.last_error, None);
    assert_eq!(recovered.moves.last(), Some("c7c5"));
}

#[tokio::test]
async fn test_retry_while_opponent_thinks_is_ignored() {
    let selector = Scripted::slow(&["e7e5", "c7c5"], Duration::from_millis(300));
    let state = memory_state(selector.clone());
    let mut events = state.notifier.subscribe();
    let id = state.service.create_game().await.unwrap();

    state.service.handle_click(&id, "e2").await.unwrap();
    state.service.handle_click(&id, "e4").await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    state.service.retry_opponent(&id).await.unwrap();
    state.service.retry_opponent(&id).await.unwrap();

    next_event(&mut events).await;
    assert_no_more_events(&mut events).await;
    let view = state.service.get_view(&id).await.unwrap();
    assert_eq!(view.moves.as_slice(), ["e2e4".to_string(), "e7e5".to_string()]);
    assert_eq!(selector.forms(), [RequestForm::Position]);
}

#[tokio::test]
async fn test_threefold_repetition_ends_the_game() {
    let shuffle = ["g8f6", "f6g8", "g8f6", "f6g8"];
    let state = memory_state(Scripted::moves(&shuffle));
    let mut events = state.notifier.subscribe();
    let id = state.service.create_game().await.unwrap();

    for (from, to) in [("g1", "f3"), ("f3", "g1"), ("g1", "f3"), ("f3", "g1")] {
        state.service.handle_click(&id, from).await.unwrap();
        state.service.handle_click(&id, to).await.unwrap();
        next_event(&mut events).await;
    }

    let view = state.service.get_view(&id).await.unwrap();
    assert_eq!(view.moves.len(), 8);
    assert_eq!(view.status(), GameStatus::Draw);
    assert_eq!(view.phase(), TurnPhase::GameOver);
    assert!(view.pgn().contains("[Result \"1/2-1/2\"]"));

    let after = state.service.handle_click(&id, "e2").await.unwrap();
    assert_eq!(after.selection, None);
}

#[tokio::test]
async fn test_retry_on_human_turn_does_nothing() {
    let state = memory_state(Scripted::moves(&["e7e5"]));
    let mut events = state.notifier.subscribe();
    let id = state.service.create_game().await.unwrap();

    let view = state.service.retry_opponent(&id).await.unwrap();
    assert!(view.is_human_turn());
    assert_no_more_events(&mut events).await;
}

#[tokio::test]
async fn test_human_move_clears_previous_error() {
    let store = Arc::new(MemoryStore::new());
    let state = state_with(store.clone(), Scripted::moves(&[]), &Config::default());
    let id = state.service.create_game().await.unwrap();
    store
        .put(
            &id,
            &StoredGame {
                moves: ["e2e4", "e7e5"].into_iter().collect(),
                selection: Some("g1".to_string()),
                error: Some("SERVER_ERROR".to_string()),
            },
        )
        .await
        .unwrap();

    let view = state.service.handle_click(&id, "f3").await.unwrap();
    assert_eq!(view.moves.len(), 3);
    assert_eq!(view.last_error, None);
}

#[tokio::test]
async fn test_promotion_is_played_as_queen() {
    let store = Arc::new(MemoryStore::new());
    let state = state_with(store.clone(), Scripted::moves(&[]), &Config::default());
    let id = state.service.create_game().await.unwrap();

    // White pawn on g7, g8 empty, rook on h8
    let setup = [
        "h2h4", "g7g5", "h4g5", "g8f6", "g5g6", "a7a6", "g6g7", "a6a5",
    ];
    store
        .put(
            &id,
            &StoredGame {
                moves: setup.into_iter().collect(),
                ..StoredGame::default()
            },
        )
        .await
        .unwrap();

    // Capturing onto the last rank is not auto-queened, so it cancels
    state.service.handle_click(&id, "g7").await.unwrap();
    let cancelled = state.service.handle_click(&id, "h8").await.unwrap();
    assert_eq!(cancelled.moves.len(), 8);
    assert_eq!(cancelled.selection, None);

    state.service.handle_click(&id, "g7").await.unwrap();
    let promoted = state.service.handle_click(&id, "g8").await.unwrap();
    assert_eq!(promoted.moves.last(), Some("g7g8q"));
    let piece = promoted.position.board().piece_at(Square::G8).unwrap();
    assert_eq!(piece.role, shakmaty::Role::Queen);
}

#[tokio::test]
async fn test_black_human_waits_for_opening_move() {
    let config = Config {
        human: Side::Black,
        ..Config::default()
    };
    let state = state_with(Arc::new(MemoryStore::new()), Scripted::moves(&["d2d4"]), &config);
    let mut events = state.notifier.subscribe();
    let id = state.service.create_game().await.unwrap();
    next_event(&mut events).await;

    let view = state.service.get_view(&id).await.unwrap();
    assert_eq!(view.moves.as_slice(), ["d2d4".to_string()]);
    assert!(view.is_human_turn());
    assert!(view.pgn().contains("[White \"AI\"]"));
}

#[tokio::test]
async fn test_non_standard_start_fails_closed() {
    let config = Config {
        initial_fen: "4k3/8/8/8/8/8/4P3/4K3 w - - 0 1".to_string(),
        ..Config::default()
    };
    let store = Arc::new(MemoryStore::new());
    let state = state_with(store.clone(), Scripted::moves(&[]), &config);
    let id = state.service.create_game().await.unwrap();

    let empty = state.service.get_view(&id).await.unwrap();
    assert_eq!(empty.fen(), "4k3/8/8/8/8/8/4P3/4K3 w - - 0 1");

    store
        .put(
            &id,
            &StoredGame {
                moves: ["e2e4"].into_iter().collect(),
                ..StoredGame::default()
            },
        )
        .await
        .unwrap();
    assert!(matches!(
        state.service.get_view(&id).await,
        Err(ServiceError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_checkmate_ends_the_game() {
    // Black mates with the fool's mate reply
    let state = memory_state(Scripted::moves(&["e7e5", "d8h4"]));
    let mut events = state.notifier.subscribe();
    let id = state.service.create_game().await.unwrap();

    for (from, to) in [("f2", "f3"), ("g2", "g4")] {
        state.service.handle_click(&id, from).await.unwrap();
        state.service.handle_click(&id, to).await.unwrap();
        next_event(&mut events).await;
    }

    let view = state.service.get_view(&id).await.unwrap();
    assert_eq!(view.status(), GameStatus::Checkmate);
    assert_eq!(view.displayed_error(), Some(LastError::CheckMate));
    assert_eq!(view.phase(), TurnPhase::GameOver);

    let after = state.service.handle_click(&id, "e2").await.unwrap();
    assert_eq!(after.selection, None);
}
