//! WebSocket feed of refresh events for one game.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::Response;
use tokio::sync::broadcast::{self, error::RecvError};

use super::AppState;
use crate::error::ServiceError;
use crate::notify::{ChessEvent, TopicEvent, game_topic};
use crate::store::GameId;

pub async fn subscribe(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ServiceError> {
    let id = GameId::from(id);
    state.service.get_view(&id).await?;

    let events = state.notifier.subscribe();
    let topic = game_topic(&id);
    Ok(ws.on_upgrade(move |socket| forward(socket, topic, events)))
}

async fn forward(mut socket: WebSocket, topic: String, mut events: broadcast::Receiver<TopicEvent>) {
    tracing::debug!("Viewer subscribed to {}", topic);
    loop {
        tokio::select! {
            received = events.recv() => {
                let event = match received {
                    Ok(TopicEvent { topic: t, event }) if t == topic => event,
                    Ok(_) => continue,
                    // Missed events collapse into one refresh
                    Err(RecvError::Lagged(_)) => ChessEvent::update_board(),
                    Err(RecvError::Closed) => break,
                };
                let Ok(json) = serde_json::to_string(&event) else {
                    continue;
                };
                if socket.send(Message::Text(json.into())).await.is_err() {
                    break;
                }
            }
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            }
        }
    }
    tracing::debug!("Viewer left {}", topic);
}
