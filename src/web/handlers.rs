use axum::Json;
use axum::extract::{Path, State};
use axum::http::{HeaderName, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde_json::json;

use super::AppState;
use super::dto::{BoardDto, CreatedGame};
use crate::error::ServiceError;
use crate::store::GameId;

/// Header attached to every game response
const NO_STORE: [(HeaderName, &str); 1] = [(header::CACHE_CONTROL, "no-store")];

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = match &self {
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::InvalidSquare(_) => StatusCode::BAD_REQUEST,
            ServiceError::Store(e) => {
                tracing::error!("Store failure: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, NO_STORE, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

fn board(view: &crate::models::GameView) -> Response {
    (NO_STORE, Json(BoardDto::from(view))).into_response()
}

pub async fn create_game(State(state): State<AppState>) -> Result<Response, ServiceError> {
    let id = state.service.create_game().await?;
    Ok((StatusCode::CREATED, NO_STORE, Json(CreatedGame { id })).into_response())
}

pub async fn get_game(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ServiceError> {
    let view = state.service.get_view(&GameId::from(id)).await?;
    tracing::debug!("Rendering game: {}", view.id);
    Ok(board(&view))
}

pub async fn click(
    State(state): State<AppState>,
    Path((id, square)): Path<(String, String)>,
) -> Result<Response, ServiceError> {
    let view = state
        .service
        .handle_click(&GameId::from(id), &square)
        .await?;
    Ok(board(&view))
}

pub async fn retry(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ServiceError> {
    let view = state.service.retry_opponent(&GameId::from(id)).await?;
    Ok(board(&view))
}

pub async fn pgn(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ServiceError> {
    let view = state.service.get_view(&GameId::from(id)).await?;
    Ok((
        NO_STORE,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        view.pgn(),
    )
        .into_response())
}
