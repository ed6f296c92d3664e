//! Opponent backed by a remote move-suggestion service.
//!
//! The service receives the position as JSON together with a prompt and the
//! JSON schema its answer must follow, and replies with
//! `{"bestMove": "<uci>"}` or `{"bestMove": null}`.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{MoveRequest, MoveSelector, RequestForm};
use crate::domain::chess::Side;

/// Answer expected from the remote service
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub struct BestMoveResponse {
    /// The chosen move in UCI notation (e.g. "e7e5", "e7e8q"), or null when
    /// no move can be suggested
    #[serde(rename = "bestMove")]
    pub best_move: Option<String>,
}

#[derive(Debug, Serialize)]
struct RemoteRequest<'a> {
    prompt: String,
    fen: &'a str,
    pgn: &'a str,
    moves: &'a [String],
    side: Side,
    response_schema: schemars::Schema,
}

/// Asks an HTTP endpoint for the next move
pub struct RemoteSelector {
    client: reqwest::Client,
    url: String,
}

impl RemoteSelector {
    pub fn new(url: impl Into<String>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

/// Instruction text sent along with the position
fn prompt(request: &MoveRequest) -> String {
    let side = match request.side {
        Side::White => "white",
        Side::Black => "black",
    };
    match request.form {
        RequestForm::Position => format!(
            "You are playing chess as {side}. The game started from FEN {} and these UCI moves \
             have been played: {}. Reply with your next legal move in UCI notation as bestMove.",
            request.start_fen,
            if request.moves.is_empty() {
                "(none)".to_string()
            } else {
                request.moves.join(" ")
            }
        ),
        RequestForm::Notation => format!(
            "You are playing chess as {side}. The current position is FEN {} and the game so far \
             is this PGN:\n{}\nReply with your next legal move in UCI notation as bestMove, or \
             null if you cannot find one.",
            request.fen, request.pgn
        ),
    }
}

#[async_trait]
impl MoveSelector for RemoteSelector {
    async fn select_move(&self, request: &MoveRequest) -> anyhow::Result<Option<String>> {
        let body = RemoteRequest {
            prompt: prompt(request),
            fen: &request.fen,
            pgn: &request.pgn,
            moves: &request.moves,
            side: request.side,
            response_schema: schemars::schema_for!(BestMoveResponse),
        };

        tracing::debug!("Requesting {:?} move from {}", request.form, self.url);
        let response: BestMoveResponse = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .context("Failed to reach move service")?
            .error_for_status()
            .context("Move service returned an error status")?
            .json()
            .await
            .context("Failed to parse move service response")?;

        Ok(response.best_move)
    }
}
