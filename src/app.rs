//! Application setup: wire the store, the opponent and the web layer.

use std::sync::Arc;

use anyhow::Context;

use crate::config::{Config, OpponentKind};
use crate::domain::chess;
use crate::models::Reconstructor;
use crate::notify::BroadcastNotifier;
use crate::opponent::{MoveSelector, OpponentRunner, RandomSelector, RemoteSelector, UciEngineSelector};
use crate::service::GameService;
use crate::store::{GameStore, MemoryStore, SqliteStore};
use crate::web::{self, AppState};

/// Build the shared application state from configuration
pub async fn build(config: &Config) -> anyhow::Result<AppState> {
    let store: Arc<dyn GameStore> = match &config.database_url {
        Some(url) => {
            tracing::info!("Using SQLite store: {}", url);
            Arc::new(SqliteStore::connect(url).await?)
        }
        None => {
            tracing::info!("Using in-memory store");
            Arc::new(MemoryStore::new())
        }
    };

    let selector: Arc<dyn MoveSelector> = match config.opponent {
        OpponentKind::Uci => Arc::new(UciEngineSelector::new(config.engine.clone())),
        OpponentKind::Random => Arc::new(RandomSelector),
        OpponentKind::Remote => {
            let url = config
                .opponent_url
                .clone()
                .context("CHESS_OPPONENT_URL is not set")?;
            Arc::new(RemoteSelector::new(url)?)
        }
    };
    tracing::info!("Opponent: {:?}, human plays {:?}", config.opponent, config.human);

    let start = chess::position_from_fen(&config.initial_fen)?;
    Ok(assemble(store, selector, start, config))
}

/// Assemble state from already-built parts
pub fn assemble(
    store: Arc<dyn GameStore>,
    selector: Arc<dyn MoveSelector>,
    start: shakmaty::Chess,
    config: &Config,
) -> AppState {
    let notifier = BroadcastNotifier::default();
    let games = Reconstructor::new(store, start, config.human);
    let runner = OpponentRunner::new(
        games.clone(),
        selector,
        Arc::new(notifier.clone()),
        config.opponent_workers,
        config.opponent_timeout,
    );
    AppState {
        service: GameService::new(games, runner),
        notifier,
    }
}

/// Run the HTTP server until it stops
pub async fn run(config: Config) -> anyhow::Result<()> {
    let state = build(&config).await?;
    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind))?;
    tracing::info!("Listening on {}", config.bind);

    axum::serve(listener, web::router(state))
        .await
        .context("Server error")
}
