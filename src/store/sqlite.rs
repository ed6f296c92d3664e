//! SQLite-backed store.

use std::str::FromStr;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Row, Sqlite};

use super::{GameId, GameStore, MoveLog, StoredGame};
use crate::error::StoreError;

const SELECTION_FIELD: &str = "current";
const ERROR_FIELD: &str = "error";

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS games (
        id TEXT PRIMARY KEY,
        created_at DATETIME DEFAULT CURRENT_TIMESTAMP
    );",
    "CREATE TABLE IF NOT EXISTS game_moves (
        game_id TEXT NOT NULL,
        ply INTEGER NOT NULL,
        uci TEXT NOT NULL,
        PRIMARY KEY (game_id, ply)
    );",
    "CREATE TABLE IF NOT EXISTS game_fields (
        game_id TEXT NOT NULL,
        field TEXT NOT NULL,
        value TEXT NOT NULL,
        PRIMARY KEY (game_id, field)
    );",
];

/// Games persisted in SQLite tables
#[derive(Clone)]
pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

impl SqliteStore {
    /// Open (creating if missing) the database at `url` and ensure the schema
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);

        // Every connection to an in-memory database sees its own database
        let in_memory = url.contains(":memory:");
        let mut pool_options = SqlitePoolOptions::new().max_connections(if in_memory { 1 } else { 5 });
        if in_memory {
            pool_options = pool_options.idle_timeout(None).max_lifetime(None);
        }

        let pool = pool_options.connect_with(options).await?;
        Self::with_pool(pool).await
    }

    /// Use an existing pool, creating the tables if needed
    pub async fn with_pool(pool: Pool<Sqlite>) -> Result<Self, StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&pool).await?;
        }
        Ok(Self { pool })
    }
}

#[async_trait]
impl GameStore for SqliteStore {
    async fn create(&self) -> Result<GameId, StoreError> {
        let id = GameId::generate();
        tracing::trace!("Creating new game: {}", id);
        sqlx::query("INSERT INTO games (id) VALUES ($1)")
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;
        Ok(id)
    }

    async fn get(&self, id: &GameId) -> Result<Option<StoredGame>, StoreError> {
        let known = sqlx::query("SELECT id FROM games WHERE id = $1")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;
        if known.is_none() {
            return Ok(None);
        }

        let moves = sqlx::query("SELECT uci FROM game_moves WHERE game_id = $1 ORDER BY ply")
            .bind(id.as_str())
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(|row| row.try_get::<String, _>("uci"))
            .collect::<Result<Vec<_>, _>>()?;

        let mut game = StoredGame {
            moves: MoveLog::from(moves),
            ..StoredGame::default()
        };
        let fields = sqlx::query("SELECT field, value FROM game_fields WHERE game_id = $1")
            .bind(id.as_str())
            .fetch_all(&self.pool)
            .await?;
        for row in fields {
            let field: String = row.try_get("field")?;
            let value: String = row.try_get("value")?;
            match field.as_str() {
                SELECTION_FIELD => game.selection = Some(value),
                ERROR_FIELD => game.error = Some(value),
                other => {
                    return Err(StoreError::Corrupt {
                        key: format!("{}/{}", id, other),
                        message: "unknown field".to_string(),
                    });
                }
            }
        }
        Ok(Some(game))
    }

    async fn put(&self, id: &GameId, game: &StoredGame) -> Result<(), StoreError> {
        tracing::trace!("Saving game {}: {:?}", id, game);
        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT OR IGNORE INTO games (id) VALUES ($1)")
            .bind(id.as_str())
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM game_fields WHERE game_id = $1")
            .bind(id.as_str())
            .execute(&mut *tx)
            .await?;
        for (field, value) in [(SELECTION_FIELD, &game.selection), (ERROR_FIELD, &game.error)] {
            if let Some(value) = value {
                sqlx::query("INSERT INTO game_fields (game_id, field, value) VALUES ($1, $2, $3)")
                    .bind(id.as_str())
                    .bind(field)
                    .bind(value)
                    .execute(&mut *tx)
                    .await?;
            }
        }

        sqlx::query("DELETE FROM game_moves WHERE game_id = $1")
            .bind(id.as_str())
            .execute(&mut *tx)
            .await?;
        for (ply, uci) in game.moves.iter().enumerate() {
            sqlx::query("INSERT INTO game_moves (game_id, ply, uci) VALUES ($1, $2, $3)")
                .bind(id.as_str())
                .bind(ply as i64)
                .bind(uci)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
