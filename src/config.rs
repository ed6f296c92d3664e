//! Runtime configuration from environment variables.
//!
//! Values may come from a `.env` file. Parsing goes through a lookup
//! function so it can be exercised without touching the process
//! environment.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::domain::chess::{self, Side};
use crate::domain::STANDARD_FEN;
use crate::opponent::EngineSettings;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}: {message}")]
    Invalid {
        key: &'static str,
        value: String,
        message: String,
    },

    #[error("{0} must be set when {1}")]
    Missing(&'static str, &'static str),
}

/// Which move selector plays the automated side
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OpponentKind {
    Uci,
    Random,
    Remote,
}

impl FromStr for OpponentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "uci" | "engine" => Ok(OpponentKind::Uci),
            "random" => Ok(OpponentKind::Random),
            "remote" => Ok(OpponentKind::Remote),
            other => Err(format!("expected uci, random or remote, got {other}")),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub bind: SocketAddr,
    /// SQLite URL; `None` keeps games in memory
    pub database_url: Option<String>,
    /// Starting position of every new game
    pub initial_fen: String,
    pub human: Side,
    pub opponent: OpponentKind,
    pub engine: EngineSettings,
    pub opponent_url: Option<String>,
    /// `None` waits for the opponent indefinitely
    pub opponent_timeout: Option<Duration>,
    /// Maximum number of opponent turns computed at once
    pub opponent_workers: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 8080)),
            database_url: None,
            initial_fen: STANDARD_FEN.to_string(),
            human: Side::White,
            opponent: OpponentKind::Random,
            engine: EngineSettings::default(),
            opponent_url: None,
            opponent_timeout: Some(Duration::from_secs(30)),
            opponent_workers: 4,
        }
    }
}

impl Config {
    /// Load from the process environment, reading `.env` first if present
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Config::default();

        let initial_fen = match get("CHESS_INITIAL_FEN") {
            Some(fen) => {
                chess::position_from_fen(&fen).map_err(|e| ConfigError::Invalid {
                    key: "CHESS_INITIAL_FEN",
                    value: fen.clone(),
                    message: e.to_string(),
                })?;
                fen.trim().to_string()
            }
            None => defaults.initial_fen,
        };

        let human = match get("CHESS_HUMAN_SIDE") {
            Some(raw) => Side::parse(&raw).ok_or_else(|| ConfigError::Invalid {
                key: "CHESS_HUMAN_SIDE",
                value: raw.clone(),
                message: "expected white or black".to_string(),
            })?,
            None => defaults.human,
        };

        let opponent = parse_or(&get, "CHESS_OPPONENT", defaults.opponent)?;
        let opponent_url = get("CHESS_OPPONENT_URL");
        if opponent == OpponentKind::Remote && opponent_url.is_none() {
            return Err(ConfigError::Missing(
                "CHESS_OPPONENT_URL",
                "CHESS_OPPONENT is remote",
            ));
        }

        let engine = EngineSettings {
            path: get("CHESS_ENGINE_PATH").unwrap_or(defaults.engine.path),
            movetime_ms: parse_or(&get, "CHESS_ENGINE_MOVETIME_MS", defaults.engine.movetime_ms)?,
            skill: get("CHESS_ENGINE_SKILL")
                .map(|raw| parse_value("CHESS_ENGINE_SKILL", &raw))
                .transpose()?,
        };

        let timeout_secs: u64 = parse_or(&get, "CHESS_OPPONENT_TIMEOUT_SECS", 30)?;
        let opponent_workers: usize =
            parse_or(&get, "CHESS_OPPONENT_WORKERS", defaults.opponent_workers)?;
        if opponent_workers == 0 {
            return Err(ConfigError::Invalid {
                key: "CHESS_OPPONENT_WORKERS",
                value: "0".to_string(),
                message: "at least one worker is required".to_string(),
            });
        }

        Ok(Self {
            bind: parse_or(&get, "CHESS_BIND", defaults.bind)?,
            database_url: get("DATABASE_URL"),
            initial_fen,
            human,
            opponent,
            engine,
            opponent_url,
            opponent_timeout: (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs)),
            opponent_workers,
        })
    }
}

fn parse_value<T>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        value: raw.to_string(),
        message: e.to_string(),
    })
}

fn parse_or<T>(
    get: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match get(key) {
        Some(raw) => parse_value(key, &raw),
        None => Ok(default),
    }
}
