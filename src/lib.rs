//! Stateless human-vs-computer chess core.
//!
//! Every request rebuilds a game from its stored move log, applies one
//! click and persists the result; opponent turns run as background tasks
//! that notify viewers when they finish.

pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod models;
pub mod notify;
pub mod opponent;
pub mod service;
pub mod store;
pub mod web;
