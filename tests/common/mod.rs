#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::broadcast;

use chess_ai::app;
use chess_ai::config::Config;
use chess_ai::domain::chess;
use chess_ai::notify::TopicEvent;
use chess_ai::opponent::{MoveRequest, MoveSelector, RequestForm};
use chess_ai::store::{GameStore, MemoryStore};
use chess_ai::web::AppState;

/// Move selector that replays a fixed list of answers
#[derive(Default)]
pub struct Scripted {
    answers: Mutex<VecDeque<anyhow::Result<Option<String>>>>,
    forms: Mutex<Vec<RequestForm>>,
    delay: Duration,
}

impl Scripted {
    pub fn new(answers: Vec<anyhow::Result<Option<String>>>) -> Arc<Self> {
        Arc::new(Self {
            answers: Mutex::new(answers.into()),
            forms: Mutex::new(Vec::new()),
            delay: Duration::ZERO,
        })
    }

    pub fn moves(moves: &[&str]) -> Arc<Self> {
        Self::new(moves.iter().map(|m| Ok(Some(m.to_string()))).collect())
    }

    /// Like [`Scripted::moves`], thinking for `delay` before every answer
    pub fn slow(moves: &[&str], delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            answers: Mutex::new(moves.iter().map(|m| Ok(Some(m.to_string()))).collect()),
            forms: Mutex::new(Vec::new()),
            delay,
        })
    }

    /// Request forms seen so far, in order
    pub fn forms(&self) -> Vec<RequestForm> {
        self.forms.lock().clone()
    }
}

#[async_trait]
impl MoveSelector for Scripted {
    async fn select_move(&self, request: &MoveRequest) -> anyhow::Result<Option<String>> {
        self.forms.lock().push(request.form);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.answers.lock().pop_front().unwrap_or(Ok(None))
    }
}

pub fn state_with(
    store: Arc<dyn GameStore>,
    selector: Arc<dyn MoveSelector>,
    config: &Config,
) -> AppState {
    let start = chess::position_from_fen(&config.initial_fen).unwrap();
    app::assemble(store, selector, start, config)
}

pub fn memory_state(selector: Arc<dyn MoveSelector>) -> AppState {
    state_with(Arc::new(MemoryStore::new()), selector, &Config::default())
}

/// Wait for the next published event
pub async fn next_event(events: &mut broadcast::Receiver<TopicEvent>) -> TopicEvent {
    tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("timed out waiting for a refresh event")
        .expect("event channel closed")
}

/// Assert that nothing else gets published for a short while
pub async fn assert_no_more_events(events: &mut broadcast::Receiver<TopicEvent>) {
    let extra = tokio::time::timeout(Duration::from_millis(200), events.recv()).await;
    assert!(extra.is_err(), "unexpected extra event: {:?}", extra);
}
