//! Opponent that plays a uniformly random legal move.

use async_trait::async_trait;
use rand::seq::SliceRandom;
use shakmaty::{CastlingMode, Position};

use super::{MoveRequest, MoveSelector};

/// Picks any legal move; needs no external engine
#[derive(Clone, Copy, Debug, Default)]
pub struct RandomSelector;

#[async_trait]
impl MoveSelector for RandomSelector {
    async fn select_move(&self, request: &MoveRequest) -> anyhow::Result<Option<String>> {
        let legals = request.position.legal_moves();
        let choice = legals
            .choose(&mut rand::thread_rng())
            .map(|m| m.to_uci(CastlingMode::Standard).to_string());
        Ok(choice)
    }
}
