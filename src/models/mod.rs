pub mod dispatch;
pub mod game;
pub mod replay;

pub use dispatch::{ClickOutcome, on_click};
pub use game::{GameStatus, GameView, LastError, TurnPhase};
pub use replay::Reconstructor;
