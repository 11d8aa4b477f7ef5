//! Bot orchestration: dispatcher, game sessions and matchmaking
pub mod board;
pub mod builder;
pub mod controller;
pub mod game_session;
pub mod gatekeeper;
pub mod lifecycle;
pub mod matchmaking;
pub mod state;
pub mod stats;

pub use builder::BotBuilder;
pub use controller::Bot;
pub use lifecycle::{forward_signals, ControlCommand};
pub use state::{BotState, BotStateSnapshot, GameSlot};
pub use stats::{BotStats, StatsTracker};
