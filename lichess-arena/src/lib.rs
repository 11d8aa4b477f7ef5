//! # lichess-arena
//!
//! Core of a chess bot playing on Lichess through its bot API.
//!
//! ## Overview
//!
//! A [`Bot`] listens to the account-wide event stream, decides on incoming
//! challenges, plays at most one game at a time with an external move engine
//! and, while idle, challenges online opponents of a configurable strength.
//! The server and the engine are reached only through the [`ServerBoundary`]
//! and [`MoveEngine`] traits, so the orchestration can be driven by any client.
//!
//! ## Key Features
//!
//! - Ordered challenge policy (standby, self, busy, rated, variant)
//! - Single game slot claimed with an atomic compare-and-set
//! - Board rebuilt from the full move list on every update
//! - Periodic matchmaking against opponents under a rating ceiling
//! - Standby and terminate commands, wired to SIGUSR1 / SIGTERM / SIGINT
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use lichess_arena::{forward_signals, Bot, BotConfig, MoveEngine, ServerBoundary};
//!
//! async fn play(
//!     boundary: Arc<dyn ServerBoundary>,
//!     engine: Arc<dyn MoveEngine>,
//! ) -> lichess_arena::Result<()> {
//!     let mut bot = Bot::builder(boundary, engine)
//!         .config(BotConfig::default().with_max_opponent_rating(1600))
//!         .await?;
//!
//!     tokio::spawn(forward_signals(bot.sender()));
//!     bot.run().await
//! }
//! ```

// Module declarations
pub mod bot;
pub mod config;
pub mod engine;
pub mod error;
pub mod network;
pub mod types;

#[cfg(test)]
mod testing;

// Re-exports for convenience
pub use bot::board::Board;
pub use bot::{forward_signals, Bot, BotBuilder, BotState, BotStats, ControlCommand};
pub use config::{BotConfig, EngineSettings};
pub use engine::MoveEngine;
pub use error::{BotError, Result};
pub use network::{EventStream, GameEvent, IncomingEvent, ServerBoundary};
pub use types::{
    Account, CandidateOpponent, Challenge, ChallengeRequest, DeclineReason, GameId, GameStatus,
    Variant,
};
