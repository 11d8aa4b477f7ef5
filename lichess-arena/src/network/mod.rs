//! Seam between the bot and the chess server
//!
//! The bot never talks HTTP itself. Everything it needs from the server goes
//! through [`ServerBoundary`], so the orchestration logic can be driven by a
//! real client in production and by an in-memory fake in tests.

pub mod events;

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::Result;
use crate::types::{Account, CandidateOpponent, ChallengeRequest, DeclineReason, GameId};

pub use events::{GameEvent, IncomingEvent};

/// Stream of decoded records; an item error does not end the stream
pub type EventStream<T> = BoxStream<'static, Result<T>>;

/// Operations the bot performs against the chess server
#[async_trait]
pub trait ServerBoundary: Send + Sync {
    /// Account the credentials belong to
    async fn account(&self) -> Result<Account>;

    /// Open the account-wide event stream
    async fn stream_events(&self) -> Result<EventStream<IncomingEvent>>;

    /// Open the stream of a single game
    async fn stream_game(&self, game_id: &GameId) -> Result<EventStream<GameEvent>>;

    async fn accept_challenge(&self, challenge_id: &str) -> Result<()>;

    async fn decline_challenge(&self, challenge_id: &str, reason: DeclineReason) -> Result<()>;

    /// Submit a move in UCI notation
    async fn make_move(&self, game_id: &GameId, uci: &str) -> Result<()>;

    async fn resign_game(&self, game_id: &GameId) -> Result<()>;

    /// Issue an outgoing challenge
    async fn create_challenge(&self, request: &ChallengeRequest) -> Result<()>;

    /// Directory of opponents currently online
    async fn list_online_opponents(&self) -> Result<Vec<CandidateOpponent>>;
}
