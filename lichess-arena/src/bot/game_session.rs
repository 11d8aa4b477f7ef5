/// Game session state machine
use std::sync::Arc;

use futures::StreamExt;
use shakmaty::Color;
use tokio::sync::watch;

use super::board::{is_my_turn, Board};
use super::state::GameSlot;
use super::stats::StatsTracker;
use crate::engine::MoveEngine;
use crate::error::{BotError, Result};
use crate::network::events::{GameFullRecord, GameStateRecord};
use crate::network::{GameEvent, ServerBoundary};
use crate::types::GameId;

/// Phase of a session, without the game data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Waiting for the initial `gameFull` record
    AwaitingFull,
    /// Board known, reacting to updates
    Active,
    /// Game over; nothing more is processed
    Terminal,
}

/// What the run loop should do after an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStep {
    Continue,
    Finished,
}

/// Data available once the game has been described
#[derive(Debug)]
struct ActiveGame {
    self_color: Color,
    board: Board,
}

#[derive(Debug)]
enum SessionState {
    AwaitingFull,
    Active(ActiveGame),
    Terminal,
}

/// One game, played from its `gameFull` record to a terminal status
pub struct GameSession {
    game_id: GameId,
    own_username: String,
    search_depth: u8,
    state: SessionState,
    boundary: Arc<dyn ServerBoundary>,
    engine: Arc<dyn MoveEngine>,
    stats: StatsTracker,
}

impl GameSession {
    pub fn new(
        game_id: GameId,
        own_username: String,
        search_depth: u8,
        boundary: Arc<dyn ServerBoundary>,
        engine: Arc<dyn MoveEngine>,
        stats: StatsTracker,
    ) -> Self {
        Self {
            game_id,
            own_username,
            search_depth,
            state: SessionState::AwaitingFull,
            boundary,
            engine,
            stats,
        }
    }

    pub fn game_id(&self) -> &GameId {
        &self.game_id
    }

    pub fn phase(&self) -> SessionPhase {
        match self.state {
            SessionState::AwaitingFull => SessionPhase::AwaitingFull,
            SessionState::Active(_) => SessionPhase::Active,
            SessionState::Terminal => SessionPhase::Terminal,
        }
    }

    /// Current board, once the game has been described
    pub fn board(&self) -> Option<&Board> {
        match &self.state {
            SessionState::Active(game) => Some(&game.board),
            _ => None,
        }
    }

    pub fn self_color(&self) -> Option<Color> {
        match &self.state {
            SessionState::Active(game) => Some(game.self_color),
            _ => None,
        }
    }

    /// Whether the bot is the side to move
    pub fn is_my_turn(&self) -> bool {
        match &self.state {
            SessionState::Active(game) => is_my_turn(game.board.turn(), game.self_color),
            _ => false,
        }
    }

    /// Play the game until it ends, the stream closes or shutdown is signalled
    ///
    /// The slot is released when this returns, whatever the reason.
    pub async fn run(mut self, mut slot: GameSlot, mut shutdown: watch::Receiver<bool>) {
        tracing::info!("Playing game: {}", self.game_id);

        let mut stream = match self.boundary.stream_game(&self.game_id).await {
            Ok(stream) => stream,
            Err(e) => {
                tracing::error!("Error in game {}: {}", self.game_id, e);
                slot.release();
                self.stats.game_finished();
                return;
            }
        };

        while !*shutdown.borrow() {
            tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        tracing::info!("Game {} interrupted by shutdown", self.game_id);
                        break;
                    }
                }
                item = stream.next() => match item {
                    None => {
                        tracing::info!("Game {} stream closed", self.game_id);
                        break;
                    }
                    Some(Err(BotError::Serialization(e))) => {
                        tracing::warn!("Game {}: skipping malformed record: {}", self.game_id, e);
                    }
                    Some(Err(e)) => {
                        tracing::error!("Error in game {}: {}", self.game_id, e);
                        break;
                    }
                    Some(Ok(event)) => match self.handle_event(event).await {
                        Ok(SessionStep::Continue) => {}
                        Ok(SessionStep::Finished) => break,
                        Err(e) => {
                            tracing::error!("Error in game {}: {}", self.game_id, e);
                            break;
                        }
                    },
                }
            }
        }

        slot.release();
        self.stats.game_finished();
    }

    /// Apply one record from the game stream
    ///
    /// An error means the stream can no longer be trusted and the session
    /// should end.
    pub async fn handle_event(&mut self, event: GameEvent) -> Result<SessionStep> {
        if matches!(self.state, SessionState::Terminal) {
            return Ok(SessionStep::Finished);
        }

        match event {
            GameEvent::GameFull(full) => {
                self.on_game_full(full)?;
                self.maybe_move().await;
                Ok(SessionStep::Continue)
            }
            GameEvent::GameState(update) => self.on_game_state(update).await,
            GameEvent::ChatLine | GameEvent::Other => Ok(SessionStep::Continue),
        }
    }

    fn on_game_full(&mut self, full: GameFullRecord) -> Result<()> {
        let white_name = full.white.display_name();
        let black_name = full.black.display_name();
        let variant = full.variant();

        tracing::info!(
            "Game {}: {} vs {} ({})",
            self.game_id,
            white_name,
            black_name,
            variant
        );

        let self_color = if white_name.eq_ignore_ascii_case(&self.own_username) {
            Color::White
        } else {
            Color::Black
        };

        let mut board = Board::new(full.initial_fen(), variant)?;
        board.replay(&full.state.moves)?;

        self.state = SessionState::Active(ActiveGame { self_color, board });
        Ok(())
    }

    async fn on_game_state(&mut self, update: GameStateRecord) -> Result<SessionStep> {
        let status = update.status();
        if status.is_terminal() {
            tracing::info!("Game {} ended: {}", self.game_id, status);
            self.state = SessionState::Terminal;
            return Ok(SessionStep::Finished);
        }

        match &mut self.state {
            SessionState::Active(game) => {
                game.board.replay(&update.moves)?;
            }
            _ => {
                tracing::debug!(
                    "Game {} update before game description, ignoring",
                    self.game_id
                );
                return Ok(SessionStep::Continue);
            }
        }

        self.maybe_move().await;
        Ok(SessionStep::Continue)
    }

    /// Request a move if the game is on and it is our turn
    async fn maybe_move(&self) {
        let SessionState::Active(game) = &self.state else {
            return;
        };
        if game.board.is_game_over() || !is_my_turn(game.board.turn(), game.self_color) {
            return;
        }
        self.request_move(&game.board).await;
    }

    /// Ask the engine for a move and submit it
    ///
    /// Failures are logged and dropped; the next update is the only retry.
    async fn request_move(&self, board: &Board) {
        let uci = match self.engine.best_move(board, self.search_depth).await {
            Ok(Some(uci)) => uci,
            Ok(None) => {
                tracing::error!("Game {}: engine returned no move", self.game_id);
                return;
            }
            Err(e) => {
                tracing::error!("Game {}: failed to make move: {}", self.game_id, e);
                return;
            }
        };

        tracing::info!("Game {}: playing move {}", self.game_id, uci);
        match self.boundary.make_move(&self.game_id, &uci).await {
            Ok(()) => self.stats.move_played(),
            Err(e) => {
                tracing::error!(
                    "Game {}: failed to submit move {}: {}",
                    self.game_id,
                    uci,
                    e
                );
            }
        }
    }
}
