/// Session controller: event dispatch and task supervision
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};

use super::builder::BotBuilder;
use super::game_session::GameSession;
use super::gatekeeper::{decide, Decision};
use super::lifecycle::ControlCommand;
use super::matchmaking::Matchmaker;
use super::state::BotState;
use super::stats::StatsTracker;
use crate::config::BotConfig;
use crate::engine::MoveEngine;
use crate::error::Result;
use crate::network::{IncomingEvent, ServerBoundary};
use crate::types::{Challenge, GameId};

/// How long games and matchmaking get to notice a shutdown before they are aborted
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// A logged-in bot
///
/// Owns the dispatcher loop, the game session tasks and the matchmaking task.
/// Created through [`Bot::builder`], driven with [`Bot::run`] and controlled
/// with [`ControlCommand`]s sent on [`Bot::sender`].
pub struct Bot {
    username: String,
    config: BotConfig,
    state: BotState,
    boundary: Arc<dyn ServerBoundary>,
    engine: Arc<dyn MoveEngine>,
    control_tx: flume::Sender<ControlCommand>,
    control_rx: flume::Receiver<ControlCommand>,
    shutdown_tx: watch::Sender<bool>,
    stats: StatsTracker,
    sessions: JoinSet<()>,
}

impl Bot {
    /// Start configuring a bot over `boundary` and `engine`
    pub fn builder(boundary: Arc<dyn ServerBoundary>, engine: Arc<dyn MoveEngine>) -> BotBuilder {
        BotBuilder::new(boundary, engine)
    }

    pub(crate) fn new_internal(
        username: String,
        config: BotConfig,
        boundary: Arc<dyn ServerBoundary>,
        engine: Arc<dyn MoveEngine>,
    ) -> Self {
        let (control_tx, control_rx) = flume::unbounded();
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            username,
            config,
            state: BotState::new(),
            boundary,
            engine,
            control_tx,
            control_rx,
            shutdown_tx,
            stats: StatsTracker::new(),
            sessions: JoinSet::new(),
        }
    }

    /// Account name the bot plays as
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Sender for control commands
    pub fn sender(&self) -> flume::Sender<ControlCommand> {
        self.control_tx.clone()
    }

    pub fn state(&self) -> &BotState {
        &self.state
    }

    pub fn stats(&self) -> &StatsTracker {
        &self.stats
    }

    pub fn config(&self) -> &BotConfig {
        &self.config
    }

    /// Dispatch events until terminated or the event stream ends
    ///
    /// Control commands are handled before pending events. On return every
    /// background task has stopped and the engine has been asked to quit.
    pub async fn run(&mut self) -> Result<()> {
        let mut events = match self.boundary.stream_events().await {
            Ok(events) => events,
            Err(e) => {
                tracing::error!("Failed to open event stream: {}", e);
                self.shutdown(None).await;
                return Err(e);
            }
        };

        let matchmaking = self.config.matchmaking_enabled.then(|| {
            let matchmaker = Matchmaker::new(
                self.username.clone(),
                self.config.clone(),
                self.state.clone(),
                self.boundary.clone(),
                self.stats.clone(),
            );
            tokio::spawn(matchmaker.run(self.shutdown_tx.subscribe()))
        });

        tracing::info!("Bot '{}' listening for events", self.username);

        loop {
            tokio::select! {
                biased;
                command = self.control_rx.recv_async() => match command {
                    Ok(ControlCommand::Standby) => {
                        tracing::info!("Entering standby, no new games will be started");
                        self.state.enter_standby();
                    }
                    Ok(ControlCommand::Terminate) | Err(_) => {
                        tracing::info!("Terminating");
                        break;
                    }
                },
                Some(joined) = self.sessions.join_next(), if !self.sessions.is_empty() => {
                    if let Err(e) = joined {
                        tracing::error!("Game session task failed: {}", e);
                    }
                }
                item = events.next() => match item {
                    None => {
                        tracing::info!("Event stream closed");
                        break;
                    }
                    Some(Err(e)) => {
                        tracing::warn!("Skipping event: {}", e);
                    }
                    Some(Ok(event)) => self.handle_event(event).await,
                }
            }
        }

        self.shutdown(matchmaking).await;
        Ok(())
    }

    async fn handle_event(&mut self, event: IncomingEvent) {
        match event {
            IncomingEvent::Challenge { challenge } => {
                self.handle_challenge(challenge.into()).await;
            }
            IncomingEvent::GameStart { game } => match game.game_id() {
                Some(game_id) => self.handle_game_start(game_id).await,
                None => tracing::warn!("gameStart without a game id, ignoring"),
            },
            IncomingEvent::Other => {
                tracing::debug!("Ignoring event");
            }
        }
    }

    async fn handle_challenge(&self, challenge: Challenge) {
        tracing::info!(
            "Challenge {} from {} ({}, {}, rated: {})",
            challenge.id,
            challenge.challenger_name,
            challenge.variant,
            challenge.speed,
            challenge.rated
        );

        match decide(&challenge, &self.state.snapshot(), &self.username) {
            Decision::Accept => match self.boundary.accept_challenge(&challenge.id).await {
                Ok(()) => {
                    tracing::info!("Accepted challenge {}", challenge.id);
                    self.stats.challenge_accepted();
                }
                Err(e) => tracing::warn!("Failed to accept challenge {}: {}", challenge.id, e),
            },
            Decision::Decline(reason) => {
                match self.boundary.decline_challenge(&challenge.id, reason).await {
                    Ok(()) => {
                        tracing::info!("Declined challenge {} ({})", challenge.id, reason);
                        self.stats.challenge_declined();
                    }
                    Err(e) => {
                        tracing::warn!("Failed to decline challenge {}: {}", challenge.id, e)
                    }
                }
            }
            Decision::Ignore => {
                tracing::debug!("Ignoring own challenge {}", challenge.id);
            }
        }
    }

    async fn handle_game_start(&mut self, game_id: GameId) {
        let Some(slot) = self.state.try_claim_game() else {
            tracing::info!("Already playing, resigning game {}", game_id);
            self.stats.game_refused();
            if let Err(e) = self.boundary.resign_game(&game_id).await {
                tracing::warn!("Failed to resign game {}: {}", game_id, e);
            }
            return;
        };

        tracing::info!("Game {} started", game_id);
        self.stats.game_started();
        let session = GameSession::new(
            game_id,
            self.username.clone(),
            self.config.search_depth,
            self.boundary.clone(),
            self.engine.clone(),
            self.stats.clone(),
        );
        self.sessions
            .spawn(session.run(slot, self.shutdown_tx.subscribe()));
    }

    async fn shutdown(&mut self, matchmaking: Option<JoinHandle<()>>) {
        self.state.terminate();
        self.shutdown_tx.send_replace(true);

        if let Some(mut handle) = matchmaking {
            match tokio::time::timeout(SHUTDOWN_GRACE, &mut handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::error!("Matchmaking task failed: {}", e),
                Err(_) => {
                    tracing::warn!("Matchmaking did not stop in time, aborting");
                    handle.abort();
                }
            }
        }

        let drained = tokio::time::timeout(SHUTDOWN_GRACE, async {
            while let Some(joined) = self.sessions.join_next().await {
                if let Err(e) = joined {
                    tracing::error!("Game session task failed: {}", e);
                }
            }
        })
        .await;
        if drained.is_err() {
            tracing::warn!("Game sessions did not stop in time, aborting");
            self.sessions.shutdown().await;
        }

        if let Err(e) = self.engine.quit().await {
            tracing::warn!("Failed to stop engine: {}", e);
        }

        tracing::info!("Bot stopped. {}", self.stats.get_stats());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BotError;
    use crate::network::events::decode_line;
    use crate::network::GameEvent;
    use crate::testing::{Call, FakeBoundary, FakeEngine};
    use crate::types::DeclineReason;

    const ME: &str = "ArenaBot";

    fn challenge(id: &str, from: &str, rated: bool, variant: &str) -> Result<IncomingEvent> {
        let line = format!(
            r#"{{"type":"challenge","challenge":{{"id":"{}","challenger":{{"id":"{}","name":"{}"}},"variant":{{"key":"{}"}},"rated":{},"speed":"bullet"}}}}"#,
            id,
            from.to_lowercase(),
            from,
            variant,
            rated
        );
        Ok(decode_line(&line).unwrap().unwrap())
    }

    fn game_start(id: &str) -> Result<IncomingEvent> {
        let line = format!(r#"{{"type":"gameStart","game":{{"id":"{}"}}}}"#, id);
        Ok(decode_line(&line).unwrap().unwrap())
    }

    fn game_record(line: &str) -> Result<GameEvent> {
        Ok(decode_line(line).unwrap().unwrap())
    }

    async fn spawn_bot(
        boundary: Arc<FakeBoundary>,
        engine: Arc<FakeEngine>,
    ) -> (flume::Sender<ControlCommand>, BotState, tokio::task::JoinHandle<Bot>) {
        let mut bot = Bot::builder(boundary, engine)
            .matchmaking(false)
            .await
            .unwrap();
        let sender = bot.sender();
        let state = bot.state().clone();
        let handle = tokio::spawn(async move {
            bot.run().await.unwrap();
            bot
        });
        (sender, state, handle)
    }

    async fn wait_until(condition: impl Fn() -> bool) {
        for _ in 0..200 {
            if condition() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("condition not reached");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn test_casual_standard_challenge_is_accepted() {
        let boundary = FakeBoundary::new(ME);
        let events = boundary.event_channel();
        let engine = FakeEngine::replying("e2e4");
        let (sender, _state, handle) = spawn_bot(boundary.clone(), engine).await;

        events.send(challenge("c1", "foo", false, "standard")).unwrap();
        let calls = boundary.wait_for_calls(1).await;
        assert_eq!(calls, vec![Call::Accept("c1".to_string())]);

        sender.send(ControlCommand::Terminate).unwrap();
        let bot = handle.await.unwrap();
        assert_eq!(bot.stats().get_stats().challenges_accepted, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn test_decline_reasons_are_sent() {
        let boundary = FakeBoundary::new(ME);
        let events = boundary.event_channel();
        let engine = FakeEngine::replying("e2e4");
        let (sender, _state, handle) = spawn_bot(boundary.clone(), engine).await;

        events.send(challenge("c1", "foo", true, "standard")).unwrap();
        events.send(challenge("c2", "foo", false, "atomic")).unwrap();
        let calls = boundary.wait_for_calls(2).await;
        assert_eq!(
            calls,
            vec![
                Call::Decline("c1".to_string(), DeclineReason::Casual),
                Call::Decline("c2".to_string(), DeclineReason::Standard),
            ]
        );

        sender.send(ControlCommand::Terminate).unwrap();
        let bot = handle.await.unwrap();
        assert_eq!(bot.stats().get_stats().challenges_declined, 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn test_own_challenge_makes_no_call() {
        let boundary = FakeBoundary::new(ME);
        let events = boundary.event_channel();
        let engine = FakeEngine::replying("e2e4");
        let (sender, _state, handle) = spawn_bot(boundary.clone(), engine).await;

        events.send(challenge("mine", "arenabot", false, "standard")).unwrap();
        events.send(challenge("c2", "foo", false, "standard")).unwrap();
        let calls = boundary.wait_for_calls(1).await;
        assert_eq!(calls, vec![Call::Accept("c2".to_string())]);

        sender.send(ControlCommand::Terminate).unwrap();
        handle.await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn test_second_game_start_is_resigned() {
        let boundary = FakeBoundary::new(ME);
        let events = boundary.event_channel();
        // Keep the first game open
        let _g1 = boundary.game_channel("g1");
        let engine = FakeEngine::replying("e2e4");
        let (sender, state, handle) = spawn_bot(boundary.clone(), engine).await;

        events.send(game_start("g1")).unwrap();
        events.send(game_start("g2")).unwrap();
        let calls = boundary.wait_for_calls(1).await;
        assert_eq!(calls, vec![Call::Resign(GameId::new("g2"))]);
        assert!(state.is_playing());

        sender.send(ControlCommand::Terminate).unwrap();
        let bot = handle.await.unwrap();
        let stats = bot.stats().get_stats();
        assert_eq!(stats.games_started, 1);
        assert_eq!(stats.games_refused, 1);
        // The running game was stopped by the shutdown
        assert!(!state.is_playing());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn test_finished_game_frees_the_slot() {
        let boundary = FakeBoundary::new(ME);
        let events = boundary.event_channel();
        let g1 = boundary.game_channel("g1");
        let _g2 = boundary.game_channel("g2");
        let engine = FakeEngine::replying("e2e4");
        let (sender, state, handle) = spawn_bot(boundary.clone(), engine.clone()).await;

        g1.send(game_record(
            r#"{"type":"gameFull","id":"g1","white":{"id":"arenabot","name":"ArenaBot"},"black":{"id":"foo","name":"foo"},"variant":{"key":"standard"},"initialFen":"startpos","state":{"moves":"","status":"started"}}"#,
        ))
        .unwrap();
        g1.send(game_record(r#"{"type":"gameState","moves":"e2e4","status":"resign"}"#))
            .unwrap();
        events.send(game_start("g1")).unwrap();

        // White on move at the start: one move, then the resignation ends the game
        let calls = boundary.wait_for_calls(1).await;
        assert_eq!(calls, vec![Call::Move(GameId::new("g1"), "e2e4".to_string())]);
        wait_until(|| !state.is_playing()).await;

        events.send(game_start("g2")).unwrap();
        wait_until(|| state.is_playing()).await;
        assert_eq!(boundary.calls().len(), 1);

        sender.send(ControlCommand::Terminate).unwrap();
        let bot = handle.await.unwrap();
        let stats = bot.stats().get_stats();
        assert_eq!(stats.games_started, 2);
        assert_eq!(stats.games_finished, 2);
        assert_eq!(stats.moves_played, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn test_standby_declines_later_challenges() {
        let boundary = FakeBoundary::new(ME);
        let events = boundary.event_channel();
        let engine = FakeEngine::replying("e2e4");
        let (sender, state, handle) = spawn_bot(boundary.clone(), engine).await;

        sender.send(ControlCommand::Standby).unwrap();
        wait_until(|| state.is_standby()).await;
        events.send(challenge("c1", "foo", false, "standard")).unwrap();

        let calls = boundary.wait_for_calls(1).await;
        assert_eq!(
            calls,
            vec![Call::Decline("c1".to_string(), DeclineReason::Standby)]
        );
        assert!(state.is_running());

        sender.send(ControlCommand::Terminate).unwrap();
        handle.await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn test_terminate_quits_engine_and_returns() {
        let boundary = FakeBoundary::new(ME);
        let _events = boundary.event_channel();
        let engine = FakeEngine::replying("e2e4");
        let (sender, state, handle) = spawn_bot(boundary.clone(), engine.clone()).await;

        sender.send(ControlCommand::Terminate).unwrap();
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .unwrap()
            .unwrap();

        assert!(engine.has_quit());
        assert!(!state.is_running());
        assert!(state.is_standby());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn test_terminate_during_hanging_matchmaking_call() {
        let boundary = FakeBoundary::new(ME);
        boundary.stall_listings(true);
        let _events = boundary.event_channel();
        let engine = FakeEngine::replying("e2e4");
        let config = BotConfig::default().with_matchmaking_initial_delay_ms(0);
        let mut bot = Bot::builder(boundary.clone(), engine.clone())
            .config(config)
            .await
            .unwrap();
        let sender = bot.sender();
        let handle = tokio::spawn(async move { bot.run().await });

        wait_until(|| boundary.listings() > 0).await;
        tokio::time::sleep(Duration::from_millis(100)).await;
        sender.send(ControlCommand::Terminate).unwrap();

        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("terminate must not wait for the hanging listing")
            .unwrap()
            .unwrap();
        assert!(engine.has_quit());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn test_event_stream_end_stops_dispatcher() {
        let boundary = FakeBoundary::new(ME);
        let events = boundary.event_channel();
        let engine = FakeEngine::replying("e2e4");
        let (_sender, state, handle) = spawn_bot(boundary.clone(), engine.clone()).await;

        drop(events);
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .unwrap()
            .unwrap();
        assert!(engine.has_quit());
        assert!(!state.is_running());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn test_boundary_failures_do_not_halt_dispatcher() {
        let boundary = FakeBoundary::new(ME);
        boundary.fail_calls(true);
        let events = boundary.event_channel();
        let engine = FakeEngine::replying("e2e4");
        let (sender, _state, handle) = spawn_bot(boundary.clone(), engine).await;

        events.send(challenge("c1", "foo", false, "standard")).unwrap();
        events
            .send(Err(BotError::Stream("garbled line".to_string())))
            .unwrap();
        events.send(challenge("c2", "foo", true, "standard")).unwrap();

        let calls = boundary.wait_for_calls(2).await;
        assert_eq!(
            calls,
            vec![
                Call::Accept("c1".to_string()),
                Call::Decline("c2".to_string(), DeclineReason::Casual),
            ]
        );

        sender.send(ControlCommand::Terminate).unwrap();
        let bot = handle.await.unwrap();
        let stats = bot.stats().get_stats();
        assert_eq!(stats.challenges_accepted, 0);
        assert_eq!(stats.challenges_declined, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn test_missing_event_stream_is_error() {
        let boundary = FakeBoundary::new(ME);
        let engine = FakeEngine::replying("e2e4");
        let mut bot = Bot::builder(boundary, engine.clone())
            .matchmaking(false)
            .await
            .unwrap();

        assert!(bot.run().await.is_err());
        assert!(engine.has_quit());
    }
}
