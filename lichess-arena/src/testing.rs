//! In-memory server and engine used by the unit tests

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;

use crate::bot::board::Board;
use crate::engine::MoveEngine;
use crate::error::{BotError, Result};
use crate::network::{EventStream, GameEvent, IncomingEvent, ServerBoundary};
use crate::types::{Account, CandidateOpponent, ChallengeRequest, DeclineReason, GameId};

/// Outbound call recorded by [`FakeBoundary`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Accept(String),
    Decline(String, DeclineReason),
    Move(GameId, String),
    Resign(GameId),
    Challenge(ChallengeRequest),
}

/// Server fake: streams are fed through flume channels, calls are recorded
pub(crate) struct FakeBoundary {
    account: Account,
    calls: Mutex<Vec<Call>>,
    events: Mutex<Option<flume::Receiver<Result<IncomingEvent>>>>,
    games: Mutex<HashMap<GameId, flume::Receiver<Result<GameEvent>>>>,
    opponents: Mutex<Option<Vec<CandidateOpponent>>>,
    fail_calls: AtomicBool,
    stall_listings: AtomicBool,
    listings: AtomicUsize,
}

impl FakeBoundary {
    /// Fake logged in as `username` with the BOT title
    pub(crate) fn new(username: &str) -> Arc<Self> {
        Self::with_account(Account {
            username: username.to_string(),
            title: Some("BOT".to_string()),
        })
    }

    pub(crate) fn with_account(account: Account) -> Arc<Self> {
        Arc::new(Self {
            account,
            calls: Mutex::new(Vec::new()),
            events: Mutex::new(None),
            games: Mutex::new(HashMap::new()),
            opponents: Mutex::new(Some(Vec::new())),
            fail_calls: AtomicBool::new(false),
            stall_listings: AtomicBool::new(false),
            listings: AtomicUsize::new(0),
        })
    }

    /// Sender feeding the account-wide event stream
    pub(crate) fn event_channel(&self) -> flume::Sender<Result<IncomingEvent>> {
        let (tx, rx) = flume::unbounded();
        *self.events.lock().unwrap() = Some(rx);
        tx
    }

    /// Sender feeding the stream of `game_id`
    pub(crate) fn game_channel(&self, game_id: &str) -> flume::Sender<Result<GameEvent>> {
        let (tx, rx) = flume::unbounded();
        self.games.lock().unwrap().insert(GameId::new(game_id), rx);
        tx
    }

    /// Directory returned by `list_online_opponents`; None makes it fail
    pub(crate) fn set_opponents(&self, opponents: Option<Vec<CandidateOpponent>>) {
        *self.opponents.lock().unwrap() = opponents;
    }

    /// Make every outbound call fail
    pub(crate) fn fail_calls(&self, fail: bool) {
        self.fail_calls.store(fail, Ordering::SeqCst);
    }

    /// Make `list_online_opponents` hang forever, like an unanswered request
    pub(crate) fn stall_listings(&self, stall: bool) {
        self.stall_listings.store(stall, Ordering::SeqCst);
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn listings(&self) -> usize {
        self.listings.load(Ordering::SeqCst)
    }

    /// Wait until at least `count` calls were recorded
    pub(crate) async fn wait_for_calls(&self, count: usize) -> Vec<Call> {
        for _ in 0..200 {
            let calls = self.calls();
            if calls.len() >= count {
                return calls;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("expected {} calls, got {:?}", count, self.calls());
    }

    fn record(&self, call: Call) -> Result<()> {
        self.calls.lock().unwrap().push(call);
        if self.fail_calls.load(Ordering::SeqCst) {
            return Err(BotError::Boundary("injected failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ServerBoundary for FakeBoundary {
    async fn account(&self) -> Result<Account> {
        Ok(self.account.clone())
    }

    async fn stream_events(&self) -> Result<EventStream<IncomingEvent>> {
        let rx = self
            .events
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| BotError::Stream("no event channel".to_string()))?;
        Ok(rx.into_stream().boxed())
    }

    async fn stream_game(&self, game_id: &GameId) -> Result<EventStream<GameEvent>> {
        let rx = self
            .games
            .lock()
            .unwrap()
            .remove(game_id)
            .ok_or_else(|| BotError::Stream(format!("unknown game {}", game_id)))?;
        Ok(rx.into_stream().boxed())
    }

    async fn accept_challenge(&self, challenge_id: &str) -> Result<()> {
        self.record(Call::Accept(challenge_id.to_string()))
    }

    async fn decline_challenge(&self, challenge_id: &str, reason: DeclineReason) -> Result<()> {
        self.record(Call::Decline(challenge_id.to_string(), reason))
    }

    async fn make_move(&self, game_id: &GameId, uci: &str) -> Result<()> {
        self.record(Call::Move(game_id.clone(), uci.to_string()))
    }

    async fn resign_game(&self, game_id: &GameId) -> Result<()> {
        self.record(Call::Resign(game_id.clone()))
    }

    async fn create_challenge(&self, request: &ChallengeRequest) -> Result<()> {
        self.record(Call::Challenge(request.clone()))
    }

    async fn list_online_opponents(&self) -> Result<Vec<CandidateOpponent>> {
        self.listings.fetch_add(1, Ordering::SeqCst);
        if self.stall_listings.load(Ordering::SeqCst) {
            futures::future::pending::<()>().await;
        }
        self.opponents
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| BotError::Boundary("directory unavailable".to_string()))
    }
}

/// Engine fake: replies from a script, counts searches
pub(crate) struct FakeEngine {
    replies: Mutex<VecDeque<Result<Option<String>>>>,
    searches: AtomicUsize,
    quit: AtomicBool,
}

impl FakeEngine {
    /// Engine answering the given replies in order, then "no move"
    pub(crate) fn scripted(replies: Vec<Result<Option<String>>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            searches: AtomicUsize::new(0),
            quit: AtomicBool::new(false),
        })
    }

    /// Engine always answering `uci`
    pub(crate) fn replying(uci: &str) -> Arc<Self> {
        Self::scripted((0..32).map(|_| Ok(Some(uci.to_string()))).collect())
    }

    pub(crate) fn searches(&self) -> usize {
        self.searches.load(Ordering::SeqCst)
    }

    pub(crate) fn has_quit(&self) -> bool {
        self.quit.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MoveEngine for FakeEngine {
    async fn best_move(&self, _board: &Board, _depth: u8) -> Result<Option<String>> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        self.replies.lock().unwrap().pop_front().unwrap_or(Ok(None))
    }

    async fn quit(&self) -> Result<()> {
        self.quit.store(true, Ordering::SeqCst);
        Ok(())
    }
}
