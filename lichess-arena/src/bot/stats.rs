//! Statistics tracking for bot activity

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Snapshot of what the bot has done since start
#[derive(Debug, Clone)]
pub struct BotStats {
    pub challenges_accepted: u64,
    pub challenges_declined: u64,
    /// Games started (slot claimed)
    pub games_started: u64,
    /// Games refused because another game was running
    pub games_refused: u64,
    /// Sessions that reached a terminal state or ended otherwise
    pub games_finished: u64,
    pub moves_played: u64,
    /// Outgoing challenges issued by matchmaking
    pub challenges_issued: u64,
    pub start_time: Instant,
}

impl BotStats {
    /// Create a new BotStats instance with zero counters
    pub fn new() -> Self {
        Self {
            challenges_accepted: 0,
            challenges_declined: 0,
            games_started: 0,
            games_refused: 0,
            games_finished: 0,
            moves_played: 0,
            challenges_issued: 0,
            start_time: Instant::now(),
        }
    }
}

impl Default for BotStats {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for BotStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Uptime: {}s, Challenges: {} accepted / {} declined / {} issued, \
             Games: {} started / {} finished / {} refused, Moves: {}",
            self.start_time.elapsed().as_secs(),
            self.challenges_accepted,
            self.challenges_declined,
            self.challenges_issued,
            self.games_started,
            self.games_finished,
            self.games_refused,
            self.moves_played
        )
    }
}

/// Thread-safe statistics tracker
///
/// Uses atomic operations for lock-free concurrent updates
#[derive(Debug, Clone)]
pub struct StatsTracker {
    challenges_accepted: Arc<AtomicU64>,
    challenges_declined: Arc<AtomicU64>,
    games_started: Arc<AtomicU64>,
    games_refused: Arc<AtomicU64>,
    games_finished: Arc<AtomicU64>,
    moves_played: Arc<AtomicU64>,
    challenges_issued: Arc<AtomicU64>,
    start_time: Instant,
}

impl StatsTracker {
    /// Create a new StatsTracker
    pub fn new() -> Self {
        Self {
            challenges_accepted: Arc::new(AtomicU64::new(0)),
            challenges_declined: Arc::new(AtomicU64::new(0)),
            games_started: Arc::new(AtomicU64::new(0)),
            games_refused: Arc::new(AtomicU64::new(0)),
            games_finished: Arc::new(AtomicU64::new(0)),
            moves_played: Arc::new(AtomicU64::new(0)),
            challenges_issued: Arc::new(AtomicU64::new(0)),
            start_time: Instant::now(),
        }
    }

    pub fn challenge_accepted(&self) {
        self.challenges_accepted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn challenge_declined(&self) {
        self.challenges_declined.fetch_add(1, Ordering::Relaxed);
    }

    pub fn game_started(&self) {
        self.games_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn game_refused(&self) {
        self.games_refused.fetch_add(1, Ordering::Relaxed);
    }

    pub fn game_finished(&self) {
        self.games_finished.fetch_add(1, Ordering::Relaxed);
    }

    pub fn move_played(&self) {
        self.moves_played.fetch_add(1, Ordering::Relaxed);
    }

    pub fn challenge_issued(&self) {
        self.challenges_issued.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current statistics snapshot
    pub fn get_stats(&self) -> BotStats {
        BotStats {
            challenges_accepted: self.challenges_accepted.load(Ordering::Relaxed),
            challenges_declined: self.challenges_declined.load(Ordering::Relaxed),
            games_started: self.games_started.load(Ordering::Relaxed),
            games_refused: self.games_refused.load(Ordering::Relaxed),
            games_finished: self.games_finished.load(Ordering::Relaxed),
            moves_played: self.moves_played.load(Ordering::Relaxed),
            challenges_issued: self.challenges_issued.load(Ordering::Relaxed),
            start_time: self.start_time,
        }
    }
}

impl Default for StatsTracker {
    fn default() -> Self {
        Self::new()
    }
}
