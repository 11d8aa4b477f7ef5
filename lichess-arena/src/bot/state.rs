//! Process-wide bot flags shared by every task

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug)]
struct Flags {
    playing: AtomicBool,
    standby: AtomicBool,
    running: AtomicBool,
}

/// Shared handle over the `is_playing`, `standby` and `running` flags
///
/// Cloning is cheap; all clones observe the same flags. The only way to set
/// `is_playing` is [`BotState::try_claim_game`], which makes claiming the
/// single game slot an atomic compare-and-set.
#[derive(Debug, Clone)]
pub struct BotState {
    flags: Arc<Flags>,
}

/// Point-in-time copy of the flags, used for pure decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BotStateSnapshot {
    pub is_playing: bool,
    pub standby: bool,
    pub running: bool,
}

impl BotState {
    /// Fresh state: running, not in standby, no game
    pub fn new() -> Self {
        Self {
            flags: Arc::new(Flags {
                playing: AtomicBool::new(false),
                standby: AtomicBool::new(false),
                running: AtomicBool::new(true),
            }),
        }
    }

    pub fn is_playing(&self) -> bool {
        self.flags.playing.load(Ordering::Acquire)
    }

    pub fn is_standby(&self) -> bool {
        self.flags.standby.load(Ordering::Acquire)
    }

    pub fn is_running(&self) -> bool {
        self.flags.running.load(Ordering::Acquire)
    }

    pub fn snapshot(&self) -> BotStateSnapshot {
        BotStateSnapshot {
            is_playing: self.is_playing(),
            standby: self.is_standby(),
            running: self.is_running(),
        }
    }

    /// Stop accepting and issuing new games
    pub fn enter_standby(&self) {
        self.flags.standby.store(true, Ordering::Release);
    }

    /// Standby plus stop all background loops
    pub fn terminate(&self) {
        self.flags.standby.store(true, Ordering::Release);
        self.flags.running.store(false, Ordering::Release);
    }

    /// Claim the single game slot
    ///
    /// Returns None if a game is already in progress. The returned guard
    /// clears `is_playing` when released or dropped.
    pub fn try_claim_game(&self) -> Option<GameSlot> {
        self.flags
            .playing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| GameSlot {
                state: self.clone(),
                released: false,
            })
    }
}

impl Default for BotState {
    fn default() -> Self {
        Self::new()
    }
}

/// Permit for the one game the bot may play at a time
#[derive(Debug)]
pub struct GameSlot {
    state: BotState,
    released: bool,
}

impl GameSlot {
    /// Give the slot back; later calls and the drop are no-ops
    pub fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.state.flags.playing.store(false, Ordering::Release);
        }
    }

    pub fn is_released(&self) -> bool {
        self.released
    }
}

impl Drop for GameSlot {
    fn drop(&mut self) {
        self.release();
    }
}
