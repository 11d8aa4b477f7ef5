//! Configuration for a Bot

use crate::types::Variant;

/// Settings handed to the move engine when it is started
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    /// Engine strength, 0 (weakest) to 20 (strongest)
    pub skill_level: u8,

    /// Number of search threads
    pub threads: u16,

    /// Hash table size in MB
    pub hash_mb: u32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            skill_level: 0,
            threads: 1,
            hash_mb: 1,
        }
    }
}

/// Main configuration for a Bot
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Highest rating an opponent may have to be challenged
    pub max_opponent_rating: u32,

    /// Rating assumed for opponents that report none
    pub default_opponent_rating: u32,

    /// Initial clock for outgoing challenges (in seconds)
    pub clock_limit_secs: u32,

    /// Clock increment for outgoing challenges (in seconds)
    pub clock_increment_secs: u32,

    /// Variant for outgoing challenges
    pub challenge_variant: Variant,

    /// Whether the matchmaking loop runs at all
    pub matchmaking_enabled: bool,

    /// Delay before the first matchmaking tick (in milliseconds)
    pub matchmaking_initial_delay_ms: u64,

    /// Pause between matchmaking ticks (in milliseconds)
    pub matchmaking_interval_ms: u64,

    /// Pause between checks while a game is in progress (in milliseconds)
    pub matchmaking_busy_backoff_ms: u64,

    /// Fixed search depth per requested move
    pub search_depth: u8,

    /// Engine start-up settings
    pub engine: EngineSettings,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            max_opponent_rating: 1700,
            default_opponent_rating: 1500,
            clock_limit_secs: 60,
            clock_increment_secs: 0,
            challenge_variant: Variant::Standard,
            matchmaking_enabled: true,
            matchmaking_initial_delay_ms: 5000,
            matchmaking_interval_ms: 5000,
            matchmaking_busy_backoff_ms: 10000,
            search_depth: 1,
            engine: EngineSettings::default(),
        }
    }
}

impl BotConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum opponent rating
    pub fn with_max_opponent_rating(mut self, rating: u32) -> Self {
        self.max_opponent_rating = rating;
        self
    }

    /// Set the rating assumed when an opponent reports none
    pub fn with_default_opponent_rating(mut self, rating: u32) -> Self {
        self.default_opponent_rating = rating;
        self
    }

    /// Set the clock for outgoing challenges
    pub fn with_clock(mut self, limit_secs: u32, increment_secs: u32) -> Self {
        self.clock_limit_secs = limit_secs;
        self.clock_increment_secs = increment_secs;
        self
    }

    /// Set the variant for outgoing challenges
    pub fn with_challenge_variant(mut self, variant: Variant) -> Self {
        self.challenge_variant = variant;
        self
    }

    /// Enable or disable matchmaking
    pub fn with_matchmaking(mut self, enabled: bool) -> Self {
        self.matchmaking_enabled = enabled;
        self
    }

    /// Set the delay before the first matchmaking tick
    pub fn with_matchmaking_initial_delay_ms(mut self, delay_ms: u64) -> Self {
        self.matchmaking_initial_delay_ms = delay_ms;
        self
    }

    /// Set the pause between matchmaking ticks
    pub fn with_matchmaking_interval_ms(mut self, interval_ms: u64) -> Self {
        self.matchmaking_interval_ms = interval_ms;
        self
    }

    /// Set the pause between checks while playing
    pub fn with_matchmaking_busy_backoff_ms(mut self, backoff_ms: u64) -> Self {
        self.matchmaking_busy_backoff_ms = backoff_ms;
        self
    }

    /// Set the engine search depth
    pub fn with_search_depth(mut self, depth: u8) -> Self {
        self.search_depth = depth;
        self
    }

    /// Set the engine start-up settings
    pub fn with_engine_settings(mut self, engine: EngineSettings) -> Self {
        self.engine = engine;
        self
    }
}
