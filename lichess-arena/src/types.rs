/// Core types for the lichess-arena library

/// Variant keys the bot is willing to play
pub const SUPPORTED_VARIANTS: [&str; 2] = ["standard", "chess960"];

/// Server-assigned game identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GameId(String);

impl GameId {
    pub fn new(id: impl Into<String>) -> Self {
        GameId(id.into())
    }

    /// Get the string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for GameId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Chess variant as reported by the server
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Variant {
    #[default]
    Standard,
    Chess960,
    /// Any other variant key (crazyhouse, atomic, ...)
    Other(String),
}

impl Variant {
    /// Parse a server variant key
    pub fn from_key(key: &str) -> Self {
        match key {
            "standard" => Variant::Standard,
            "chess960" => Variant::Chess960,
            other => Variant::Other(other.to_string()),
        }
    }

    /// Key as used by the server API
    pub fn key(&self) -> &str {
        match self {
            Variant::Standard => "standard",
            Variant::Chess960 => "chess960",
            Variant::Other(key) => key,
        }
    }

    /// Whether the bot accepts games of this variant
    pub fn is_supported(&self) -> bool {
        SUPPORTED_VARIANTS.contains(&self.key())
    }
}

impl std::fmt::Display for Variant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Reason sent to the server when declining a challenge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclineReason {
    /// Bot is in standby and takes no new games
    Standby,
    /// Bot is busy with another game
    Later,
    /// Bot only plays casual games
    Casual,
    /// Bot only plays the supported variants
    Standard,
}

impl DeclineReason {
    /// Reason key as used by the server API
    pub fn as_str(&self) -> &'static str {
        match self {
            DeclineReason::Standby => "standby",
            DeclineReason::Later => "later",
            DeclineReason::Casual => "casual",
            DeclineReason::Standard => "standard",
        }
    }
}

impl std::fmt::Display for DeclineReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Status of a game as reported in game state updates
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameStatus {
    Created,
    Started,
    Mate,
    Resign,
    Stalemate,
    Timeout,
    Draw,
    OutOfTime,
    Aborted,
    /// Any status outside the known vocabulary
    Other(String),
}

impl GameStatus {
    /// Parse a server status string
    pub fn parse(status: &str) -> Self {
        match status {
            "created" => GameStatus::Created,
            "started" => GameStatus::Started,
            "mate" => GameStatus::Mate,
            "resign" => GameStatus::Resign,
            "stalemate" => GameStatus::Stalemate,
            "timeout" => GameStatus::Timeout,
            "draw" => GameStatus::Draw,
            "outoftime" => GameStatus::OutOfTime,
            "aborted" => GameStatus::Aborted,
            other => GameStatus::Other(other.to_string()),
        }
    }

    /// Whether the game is over and the session should end
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            GameStatus::Mate
                | GameStatus::Resign
                | GameStatus::Stalemate
                | GameStatus::Timeout
                | GameStatus::Draw
                | GameStatus::OutOfTime
                | GameStatus::Aborted
        )
    }
}

impl std::fmt::Display for GameStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            GameStatus::Created => "created",
            GameStatus::Started => "started",
            GameStatus::Mate => "mate",
            GameStatus::Resign => "resign",
            GameStatus::Stalemate => "stalemate",
            GameStatus::Timeout => "timeout",
            GameStatus::Draw => "draw",
            GameStatus::OutOfTime => "outoftime",
            GameStatus::Aborted => "aborted",
            GameStatus::Other(s) => s,
        };
        write!(f, "{}", s)
    }
}

/// Incoming challenge, evaluated once by the gatekeeper
#[derive(Debug, Clone)]
pub struct Challenge {
    pub id: String,
    pub challenger_name: String,
    pub variant: Variant,
    pub rated: bool,
    pub speed: String,
}

/// Opponent found in the online directory during matchmaking
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateOpponent {
    /// Lowercase account identifier
    pub id: String,
    /// Display username (falls back to id)
    pub username: String,
    /// Blitz rating if the server reported one
    pub rating: Option<u32>,
}

impl CandidateOpponent {
    /// Rating estimate, assuming `default` when absent
    pub fn rating_or(&self, default: u32) -> u32 {
        self.rating.unwrap_or(default)
    }
}

/// Account the bot is logged in as
#[derive(Debug, Clone)]
pub struct Account {
    pub username: String,
    pub title: Option<String>,
}

impl Account {
    /// Whether the account has been upgraded to a BOT account
    pub fn is_bot(&self) -> bool {
        self.title.as_deref() == Some("BOT")
    }
}

/// Outgoing casual challenge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeRequest {
    pub username: String,
    pub rated: bool,
    pub clock_limit_secs: u32,
    pub clock_increment_secs: u32,
    pub variant: Variant,
}
