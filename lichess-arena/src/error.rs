/// Error types for the lichess-arena library
use thiserror::Error;

/// Result type alias for bot operations
pub type Result<T> = std::result::Result<T, BotError>;

/// Errors that can occur while running the bot
#[derive(Debug, Error)]
pub enum BotError {
    /// The server rejected our credentials or the account lookup failed
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Account exists but cannot play through the bot API
    #[error("Account '{0}' is not a BOT account")]
    NotBotAccount(String),

    /// Engine process could not be started or configured
    #[error("Engine initialization failed: {0}")]
    EngineInit(String),

    /// No API token in the environment or the fallback file
    #[error("API token not found in environment or config file")]
    CredentialMissing,

    /// Event stream failed or delivered an unreadable record
    #[error("Stream error: {0}")]
    Stream(String),

    /// A call to the server boundary failed
    #[error("Server call failed: {0}")]
    Boundary(String),

    /// Engine failed while searching
    #[error("Engine error: {0}")]
    Engine(String),

    /// Starting position could not be parsed or is not legal
    #[error("Invalid position: {0}")]
    InvalidPosition(String),

    /// A move token in the move list could not be applied
    #[error("Illegal move '{token}': {reason}")]
    IllegalMove {
        /// Offending UCI token
        token: String,
        /// Why it was rejected
        reason: String,
    },

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BotError {
    /// Whether this error must stop the process at startup
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            BotError::Authentication(_)
                | BotError::NotBotAccount(_)
                | BotError::EngineInit(_)
                | BotError::CredentialMissing
        )
    }
}
