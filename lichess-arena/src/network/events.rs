//! Wire records delivered on the server's NDJSON event streams
//!
//! Two streams exist:
//!
//! - the account-wide event stream, carrying `challenge` and `gameStart`
//!   records (and a few others the bot does not care about);
//! - one stream per game, starting with a `gameFull` record followed by
//!   `gameState` updates and `chatLine` noise.
//!
//! Every move list on these records is cumulative: it holds all moves played
//! since the initial position, space separated, in UCI notation.

use serde::Deserialize;

use crate::error::Result;
use crate::types::{Challenge, GameId, GameStatus, Variant};

/// Sentinel used by the server for the standard starting position
pub const STARTPOS: &str = "startpos";

/// Record on the account-wide event stream
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum IncomingEvent {
    Challenge { challenge: ChallengeRecord },
    GameStart { game: GameStartRecord },
    #[serde(other)]
    Other,
}

/// Record on a per-game stream
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum GameEvent {
    GameFull(GameFullRecord),
    GameState(GameStateRecord),
    ChatLine,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChallengeRecord {
    pub id: String,
    pub challenger: PlayerRecord,
    pub variant: VariantRecord,
    #[serde(default)]
    pub rated: bool,
    #[serde(default)]
    pub speed: String,
}

impl From<ChallengeRecord> for Challenge {
    fn from(record: ChallengeRecord) -> Self {
        Challenge {
            challenger_name: record.challenger.display_name(),
            id: record.id,
            variant: Variant::from_key(&record.variant.key),
            rated: record.rated,
            speed: record.speed,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GameStartRecord {
    pub id: Option<String>,
    #[serde(rename = "gameId")]
    pub game_id: Option<String>,
}

impl GameStartRecord {
    /// Game id, preferring `id` over `gameId`
    pub fn game_id(&self) -> Option<GameId> {
        self.id
            .as_deref()
            .or(self.game_id.as_deref())
            .map(GameId::new)
    }
}

/// Player as it appears on challenges and games
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlayerRecord {
    pub id: Option<String>,
    pub name: Option<String>,
}

impl PlayerRecord {
    /// Name used for color matching: `name`, else `id`, else "Anonymous"
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .or_else(|| self.id.clone())
            .unwrap_or_else(|| "Anonymous".to_string())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct VariantRecord {
    pub key: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameFullRecord {
    pub id: Option<String>,
    #[serde(default)]
    pub white: PlayerRecord,
    #[serde(default)]
    pub black: PlayerRecord,
    pub variant: Option<VariantRecord>,
    pub initial_fen: Option<String>,
    pub state: GameStateRecord,
}

impl GameFullRecord {
    /// Variant of the game, standard when the server omits it
    pub fn variant(&self) -> Variant {
        self.variant
            .as_ref()
            .map(|v| Variant::from_key(&v.key))
            .unwrap_or_default()
    }

    /// Literal starting FEN, or None for the standard starting position
    pub fn initial_fen(&self) -> Option<&str> {
        self.initial_fen
            .as_deref()
            .filter(|fen| *fen != STARTPOS)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GameStateRecord {
    #[serde(default)]
    pub moves: String,
    #[serde(default = "default_status")]
    pub status: String,
}

fn default_status() -> String {
    "started".to_string()
}

impl GameStateRecord {
    pub fn status(&self) -> GameStatus {
        GameStatus::parse(&self.status)
    }
}

/// Decode one NDJSON line; blank keep-alive lines yield None
pub fn decode_line<T: serde::de::DeserializeOwned>(line: &str) -> Result<Option<T>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(line)?))
}
