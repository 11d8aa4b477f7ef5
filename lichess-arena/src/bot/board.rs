//! Board reconstruction from cumulative move lists
//!
//! The board is never patched move by move. Every update replays the full,
//! authoritative move list onto the initial position, so duplicated or
//! reordered updates from the server cannot leave a stale board behind.

use shakmaty::fen::Fen;
use shakmaty::uci::UciMove;
use shakmaty::{CastlingMode, Chess, Color, Position};

use crate::error::{BotError, Result};
use crate::types::Variant;

/// FEN of the standard starting position
pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Position derived from an initial FEN and a cumulative move list
#[derive(Debug, Clone)]
pub struct Board {
    variant: Variant,
    initial_fen: String,
    initial: Chess,
    position: Chess,
    moves: Vec<String>,
}

impl Board {
    /// Board at the initial position; None means the standard start
    pub fn new(initial_fen: Option<&str>, variant: Variant) -> Result<Self> {
        let initial_fen = initial_fen.unwrap_or(STARTING_FEN).to_string();
        let fen: Fen = initial_fen
            .parse()
            .map_err(|e| BotError::InvalidPosition(format!("{}: {}", initial_fen, e)))?;
        let initial: Chess = fen
            .into_position(castling_mode(&variant))
            .map_err(|e| BotError::InvalidPosition(format!("{}: {}", initial_fen, e)))?;

        Ok(Self {
            variant,
            initial_fen,
            position: initial.clone(),
            initial,
            moves: Vec::new(),
        })
    }

    /// Replace the move list and rederive the position from scratch
    ///
    /// On error the board is left unchanged.
    pub fn replay(&mut self, moves: &str) -> Result<()> {
        let mode = castling_mode(&self.variant);
        let mut position = self.initial.clone();
        let mut applied = Vec::new();

        for token in moves.split_whitespace() {
            let uci: UciMove = token.parse().map_err(|e| BotError::IllegalMove {
                token: token.to_string(),
                reason: format!("{}", e),
            })?;
            let m = uci.to_move(&position).map_err(|e| BotError::IllegalMove {
                token: token.to_string(),
                reason: format!("{}", e),
            })?;
            position.play_unchecked(&m);
            // Keep the notation of the castling mode in use
            applied.push(UciMove::from_move(&m, mode).to_string());
        }

        self.position = position;
        self.moves = applied;
        Ok(())
    }

    /// Side to move
    pub fn turn(&self) -> Color {
        self.position.turn()
    }

    /// Checkmate, stalemate or another rule ends the game here
    pub fn is_game_over(&self) -> bool {
        self.position.is_game_over()
    }

    pub fn position(&self) -> &Chess {
        &self.position
    }

    pub fn initial_fen(&self) -> &str {
        &self.initial_fen
    }

    /// Applied moves in UCI notation
    pub fn moves(&self) -> &[String] {
        &self.moves
    }

    pub fn is_chess960(&self) -> bool {
        self.variant == Variant::Chess960
    }
}

fn castling_mode(variant: &Variant) -> CastlingMode {
    match variant {
        Variant::Chess960 => CastlingMode::Chess960,
        _ => CastlingMode::Standard,
    }
}

/// Whether `self_color` is the side to move
pub fn is_my_turn(board_turn: Color, self_color: Color) -> bool {
    (board_turn == Color::White && self_color == Color::White)
        || (board_turn == Color::Black && self_color == Color::Black)
}
