//! Move engine integration

use async_trait::async_trait;

use crate::bot::board::Board;
use crate::error::Result;

/// External move generator, treated as a black box
///
/// One instance is shared by the whole process. Implementations must tolerate
/// concurrent calls even though the single game slot normally serializes them.
#[async_trait]
pub trait MoveEngine: Send + Sync {
    /// Search the position on `board` to `depth` plies
    ///
    /// Returns the chosen move in UCI notation, or None when the engine
    /// produced no move.
    async fn best_move(&self, board: &Board, depth: u8) -> Result<Option<String>>;

    /// Release the engine's underlying resource
    async fn quit(&self) -> Result<()>;
}
