/// UCI engine process adapter
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use lichess_arena::{Board, BotError, EngineSettings, MoveEngine, Result};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, Command};
use tokio::sync::Mutex;

const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);
const SEARCH_TIMEOUT: Duration = Duration::from_secs(30);
const STOP_TIMEOUT: Duration = Duration::from_secs(2);
const QUIT_TIMEOUT: Duration = Duration::from_secs(2);

type EngineWriter = Box<dyn AsyncWrite + Send + Unpin>;
type EngineReader = Box<dyn AsyncRead + Send + Unpin>;

struct EngineIo {
    child: Option<Child>,
    stdin: EngineWriter,
    stdout: Lines<BufReader<EngineReader>>,
    chess960: bool,
    /// Set once a timed out search could not be stopped
    unresponsive: bool,
}

impl EngineIo {
    fn new(stdin: EngineWriter, stdout: EngineReader, child: Option<Child>) -> Self {
        Self {
            child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
            chess960: false,
            unresponsive: false,
        }
    }

    async fn send(&mut self, command: &str) -> std::io::Result<()> {
        tracing::debug!("engine <- {}", command);
        self.stdin.write_all(command.as_bytes()).await?;
        self.stdin.write_all(b"\n").await?;
        self.stdin.flush().await
    }

    /// Read lines until one starts with `prefix`
    async fn read_until(&mut self, prefix: &str) -> Result<String> {
        while let Some(line) = self.stdout.next_line().await? {
            tracing::trace!("engine -> {}", line);
            if line.starts_with(prefix) {
                return Ok(line);
            }
        }
        Err(BotError::Engine("engine closed its output".to_string()))
    }

    async fn set_option(&mut self, name: &str, value: impl std::fmt::Display) -> Result<()> {
        self.send(&format!("setoption name {} value {}", name, value))
            .await?;
        Ok(())
    }

    async fn sync(&mut self) -> Result<()> {
        self.send("isready").await?;
        self.read_until("readyok").await?;
        Ok(())
    }

    async fn search(&mut self, position: &str, depth: u8) -> Result<Option<String>> {
        self.send(position).await?;
        self.send(&format!("go depth {}", depth)).await?;
        let line = self.read_until("bestmove").await?;
        Ok(parse_bestmove(&line))
    }

    /// Stop the running search and consume its `bestmove`
    async fn abandon_search(&mut self, limit: Duration) -> Result<()> {
        tokio::time::timeout(limit, async {
            self.send("stop").await?;
            self.read_until("bestmove").await?;
            Ok::<_, BotError>(())
        })
        .await
        .map_err(|_| BotError::Engine("engine ignored stop".to_string()))?
    }
}

/// Stockfish (or any UCI engine) driven over stdin/stdout
///
/// All I/O goes through one async mutex, so concurrent searches queue up.
pub struct UciEngine {
    io: Mutex<EngineIo>,
    search_timeout: Duration,
    stop_timeout: Duration,
}

impl UciEngine {
    /// Spawn the engine at `path` and configure it
    pub async fn start(path: &Path, settings: &EngineSettings) -> Result<Self> {
        tracing::info!("Initializing engine {}...", path.display());
        tracing::info!("  Skill Level: {} (0=weakest, 20=strongest)", settings.skill_level);
        tracing::info!("  Threads: {}", settings.threads);
        tracing::info!("  Hash: {} MB", settings.hash_mb);

        let mut child = Command::new(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| BotError::EngineInit(format!("{}: {}", path.display(), e)))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| BotError::EngineInit("engine stdin unavailable".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| BotError::EngineInit("engine stdout unavailable".to_string()))?;

        let mut io = EngineIo::new(Box::new(stdin), Box::new(stdout), Some(child));

        tokio::time::timeout(HANDSHAKE_TIMEOUT, async {
            io.send("uci").await?;
            io.read_until("uciok").await?;
            io.set_option("Threads", settings.threads).await?;
            io.set_option("Hash", settings.hash_mb).await?;
            io.set_option("Skill Level", settings.skill_level).await?;
            io.sync().await?;
            Ok::<_, BotError>(())
        })
        .await
        .map_err(|_| BotError::EngineInit("engine handshake timed out".to_string()))?
        .map_err(|e| BotError::EngineInit(e.to_string()))?;

        tracing::info!("Engine initialized successfully");
        Ok(Self::with_io(io, SEARCH_TIMEOUT, STOP_TIMEOUT))
    }

    fn with_io(io: EngineIo, search_timeout: Duration, stop_timeout: Duration) -> Self {
        Self {
            io: Mutex::new(io),
            search_timeout,
            stop_timeout,
        }
    }
}

/// `position` command replaying the board's moves from its initial FEN
fn position_command(board: &Board) -> String {
    let mut command = format!("position fen {}", board.initial_fen());
    if !board.moves().is_empty() {
        command.push_str(" moves ");
        command.push_str(&board.moves().join(" "));
    }
    command
}

/// Move named on a `bestmove` line; None for `(none)` or a bare `bestmove`
fn parse_bestmove(line: &str) -> Option<String> {
    line.split_whitespace()
        .nth(1)
        .filter(|token| *token != "(none)")
        .map(str::to_string)
}

#[async_trait]
impl MoveEngine for UciEngine {
    async fn best_move(&self, board: &Board, depth: u8) -> Result<Option<String>> {
        let mut io = self.io.lock().await;
        if io.unresponsive {
            return Err(BotError::Engine("engine is unresponsive".to_string()));
        }

        if io.chess960 != board.is_chess960() {
            io.set_option("UCI_Chess960", board.is_chess960()).await?;
            io.chess960 = board.is_chess960();
        }

        let position = position_command(board);
        match tokio::time::timeout(self.search_timeout, io.search(&position, depth)).await {
            Ok(result) => result,
            Err(_) => {
                // The late bestmove must not answer the next position
                if let Err(e) = io.abandon_search(self.stop_timeout).await {
                    tracing::error!("Engine search could not be stopped: {}", e);
                    io.unresponsive = true;
                }
                Err(BotError::Engine("search timed out".to_string()))
            }
        }
    }

    async fn quit(&self) -> Result<()> {
        tracing::info!("Closing engine...");
        let mut io = self.io.lock().await;
        if let Err(e) = io.send("quit").await {
            tracing::debug!("Engine did not take quit: {}", e);
        }
        let Some(child) = io.child.as_mut() else {
            return Ok(());
        };
        match tokio::time::timeout(QUIT_TIMEOUT, child.wait()).await {
            Ok(status) => {
                status?;
            }
            Err(_) => {
                tracing::warn!("Engine did not exit, killing it");
                child.kill().await?;
            }
        }
        Ok(())
    }
}
