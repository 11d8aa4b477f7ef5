mod credentials;
mod lichess;
mod uci;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use lichess::LichessClient;
use lichess_arena::{forward_signals, Bot, BotConfig, EngineSettings, MoveEngine};
use uci::UciEngine;

/// lichess_bot - Lichess bot driven by a UCI engine
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the UCI engine binary
    #[arg(short, long, default_value = "stockfish")]
    engine: PathBuf,

    /// Fallback file holding `api_token: <token>`
    #[arg(long, default_value = credentials::DEFAULT_TOKEN_FILE)]
    token_file: PathBuf,

    /// Lichess server URL
    #[arg(long, default_value = lichess::DEFAULT_BASE_URL)]
    server: String,

    /// Highest opponent rating to challenge
    #[arg(long, default_value_t = 1700)]
    max_rating: u32,

    /// Rating assumed for opponents without one
    #[arg(long, default_value_t = 1500)]
    default_rating: u32,

    /// Search depth per move
    #[arg(short, long, default_value_t = 1)]
    depth: u8,

    /// Engine skill level (0-20)
    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=20))]
    skill: u8,

    /// Engine threads
    #[arg(long, default_value_t = 1)]
    threads: u16,

    /// Engine hash size in MB
    #[arg(long, default_value_t = 1)]
    hash: u32,

    /// Initial clock of outgoing challenges in seconds
    #[arg(long, default_value_t = 60)]
    clock_limit: u32,

    /// Clock increment of outgoing challenges in seconds
    #[arg(long, default_value_t = 0)]
    clock_increment: u32,

    /// Pause between matchmaking attempts in milliseconds
    #[arg(long, default_value_t = 5000)]
    interval_ms: u64,

    /// Only answer challenges, never issue any
    #[arg(long)]
    no_matchmaking: bool,
}

impl Args {
    fn bot_config(&self) -> BotConfig {
        BotConfig::new()
            .with_max_opponent_rating(self.max_rating)
            .with_default_opponent_rating(self.default_rating)
            .with_search_depth(self.depth)
            .with_clock(self.clock_limit, self.clock_increment)
            .with_matchmaking(!self.no_matchmaking)
            .with_matchmaking_interval_ms(self.interval_ms)
            .with_engine_settings(EngineSettings {
                skill_level: self.skill,
                threads: self.threads,
                hash_mb: self.hash,
            })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::fmt::init();

    let config = args.bot_config();

    let token = credentials::resolve_token(&args.token_file).with_context(|| {
        format!(
            "set {} or provide {}",
            credentials::TOKEN_ENV_VAR,
            args.token_file.display()
        )
    })?;
    let client = Arc::new(LichessClient::with_base_url(token, args.server.clone())?);

    let engine = Arc::new(
        UciEngine::start(&args.engine, &config.engine)
            .await
            .context("failed to start the engine")?,
    );

    let mut bot = match Bot::builder(client, engine.clone()).config(config).await {
        Ok(bot) => bot,
        Err(e) => {
            if let Err(quit_error) = engine.quit().await {
                tracing::warn!("Failed to stop engine: {}", quit_error);
            }
            return Err(e).context("failed to log in");
        }
    };

    tracing::info!("Starting bot '{}'", bot.username());

    let signals = tokio::spawn(forward_signals(bot.sender()));

    bot.run().await?;

    signals.abort();
    tracing::info!("Goodbye!");
    Ok(())
}
