/// Builder resolving into a logged-in bot
use std::future::{Future, IntoFuture};
use std::pin::Pin;
use std::sync::Arc;

use super::controller::Bot;
use crate::config::BotConfig;
use crate::engine::MoveEngine;
use crate::error::{BotError, Result};
use crate::network::ServerBoundary;

/// Builder for a [`Bot`]
///
/// Awaiting the builder looks up the account behind the credentials and
/// fails unless it is a BOT account.
#[must_use = "a BotBuilder does nothing unless it is awaited"]
pub struct BotBuilder {
    boundary: Arc<dyn ServerBoundary>,
    engine: Arc<dyn MoveEngine>,
    config: BotConfig,
}

impl BotBuilder {
    pub(crate) fn new(boundary: Arc<dyn ServerBoundary>, engine: Arc<dyn MoveEngine>) -> Self {
        Self {
            boundary,
            engine,
            config: BotConfig::default(),
        }
    }

    /// Replace the whole configuration
    pub fn config(mut self, config: BotConfig) -> Self {
        self.config = config;
        self
    }

    /// Enable or disable matchmaking
    pub fn matchmaking(mut self, enabled: bool) -> Self {
        self.config.matchmaking_enabled = enabled;
        self
    }

    /// Set the engine search depth
    pub fn search_depth(mut self, depth: u8) -> Self {
        self.config.search_depth = depth;
        self
    }

    /// Set the maximum opponent rating for matchmaking
    pub fn max_opponent_rating(mut self, rating: u32) -> Self {
        self.config.max_opponent_rating = rating;
        self
    }

    async fn connect(self) -> Result<Bot> {
        let account = match self.boundary.account().await {
            Ok(account) => account,
            Err(e @ BotError::Authentication(_)) => return Err(e),
            Err(e) => return Err(BotError::Authentication(e.to_string())),
        };

        tracing::info!("Logged in as {}", account.username);

        if !account.is_bot() {
            tracing::warn!("Account '{}' is not a BOT account", account.username);
            tracing::warn!("Upgrade it at https://lichess.org/api#operation/botAccountUpgrade");
            return Err(BotError::NotBotAccount(account.username));
        }

        Ok(Bot::new_internal(
            account.username,
            self.config,
            self.boundary,
            self.engine,
        ))
    }
}

impl IntoFuture for BotBuilder {
    type Output = Result<Bot>;
    type IntoFuture = Pin<Box<dyn Future<Output = Self::Output> + Send>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(self.connect())
    }
}
