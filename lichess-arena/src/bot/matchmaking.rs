//! Periodic outgoing challenges to online opponents
use std::sync::Arc;
use std::time::Duration;

use rand::seq::IndexedRandom;
use tokio::sync::watch;

use super::state::BotState;
use super::stats::StatsTracker;
use crate::config::BotConfig;
use crate::error::{BotError, Result};
use crate::network::ServerBoundary;
use crate::types::{CandidateOpponent, ChallengeRequest};

/// Opponents that may be challenged: not ourselves, rated at most `max_rating`
///
/// Opponents without a rating count as `default_rating`.
pub fn eligible_opponents<'a>(
    candidates: &'a [CandidateOpponent],
    own_username: &str,
    max_rating: u32,
    default_rating: u32,
) -> Vec<&'a CandidateOpponent> {
    candidates
        .iter()
        .filter(|c| !c.id.eq_ignore_ascii_case(own_username))
        .filter(|c| !c.username.eq_ignore_ascii_case(own_username))
        .filter(|c| c.rating_or(default_rating) <= max_rating)
        .collect()
}

/// Background task issuing challenges while the bot is idle
pub struct Matchmaker {
    own_username: String,
    config: BotConfig,
    state: BotState,
    boundary: Arc<dyn ServerBoundary>,
    stats: StatsTracker,
}

impl Matchmaker {
    pub fn new(
        own_username: String,
        config: BotConfig,
        state: BotState,
        boundary: Arc<dyn ServerBoundary>,
        stats: StatsTracker,
    ) -> Self {
        Self {
            own_username,
            config,
            state,
            boundary,
            stats,
        }
    }

    /// Run until standby, termination or shutdown
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!("Matchmaking started");

        let initial = Duration::from_millis(self.config.matchmaking_initial_delay_ms);
        let interval = Duration::from_millis(self.config.matchmaking_interval_ms);
        let backoff = Duration::from_millis(self.config.matchmaking_busy_backoff_ms);

        if !sleep_or_shutdown(initial, &mut shutdown).await {
            tracing::info!("Matchmaking stopped");
            return;
        }

        while self.should_continue() {
            if self.state.is_playing() {
                if !sleep_or_shutdown(backoff, &mut shutdown).await {
                    break;
                }
                continue;
            }

            // A boundary call may hang; shutdown must not wait for it
            let result = tokio::select! {
                result = self.tick() => result,
                _ = shutdown.changed() => break,
            };
            if let Err(e) = result {
                tracing::warn!("Matchmaking error: {}", e);
            }

            if !sleep_or_shutdown(interval, &mut shutdown).await {
                break;
            }
        }

        tracing::info!("Matchmaking stopped");
    }

    fn should_continue(&self) -> bool {
        self.state.is_running() && !self.state.is_standby()
    }

    /// One matchmaking attempt
    ///
    /// Returns the challenged opponent, or None when nobody was challenged.
    pub async fn tick(&self) -> Result<Option<CandidateOpponent>> {
        if self.state.is_playing() || !self.should_continue() {
            return Ok(None);
        }

        let candidates = self.boundary.list_online_opponents().await?;
        let opponent = {
            let eligible = eligible_opponents(
                &candidates,
                &self.own_username,
                self.config.max_opponent_rating,
                self.config.default_opponent_rating,
            );
            // Thread rng is not Send, keep it out of any await
            eligible.choose(&mut rand::rng()).map(|c| (*c).clone())
        };

        let Some(opponent) = opponent else {
            tracing::info!("No eligible opponents");
            return Ok(None);
        };

        // A game may have started while we were listing
        if self.state.is_playing() || !self.should_continue() {
            return Ok(None);
        }

        let variant = self.config.challenge_variant.clone();
        if !variant.is_supported() {
            return Err(BotError::Boundary(format!(
                "refusing to challenge with unsupported variant '{}'",
                variant
            )));
        }

        let request = ChallengeRequest {
            username: opponent.username.clone(),
            rated: false,
            clock_limit_secs: self.config.clock_limit_secs,
            clock_increment_secs: self.config.clock_increment_secs,
            variant,
        };

        tracing::info!(
            "Challenging {} (rating {}) to a {}+{} game",
            opponent.username,
            opponent.rating_or(self.config.default_opponent_rating),
            request.clock_limit_secs,
            request.clock_increment_secs
        );
        self.boundary.create_challenge(&request).await?;
        self.stats.challenge_issued();
        Ok(Some(opponent))
    }
}

/// Sleep for `duration`; false if shutdown was signalled first
async fn sleep_or_shutdown(duration: Duration, shutdown: &mut watch::Receiver<bool>) -> bool {
    if *shutdown.borrow() {
        return false;
    }
    tokio::select! {
        () = tokio::time::sleep(duration) => true,
        changed = shutdown.changed() => changed.is_ok() && !*shutdown.borrow(),
    }
}
