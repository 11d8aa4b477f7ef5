//! Challenge acceptance policy

use super::state::BotStateSnapshot;
use crate::types::{Challenge, DeclineReason};

/// What to do with an incoming challenge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Accept,
    Decline(DeclineReason),
    /// Our own outgoing challenge echoed back; no call is made
    Ignore,
}

/// Decide on a challenge
///
/// Rules are evaluated in order and the first match wins:
/// standby, self-challenge, busy, rated, variant, accept.
pub fn decide(challenge: &Challenge, state: &BotStateSnapshot, own_username: &str) -> Decision {
    if state.standby {
        return Decision::Decline(DeclineReason::Standby);
    }
    if challenge.challenger_name.eq_ignore_ascii_case(own_username) {
        return Decision::Ignore;
    }
    if state.is_playing {
        return Decision::Decline(DeclineReason::Later);
    }
    if challenge.rated {
        return Decision::Decline(DeclineReason::Casual);
    }
    if !challenge.variant.is_supported() {
        return Decision::Decline(DeclineReason::Standard);
    }
    Decision::Accept
}
