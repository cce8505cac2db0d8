use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::time::Duration;

/// Rule constants for a session. Loaded from `session.json` when present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_min_players")]
    pub min_players: usize,
    #[serde(default = "default_max_players")]
    pub max_players: usize,
    /// Upper bound on how many players may share one non-Loki pact.
    #[serde(default = "default_pact_cap")]
    pub pact_cap: usize,
    #[serde(default = "default_draw_cooldown_ms")]
    pub draw_cooldown_ms: u64,
    #[serde(default = "default_vote_confirm_ms")]
    pub vote_confirm_ms: u64,
}

fn default_min_players() -> usize {
    4
}

fn default_max_players() -> usize {
    6
}

fn default_pact_cap() -> usize {
    3
}

fn default_draw_cooldown_ms() -> u64 {
    1500
}

fn default_vote_confirm_ms() -> u64 {
    800
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            min_players: default_min_players(),
            max_players: default_max_players(),
            pact_cap: default_pact_cap(),
            draw_cooldown_ms: default_draw_cooldown_ms(),
            vote_confirm_ms: default_vote_confirm_ms(),
        }
    }
}

impl SessionConfig {
    pub fn player_range(&self) -> RangeInclusive<usize> {
        self.min_players..=self.max_players
    }

    pub fn draw_cooldown(&self) -> Duration {
        Duration::from_millis(self.draw_cooldown_ms)
    }

    pub fn vote_confirm_delay(&self) -> Duration {
        Duration::from_millis(self.vote_confirm_ms)
    }
}
