//! Secret role (pact) distribution for a new session.
//!
//! Balanced and Chaotic rosters are generated here; Strategic rosters are
//! chosen by the players at registration and never reach the generator.

use crate::player::check_count;
use crate::{RngState, RosterError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Pact {
    Atenea,
    Loki,
    Longwang,
}

impl Pact {
    pub const ALL: [Pact; 3] = [Pact::Atenea, Pact::Loki, Pact::Longwang];

    /// Pacts that fill the slots Loki does not take.
    pub const LOYAL: [Pact; 2] = [Pact::Atenea, Pact::Longwang];

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|pact| pact.name().eq_ignore_ascii_case(id.trim()))
    }

    pub fn name(self) -> &'static str {
        match self {
            Pact::Atenea => "Atenea",
            Pact::Loki => "Loki",
            Pact::Longwang => "Longwang",
        }
    }
}

impl fmt::Display for Pact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GenerationMode {
    /// Exactly one Loki.
    Balanced,
    /// Zero, one or two Lokis with equal probability.
    Chaotic,
    /// Every player picks their own pact.
    Strategic,
}

impl GenerationMode {
    pub fn from_id(id: &str) -> Option<Self> {
        match id.trim().to_ascii_lowercase().as_str() {
            "balanced" => Some(GenerationMode::Balanced),
            "chaotic" => Some(GenerationMode::Chaotic),
            "strategic" => Some(GenerationMode::Strategic),
            _ => None,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RoleError {
    #[error(transparent)]
    PlayerCount(#[from] RosterError),
    #[error("a cap of {cap} per pact cannot seat {slots} non-Loki players")]
    CapTooSmall { cap: usize, slots: usize },
}

/// Draws pacts for `player_count` seats.
///
/// Returns `Ok(None)` for [`GenerationMode::Strategic`]. The result is
/// positional: index `i` belongs to the `i`-th registered player.
///
/// Both random modes cap each of Atenea and Longwang at `pact_cap` seats.
/// The uncapped fill (any number of the same loyal pact) is not produced.
pub fn generate_pacts(
    player_count: usize,
    mode: GenerationMode,
    players: RangeInclusive<usize>,
    pact_cap: usize,
    rng: &mut RngState,
) -> Result<Option<Vec<Pact>>, RoleError> {
    check_count(player_count, players)?;
    let lokis = match mode {
        GenerationMode::Strategic => return Ok(None),
        GenerationMode::Balanced => 1,
        GenerationMode::Chaotic => rng.index(3),
    }
    .min(player_count);

    let slots = player_count - lokis;
    if slots > pact_cap * Pact::LOYAL.len() {
        return Err(RoleError::CapTooSmall {
            cap: pact_cap,
            slots,
        });
    }

    let mut pacts = vec![Pact::Loki; lokis];
    let mut taken = [0usize; 2];
    for _ in 0..slots {
        let open: Vec<usize> = (0..Pact::LOYAL.len())
            .filter(|&i| taken[i] < pact_cap)
            .collect();
        let pick = open[rng.index(open.len())];
        taken[pick] += 1;
        pacts.push(Pact::LOYAL[pick]);
    }
    rng.shuffle(&mut pacts);
    tracing::debug!(?mode, lokis, atenea = taken[0], longwang = taken[1], "pacts generated");
    Ok(Some(pacts))
}
