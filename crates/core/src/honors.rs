//! Honors and the final leaderboard.
//!
//! A player earns one honor for holding (or sharing) the top minigame win
//! count, and one more per vote category they top. Categories where nobody
//! has a positive count award nothing. The leaderboard orders by score, then
//! honors, then roster order, and uses competition ranking (1, 1, 3).

use crate::{MentionLog, Player, PlayerId, VoteCategory};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const MINIGAME_HONOR_ID: &str = "minigames";
pub const MINIGAME_HONOR_TITLE: &str = "Maestro de Minijuegos";

/// Aggregates the leaderboard reads. `minigames` is always rebuilt from the
/// minigame history, never edited in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionLog {
    #[serde(default)]
    pub minigames: BTreeMap<PlayerId, u32>,
    #[serde(default)]
    pub mentions: MentionLog,
}

/// Everyone tied for the maximum count, provided that maximum is positive.
pub fn honor_holders(counts: &BTreeMap<PlayerId, u32>) -> Vec<PlayerId> {
    let max = counts.values().copied().max().unwrap_or(0);
    if max == 0 {
        return Vec::new();
    }
    counts
        .iter()
        .filter(|(_, count)| **count == max)
        .map(|(id, _)| id.clone())
        .collect()
}

pub fn honor_counts(players: &[Player], log: &SessionLog) -> BTreeMap<PlayerId, u32> {
    let mut honors: BTreeMap<PlayerId, u32> =
        players.iter().map(|p| (p.id.clone(), 0)).collect();
    let tables = std::iter::once(&log.minigames).chain(log.mentions.iter().map(|(_, c)| c));
    for counts in tables {
        for holder in honor_holders(counts) {
            if let Some(total) = honors.get_mut(&holder) {
                *total += 1;
            }
        }
    }
    honors
}

#[derive(Debug, Clone, PartialEq)]
pub struct Standing {
    pub rank: usize,
    pub honors: u32,
    pub result: Player,
}

impl Standing {
    pub fn score(&self) -> i64 {
        self.result.score.unwrap_or(0)
    }

    fn ties(&self, other: &Standing) -> bool {
        self.score() == other.score() && self.honors == other.honors
    }
}

pub fn rank(results: &[Player], log: &SessionLog) -> Vec<Standing> {
    let honors = honor_counts(results, log);
    let mut standings: Vec<Standing> = results
        .iter()
        .map(|result| Standing {
            rank: 0,
            honors: honors.get(&result.id).copied().unwrap_or(0),
            result: result.clone(),
        })
        .collect();
    // stable: equal keys keep roster order
    standings.sort_by(|a, b| {
        b.score()
            .cmp(&a.score())
            .then_with(|| b.honors.cmp(&a.honors))
    });
    for index in 0..standings.len() {
        standings[index].rank = if index > 0 && standings[index].ties(&standings[index - 1]) {
            standings[index - 1].rank
        } else {
            index + 1
        };
    }
    standings
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Award {
    pub id: String,
    pub title: String,
    pub count: u32,
    pub holders: Vec<PlayerId>,
    /// The holder named in the title: best score, then roster order.
    pub recipient: PlayerId,
}

pub fn titled_recipient(holders: &[PlayerId], results: &[Player]) -> Option<PlayerId> {
    let mut best: Option<&Player> = None;
    for result in results.iter().filter(|r| holders.contains(&r.id)) {
        if best.map_or(true, |b| result.score.unwrap_or(0) > b.score.unwrap_or(0)) {
            best = Some(result);
        }
    }
    best.map(|p| p.id.clone()).or_else(|| holders.first().cloned())
}

/// Every honor with at least one holder, minigames first, then vote
/// categories in catalog order and any unlisted logged category after them.
pub fn awards(results: &[Player], log: &SessionLog, categories: &[VoteCategory]) -> Vec<Award> {
    let mut tables: Vec<(String, String, &BTreeMap<PlayerId, u32>)> = vec![(
        MINIGAME_HONOR_ID.to_string(),
        MINIGAME_HONOR_TITLE.to_string(),
        &log.minigames,
    )];
    for category in categories {
        if let Some(counts) = log.mentions.counts(&category.id) {
            tables.push((category.id.clone(), category.title.clone(), counts));
        }
    }
    for (id, counts) in log.mentions.iter() {
        if !categories.iter().any(|c| &c.id == id) {
            tables.push((id.clone(), id.clone(), counts));
        }
    }

    tables
        .into_iter()
        .filter_map(|(id, title, counts)| {
            let holders = honor_holders(counts);
            let recipient = titled_recipient(&holders, results)?;
            let count = counts.get(&recipient).copied().unwrap_or(0);
            Some(Award {
                id,
                title,
                count,
                holders,
                recipient,
            })
        })
        .collect()
}
