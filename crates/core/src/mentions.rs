//! Vote tallies per honor category and the confirm-before-commit vote flow.

use crate::PlayerId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use thiserror::Error;

/// A vote category players can be mentioned in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteCategory {
    pub id: String,
    pub title: String,
}

/// category id -> player id -> votes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MentionLog {
    categories: BTreeMap<String, BTreeMap<PlayerId, u32>>,
}

impl MentionLog {
    pub fn vote(&mut self, category: &str, player: &PlayerId) -> u32 {
        let count = self
            .categories
            .entry(category.to_string())
            .or_default()
            .entry(player.clone())
            .or_insert(0);
        *count += 1;
        *count
    }

    /// Drops every vote of `category`. Returns whether anything was removed.
    pub fn clear_category(&mut self, category: &str) -> bool {
        self.categories.remove(category).is_some()
    }

    pub fn counts(&self, category: &str) -> Option<&BTreeMap<PlayerId, u32>> {
        self.categories.get(category)
    }

    pub fn votes(&self, category: &str, player: &PlayerId) -> u32 {
        self.counts(category)
            .and_then(|counts| counts.get(player))
            .copied()
            .unwrap_or(0)
    }

    /// Zero for a category nobody has voted in.
    pub fn total(&self, category: &str) -> u32 {
        self.counts(category)
            .map(|counts| counts.values().sum())
            .unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &BTreeMap<PlayerId, u32>)> {
        self.categories.iter()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingVote {
    pub category: String,
    pub player: PlayerId,
    pub confirm_at: Instant,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum VoteError {
    #[error("another vote is waiting for confirmation")]
    Pending,
    #[error("no vote to confirm")]
    NothingPending,
}

/// Holds at most one vote between selection and commit.
#[derive(Debug, Clone)]
pub struct VoteDesk {
    pending: Option<PendingVote>,
    delay: Duration,
}

impl VoteDesk {
    pub fn new(delay: Duration) -> Self {
        Self {
            pending: None,
            delay,
        }
    }

    pub fn pending(&self) -> Option<&PendingVote> {
        self.pending.as_ref()
    }

    pub fn propose(
        &mut self,
        category: &str,
        player: &PlayerId,
        now: Instant,
    ) -> Result<&PendingVote, VoteError> {
        if self.pending.is_some() {
            return Err(VoteError::Pending);
        }
        Ok(&*self.pending.insert(PendingVote {
            category: category.to_string(),
            player: player.clone(),
            confirm_at: now + self.delay,
        }))
    }

    /// Commits the pending vote once its delay has elapsed. `Ok(None)` means
    /// it is still too early and the vote stays pending.
    pub fn confirm(
        &mut self,
        log: &mut MentionLog,
        now: Instant,
    ) -> Result<Option<(PendingVote, u32)>, VoteError> {
        let ready = match &self.pending {
            None => return Err(VoteError::NothingPending),
            Some(vote) => now >= vote.confirm_at,
        };
        if !ready {
            return Ok(None);
        }
        let Some(vote) = self.pending.take() else {
            return Err(VoteError::NothingPending);
        };
        let count = log.vote(&vote.category, &vote.player);
        Ok(Some((vote, count)))
    }

    pub fn cancel(&mut self) -> Option<PendingVote> {
        self.pending.take()
    }
}
