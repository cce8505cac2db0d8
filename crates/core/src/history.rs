//! Minigame results, newest first. Rounds stay dense: the newest record has
//! round `len`, the oldest round 1, whatever gets deleted in between.

use crate::PlayerId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MinigameRecord {
    pub id: String,
    pub round: u32,
    #[serde(default)]
    pub winners: Vec<PlayerId>,
    /// Milliseconds since the Unix epoch.
    #[serde(default)]
    pub timestamp: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MinigameHistory {
    records: Vec<MinigameRecord>,
}

impl MinigameHistory {
    /// Wraps persisted records and renumbers them.
    pub fn from_records(records: Vec<MinigameRecord>) -> Self {
        let mut history = Self { records };
        history.reindex();
        history
    }

    pub fn records(&self) -> &[MinigameRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&MinigameRecord> {
        self.records.iter().find(|record| record.id == id)
    }

    /// Adds the newest record. An empty winner set is a valid result.
    pub fn record(
        &mut self,
        id: String,
        winners: Vec<PlayerId>,
        timestamp: u64,
    ) -> &MinigameRecord {
        let record = MinigameRecord {
            id,
            round: self.records.len() as u32 + 1,
            winners: dedup(winners),
            timestamp,
        };
        self.records.insert(0, record);
        &self.records[0]
    }

    pub fn delete(&mut self, id: &str) -> Option<MinigameRecord> {
        let index = self.records.iter().position(|record| record.id == id)?;
        let removed = self.records.remove(index);
        self.reindex();
        tracing::debug!(
            record = %removed.id,
            round = removed.round,
            left = self.len(),
            "minigame record deleted"
        );
        Some(removed)
    }

    pub fn set_winners(&mut self, id: &str, winners: Vec<PlayerId>) -> bool {
        match self.records.iter_mut().find(|record| record.id == id) {
            Some(record) => {
                record.winners = dedup(winners);
                true
            }
            None => false,
        }
    }

    /// Wins per player, rebuilt from scratch. Every listed player gets an
    /// entry; winners outside `players` are skipped.
    pub fn tallies<'a>(
        &self,
        players: impl IntoIterator<Item = &'a PlayerId>,
    ) -> BTreeMap<PlayerId, u32> {
        let mut tallies: BTreeMap<PlayerId, u32> =
            players.into_iter().map(|id| (id.clone(), 0)).collect();
        for record in &self.records {
            for winner in &record.winners {
                if let Some(count) = tallies.get_mut(winner) {
                    *count += 1;
                }
            }
        }
        tallies
    }

    fn reindex(&mut self) {
        let total = self.records.len() as u32;
        for (index, record) in self.records.iter_mut().enumerate() {
            record.round = total - index as u32;
        }
    }
}

fn dedup(winners: Vec<PlayerId>) -> Vec<PlayerId> {
    let mut out: Vec<PlayerId> = Vec::with_capacity(winners.len());
    for winner in winners {
        if !out.contains(&winner) {
            out.push(winner);
        }
    }
    out
}
