use crate::{Pact, RngState};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub String);

impl PlayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn generate(rng: &mut RngState) -> Self {
        Self(format!("p{:012x}", rng.next_u64() & 0xffff_ffff_ffff))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerColor {
    Red,
    Blue,
    Green,
    Yellow,
    Purple,
    Orange,
}

impl PlayerColor {
    pub const ALL: [PlayerColor; 6] = [
        PlayerColor::Red,
        PlayerColor::Blue,
        PlayerColor::Green,
        PlayerColor::Yellow,
        PlayerColor::Purple,
        PlayerColor::Orange,
    ];

    pub fn id(self) -> &'static str {
        match self {
            PlayerColor::Red => "red",
            PlayerColor::Blue => "blue",
            PlayerColor::Green => "green",
            PlayerColor::Yellow => "yellow",
            PlayerColor::Purple => "purple",
            PlayerColor::Orange => "orange",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|color| color.id().eq_ignore_ascii_case(id.trim()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Counter {
    Relics,
    Plagues,
    Powers,
}

impl Counter {
    pub fn from_id(id: &str) -> Option<Self> {
        match id.trim().to_ascii_lowercase().as_str() {
            "relics" | "relic" => Some(Counter::Relics),
            "plagues" | "plague" => Some(Counter::Plagues),
            "powers" | "power" => Some(Counter::Powers),
            _ => None,
        }
    }
}

/// Raw per-player tallies kept during play.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreDetails {
    #[serde(default)]
    pub relics: u32,
    #[serde(default)]
    pub plagues: u32,
    #[serde(default)]
    pub powers: u32,
}

impl ScoreDetails {
    pub fn get(&self, counter: Counter) -> u32 {
        match counter {
            Counter::Relics => self.relics,
            Counter::Plagues => self.plagues,
            Counter::Powers => self.powers,
        }
    }

    /// Applies `delta`, clamping the counter at zero. Returns the new value.
    pub fn adjust(&mut self, counter: Counter, delta: i64) -> u32 {
        let slot = match counter {
            Counter::Relics => &mut self.relics,
            Counter::Plagues => &mut self.plagues,
            Counter::Powers => &mut self.powers,
        };
        let next = (i64::from(*slot) + delta).clamp(0, i64::from(u32::MAX));
        *slot = next as u32;
        *slot
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub color: PlayerColor,
    pub pact: Pact,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score_details: Option<ScoreDetails>,
}

/// A registration form row. `pact` is only read in Strategic mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerEntry {
    pub name: String,
    pub color: PlayerColor,
    pub pact: Option<Pact>,
}

impl PlayerEntry {
    pub fn new(name: impl Into<String>, color: PlayerColor) -> Self {
        Self {
            name: name.into(),
            color,
            pact: None,
        }
    }

    pub fn with_pact(mut self, pact: Pact) -> Self {
        self.pact = Some(pact);
        self
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RosterError {
    #[error("{count} players registered, expected {min} to {max}")]
    PlayerCount { count: usize, min: usize, max: usize },
    #[error("player {0} has an empty name")]
    EmptyName(usize),
    #[error("color {0:?} is already taken")]
    DuplicateColor(PlayerColor),
    #[error("player {0} has no pact selected")]
    MissingPact(String),
    #[error("unknown player {0}")]
    UnknownPlayer(PlayerId),
}

/// The ordered list of registered players.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Roster {
    players: Vec<Player>,
}

impl Roster {
    /// Builds a roster from registration rows and one pact per row.
    pub fn from_entries(
        entries: &[PlayerEntry],
        pacts: &[Pact],
        rng: &mut RngState,
    ) -> Result<Self, RosterError> {
        let mut players = Vec::with_capacity(entries.len());
        for (index, (entry, pact)) in entries.iter().zip(pacts).enumerate() {
            let name = entry.name.trim();
            if name.is_empty() {
                return Err(RosterError::EmptyName(index));
            }
            if players.iter().any(|p: &Player| p.color == entry.color) {
                return Err(RosterError::DuplicateColor(entry.color));
            }
            players.push(Player {
                id: PlayerId::generate(rng),
                name: name.to_string(),
                color: entry.color,
                pact: *pact,
                score: None,
                score_details: None,
            });
        }
        Ok(Self { players })
    }

    pub fn from_players(players: Vec<Player>) -> Self {
        Self { players }
    }

    pub fn validate_count(&self, range: RangeInclusive<usize>) -> Result<(), RosterError> {
        check_count(self.players.len(), range)
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn get(&self, id: &PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| &p.id == id)
    }

    pub fn get_mut(&mut self, id: &PlayerId) -> Result<&mut Player, RosterError> {
        self.players
            .iter_mut()
            .find(|p| &p.id == id)
            .ok_or_else(|| RosterError::UnknownPlayer(id.clone()))
    }

    pub fn contains(&self, id: &PlayerId) -> bool {
        self.get(id).is_some()
    }

    pub fn ids(&self) -> impl Iterator<Item = &PlayerId> {
        self.players.iter().map(|p| &p.id)
    }

    /// Looks a player up by id or, failing that, by case-insensitive name.
    pub fn find(&self, key: &str) -> Option<&Player> {
        self.players
            .iter()
            .find(|p| p.id.as_str() == key)
            .or_else(|| {
                self.players
                    .iter()
                    .find(|p| p.name.eq_ignore_ascii_case(key.trim()))
            })
    }

    pub fn rename(&mut self, id: &PlayerId, name: &str) -> Result<(), RosterError> {
        let index = self.index_of(id)?;
        let name = name.trim();
        if name.is_empty() {
            return Err(RosterError::EmptyName(index));
        }
        self.players[index].name = name.to_string();
        Ok(())
    }

    pub fn recolor(&mut self, id: &PlayerId, color: PlayerColor) -> Result<(), RosterError> {
        let index = self.index_of(id)?;
        if self
            .players
            .iter()
            .enumerate()
            .any(|(i, p)| i != index && p.color == color)
        {
            return Err(RosterError::DuplicateColor(color));
        }
        self.players[index].color = color;
        Ok(())
    }

    pub fn set_pact(&mut self, id: &PlayerId, pact: Pact) -> Result<(), RosterError> {
        self.get_mut(id)?.pact = pact;
        Ok(())
    }

    pub fn remove(&mut self, id: &PlayerId) -> Result<Player, RosterError> {
        let index = self.index_of(id)?;
        Ok(self.players.remove(index))
    }

    fn index_of(&self, id: &PlayerId) -> Result<usize, RosterError> {
        self.players
            .iter()
            .position(|p| &p.id == id)
            .ok_or_else(|| RosterError::UnknownPlayer(id.clone()))
    }
}

pub(crate) fn check_count(count: usize, range: RangeInclusive<usize>) -> Result<(), RosterError> {
    if range.contains(&count) {
        Ok(())
    } else {
        Err(RosterError::PlayerCount {
            count,
            min: *range.start(),
            max: *range.end(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries() -> Vec<PlayerEntry> {
        vec![
            PlayerEntry::new("Ana", PlayerColor::Red),
            PlayerEntry::new("Bruno", PlayerColor::Blue),
            PlayerEntry::new("Carla", PlayerColor::Green),
            PlayerEntry::new("Dario", PlayerColor::Yellow),
        ]
    }

    #[test]
    fn counters_clamp_at_zero() {
        let mut details = ScoreDetails::default();
        assert_eq!(details.adjust(Counter::Plagues, 2), 2);
        assert_eq!(details.adjust(Counter::Plagues, -5), 0);
        assert_eq!(details.adjust(Counter::Relics, -1), 0);
        assert_eq!(details.get(Counter::Powers), 0);
    }

    #[test]
    fn roster_rejects_duplicate_colors() {
        let mut rows = entries();
        rows[3].color = PlayerColor::Red;
        let mut rng = RngState::from_seed(3);
        let err = Roster::from_entries(&rows, &[Pact::Loki; 4], &mut rng).unwrap_err();
        assert_eq!(err, RosterError::DuplicateColor(PlayerColor::Red));
    }

    #[test]
    fn roster_rejects_blank_names() {
        let mut rows = entries();
        rows[1].name = "   ".to_string();
        let mut rng = RngState::from_seed(3);
        let err = Roster::from_entries(&rows, &[Pact::Atenea; 4], &mut rng).unwrap_err();
        assert_eq!(err, RosterError::EmptyName(1));
    }

    #[test]
    fn recolor_to_taken_color_fails() {
        let mut rng = RngState::from_seed(3);
        let mut roster = Roster::from_entries(&entries(), &[Pact::Atenea; 4], &mut rng).unwrap();
        let id = roster.players()[0].id.clone();
        assert_eq!(
            roster.recolor(&id, PlayerColor::Blue),
            Err(RosterError::DuplicateColor(PlayerColor::Blue))
        );
        roster.recolor(&id, PlayerColor::Purple).unwrap();
        assert_eq!(roster.players()[0].color, PlayerColor::Purple);
    }

    #[test]
    fn remove_keeps_remaining_order() {
        let mut rng = RngState::from_seed(4);
        let mut roster = Roster::from_entries(&entries(), &[Pact::Loki; 4], &mut rng).unwrap();
        let bruno = roster.players()[1].id.clone();
        assert_eq!(roster.remove(&bruno).unwrap().name, "Bruno");
        let names: Vec<&str> = roster.players().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Ana", "Carla", "Dario"]);
        assert_eq!(roster.remove(&bruno), Err(RosterError::UnknownPlayer(bruno)));
    }

    #[test]
    fn player_serializes_with_camel_case_details() {
        let player = Player {
            id: PlayerId::new("p1"),
            name: "Ana".to_string(),
            color: PlayerColor::Orange,
            pact: Pact::Longwang,
            score: Some(4),
            score_details: Some(ScoreDetails {
                relics: 1,
                plagues: 0,
                powers: 2,
            }),
        };
        let json = serde_json::to_value(&player).unwrap();
        assert_eq!(json["scoreDetails"]["powers"], 2);
        assert_eq!(json["color"], "orange");
        assert_eq!(json["pact"], "Longwang");
    }

    #[test]
    fn find_matches_id_then_name() {
        let mut rng = RngState::from_seed(9);
        let roster = Roster::from_entries(&entries(), &[Pact::Loki; 4], &mut rng).unwrap();
        let carla = roster.find("carla").unwrap();
        assert_eq!(carla.name, "Carla");
        assert_eq!(roster.find(carla.id.as_str()).unwrap().name, "Carla");
        assert!(roster.find("nadie").is_none());
    }
}
