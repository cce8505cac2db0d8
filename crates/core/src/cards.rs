use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeckKind {
    Minigame,
    Oracle,
}

impl DeckKind {
    pub fn from_id(id: &str) -> Option<Self> {
        match id.trim().to_ascii_lowercase().as_str() {
            "minigame" | "minigames" => Some(DeckKind::Minigame),
            "oracle" | "oracles" => Some(DeckKind::Oracle),
            _ => None,
        }
    }
}

impl fmt::Display for DeckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeckKind::Minigame => f.write_str("minigame"),
            DeckKind::Oracle => f.write_str("oracle"),
        }
    }
}

/// Category enum of one catalog.
pub trait CardCategory: Copy + Eq + Hash + fmt::Debug + 'static {
    const DECK: DeckKind;
    const ALL: &'static [Self];

    fn id(self) -> &'static str;

    fn from_id(id: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|category| category.id().eq_ignore_ascii_case(id.trim()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MinigameCategory {
    Skill,
    Social,
    Luck,
}

impl CardCategory for MinigameCategory {
    const DECK: DeckKind = DeckKind::Minigame;
    const ALL: &'static [Self] = &[
        MinigameCategory::Skill,
        MinigameCategory::Social,
        MinigameCategory::Luck,
    ];

    fn id(self) -> &'static str {
        match self {
            MinigameCategory::Skill => "skill",
            MinigameCategory::Social => "social",
            MinigameCategory::Luck => "luck",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OracleCategory {
    Blessing,
    Curse,
    Prophecy,
}

impl CardCategory for OracleCategory {
    const DECK: DeckKind = DeckKind::Oracle;
    const ALL: &'static [Self] = &[
        OracleCategory::Blessing,
        OracleCategory::Curse,
        OracleCategory::Prophecy,
    ];

    fn id(self) -> &'static str {
        match self {
            OracleCategory::Blessing => "blessing",
            OracleCategory::Curse => "curse",
            OracleCategory::Prophecy => "prophecy",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card<C> {
    pub id: String,
    pub category: C,
    pub title: String,
    pub body: String,
}

pub type MinigameCard = Card<MinigameCategory>;
pub type OracleCard = Card<OracleCategory>;
