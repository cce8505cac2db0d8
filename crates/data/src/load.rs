use crate::schema::{
    Catalogs, MinigameCard, OracleCard, SessionConfig, VoteCategory, MINIGAMES_FILE,
    ORACLES_FILE, SESSION_CONFIG_FILE, VOTE_CATEGORIES_FILE,
};
use anyhow::{bail, Context};
use panteon_core::{Card, Pact, MINIGAME_HONOR_ID};
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

const BUILTIN_MINIGAMES: &str = include_str!("../../../assets/minigames.json");
const BUILTIN_ORACLES: &str = include_str!("../../../assets/oracles.json");
const BUILTIN_VOTE_CATEGORIES: &str = include_str!("../../../assets/vote_categories.json");

pub fn load_minigames(dir: &Path) -> anyhow::Result<Vec<MinigameCard>> {
    load_json(dir.join(MINIGAMES_FILE))
}

pub fn load_oracles(dir: &Path) -> anyhow::Result<Vec<OracleCard>> {
    load_json(dir.join(ORACLES_FILE))
}

pub fn load_vote_categories(dir: &Path) -> anyhow::Result<Vec<VoteCategory>> {
    load_json(dir.join(VOTE_CATEGORIES_FILE))
}

/// Reads `session.json` from `dir`, or the default rules when the file is absent.
pub fn load_session_config(dir: &Path) -> anyhow::Result<SessionConfig> {
    let path = dir.join(SESSION_CONFIG_FILE);
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no session config, using defaults");
        return Ok(SessionConfig::default());
    }
    let config: SessionConfig = load_json(&path)?;
    validate_session_config(&config).with_context(|| format!("check {}", path.display()))?;
    Ok(config)
}

pub fn load_catalogs(dir: &Path) -> anyhow::Result<Catalogs> {
    let catalogs = Catalogs {
        minigames: load_minigames(dir)?,
        oracles: load_oracles(dir)?,
        vote_categories: load_vote_categories(dir)?,
    };
    validate_catalogs(&catalogs).with_context(|| format!("check catalogs in {}", dir.display()))?;
    Ok(catalogs)
}

/// The catalogs compiled into the binary.
pub fn builtin_catalogs() -> anyhow::Result<Catalogs> {
    let catalogs = Catalogs {
        minigames: parse_json(BUILTIN_MINIGAMES, MINIGAMES_FILE)?,
        oracles: parse_json(BUILTIN_ORACLES, ORACLES_FILE)?,
        vote_categories: parse_json(BUILTIN_VOTE_CATEGORIES, VOTE_CATEGORIES_FILE)?,
    };
    validate_catalogs(&catalogs).context("check builtin catalogs")?;
    Ok(catalogs)
}

pub fn validate_catalogs(catalogs: &Catalogs) -> anyhow::Result<()> {
    let mut seen = HashSet::new();
    check_cards("minigame", &catalogs.minigames, &mut seen)?;
    check_cards("oracle", &catalogs.oracles, &mut seen)?;

    let mut categories = HashSet::new();
    for category in &catalogs.vote_categories {
        let id = category.id.trim();
        if id.is_empty() {
            bail!("vote category with empty id");
        }
        if id == MINIGAME_HONOR_ID {
            bail!("vote category id {} is reserved", id);
        }
        if category.title.trim().is_empty() {
            bail!("vote category {} has no title", id);
        }
        if !categories.insert(id) {
            bail!("duplicate vote category {}", id);
        }
    }
    Ok(())
}

pub fn validate_session_config(config: &SessionConfig) -> anyhow::Result<()> {
    if config.min_players == 0 || config.min_players > config.max_players {
        bail!(
            "invalid player range {}..={}",
            config.min_players,
            config.max_players
        );
    }
    if config.pact_cap == 0 {
        bail!("pact_cap must be at least 1");
    }
    // Chaotic can deal zero Lokis
    let loyal_seats = config.pact_cap.saturating_mul(Pact::LOYAL.len());
    if loyal_seats < config.max_players {
        bail!(
            "pact_cap {} seats only {} loyal players, max_players is {}",
            config.pact_cap,
            loyal_seats,
            config.max_players
        );
    }
    Ok(())
}

fn check_cards<'a, C>(
    deck: &str,
    cards: &'a [Card<C>],
    seen: &mut HashSet<&'a str>,
) -> anyhow::Result<()> {
    if cards.is_empty() {
        bail!("{} catalog is empty", deck);
    }
    for card in cards {
        if card.id.trim().is_empty() {
            bail!("{} card with empty id", deck);
        }
        if card.title.trim().is_empty() {
            bail!("{} card {} has no title", deck, card.id);
        }
        if !seen.insert(card.id.as_str()) {
            bail!("duplicate card id {} in {} catalog", card.id, deck);
        }
    }
    Ok(())
}

fn load_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> anyhow::Result<T> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let value = serde_json::from_str(&raw).with_context(|| format!("parse {}", path.display()))?;
    Ok(value)
}

fn parse_json<T: DeserializeOwned>(raw: &str, name: &str) -> anyhow::Result<T> {
    serde_json::from_str(raw).with_context(|| format!("parse builtin {name}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use panteon_core::MinigameCategory;

    fn card(id: &str) -> MinigameCard {
        Card {
            id: id.to_string(),
            category: MinigameCategory::Luck,
            title: id.to_uppercase(),
            body: String::new(),
        }
    }

    #[test]
    fn duplicate_card_ids_are_rejected() {
        let catalogs = Catalogs {
            minigames: vec![card("a"), card("a")],
            oracles: Vec::new(),
            vote_categories: Vec::new(),
        };
        let err = validate_catalogs(&catalogs).unwrap_err();
        assert!(err.to_string().contains("duplicate card id a"));
    }

    #[test]
    fn reserved_vote_category_is_rejected() {
        let mut catalogs = builtin_catalogs().unwrap();
        catalogs.vote_categories.push(VoteCategory {
            id: MINIGAME_HONOR_ID.to_string(),
            title: "Otra".to_string(),
        });
        assert!(validate_catalogs(&catalogs).is_err());
    }

    #[test]
    fn inverted_player_range_is_rejected() {
        let config = SessionConfig {
            min_players: 6,
            max_players: 4,
            ..SessionConfig::default()
        };
        assert!(validate_session_config(&config).is_err());
    }
}
