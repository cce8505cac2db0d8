use panteon_core::{CardCategory, MinigameCategory, OracleCategory, SessionConfig};
use panteon_data::{builtin_catalogs, load_catalogs, load_session_config};
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

fn assets_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("assets")
}

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("panteon-data-{}-{}", name, std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).expect("create scratch dir");
    dir
}

#[test]
fn asset_catalogs_have_expected_sizes() {
    let catalogs = load_catalogs(&assets_root()).expect("load catalogs");
    assert_eq!(catalogs.minigames.len(), 30);
    assert_eq!(catalogs.oracles.len(), 14);
    assert!(catalogs.vote_categories.len() >= 2);
}

#[test]
fn builtin_catalogs_match_asset_files() {
    let builtin = builtin_catalogs().expect("builtin catalogs");
    let loaded = load_catalogs(&assets_root()).expect("load catalogs");
    assert_eq!(builtin.minigames, loaded.minigames);
    assert_eq!(builtin.oracles, loaded.oracles);
    assert_eq!(builtin.vote_categories, loaded.vote_categories);
}

#[test]
fn every_category_has_cards() {
    let catalogs = builtin_catalogs().expect("builtin catalogs");
    let minigame: HashSet<MinigameCategory> =
        catalogs.minigames.iter().map(|c| c.category).collect();
    assert_eq!(minigame.len(), MinigameCategory::ALL.len());
    let oracle: HashSet<OracleCategory> = catalogs.oracles.iter().map(|c| c.category).collect();
    assert_eq!(oracle.len(), OracleCategory::ALL.len());
}

#[test]
fn card_ids_are_unique_across_decks() {
    let catalogs = builtin_catalogs().expect("builtin catalogs");
    let mut ids = HashSet::new();
    for id in catalogs
        .minigames
        .iter()
        .map(|c| &c.id)
        .chain(catalogs.oracles.iter().map(|c| &c.id))
    {
        assert!(ids.insert(id.clone()), "duplicate id {id}");
    }
}

#[test]
fn asset_session_config_matches_defaults() {
    let config = load_session_config(&assets_root()).expect("load config");
    assert_eq!(config, SessionConfig::default());
}

#[test]
fn missing_session_config_falls_back_to_defaults() {
    let dir = scratch_dir("no-config");
    let config = load_session_config(&dir).expect("defaults");
    assert_eq!(config, SessionConfig::default());
    let _ = fs::remove_dir_all(dir);
}

#[test]
fn partial_session_config_fills_defaults() {
    let dir = scratch_dir("partial-config");
    fs::write(dir.join("session.json"), r#"{ "draw_cooldown_ms": 0 }"#).expect("write config");
    let config = load_session_config(&dir).expect("load config");
    assert_eq!(config.draw_cooldown_ms, 0);
    assert_eq!(config.pact_cap, 3);
    let _ = fs::remove_dir_all(dir);
}

#[test]
fn pact_cap_too_small_for_a_full_table_is_rejected() {
    let dir = scratch_dir("small-cap");
    fs::write(dir.join("session.json"), r#"{ "pact_cap": 2 }"#).expect("write config");
    let err = load_session_config(&dir).unwrap_err();
    assert!(format!("{err:#}").contains("pact_cap 2"));

    fs::write(
        dir.join("session.json"),
        r#"{ "pact_cap": 2, "max_players": 4 }"#,
    )
    .expect("write config");
    let config = load_session_config(&dir).expect("four seats fit two per pact");
    assert_eq!(config.max_players, 4);
    let _ = fs::remove_dir_all(dir);
}

#[test]
fn empty_catalog_is_rejected() {
    let dir = scratch_dir("empty-oracles");
    for file in ["minigames.json", "vote_categories.json"] {
        fs::copy(assets_root().join(file), dir.join(file)).expect("copy asset");
    }
    fs::write(dir.join("oracles.json"), "[]").expect("write oracles");
    let err = load_catalogs(&dir).unwrap_err();
    assert!(format!("{err:#}").contains("oracle catalog is empty"));
    let _ = fs::remove_dir_all(dir);
}

#[test]
fn unknown_category_fails_to_parse() {
    let dir = scratch_dir("bad-category");
    for file in ["oracles.json", "vote_categories.json"] {
        fs::copy(assets_root().join(file), dir.join(file)).expect("copy asset");
    }
    fs::write(
        dir.join("minigames.json"),
        r#"[{ "id": "x", "category": "dance", "title": "X", "body": "" }]"#,
    )
    .expect("write minigames");
    let err = load_catalogs(&dir).unwrap_err();
    assert!(format!("{err:#}").contains("parse"));
    let _ = fs::remove_dir_all(dir);
}
