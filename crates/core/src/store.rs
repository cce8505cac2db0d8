use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

pub mod keys {
    pub const PLAYERS: &str = "players";
    pub const PHASE: &str = "phase";
    pub const STATS: &str = "stats";
    pub const LOG: &str = "log";
    pub const MINIGAME_HISTORY: &str = "minigame_history";
    pub const RESULTS: &str = "results";
    pub const MINIGAME_DECK_USED: &str = "minigame_deck_used";
    pub const ORACLE_DECK_USED: &str = "oracle_deck_used";

    /// Keys dropped when a new session starts. Deck cycles carry over.
    pub const SESSION: &[&str] = &[PLAYERS, PHASE, STATS, LOG, MINIGAME_HISTORY, RESULTS];
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("serialize {key}: {message}")]
    Serialize { key: String, message: String },
    #[error("write {key}: {message}")]
    Write { key: String, message: String },
}

/// Durable string-keyed storage of JSON values. Every `set` is one
/// unconditional overwrite of one key.
pub trait SessionStore {
    fn get_raw(&self, key: &str) -> Option<String>;
    fn set_raw(&mut self, key: &str, value: String) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

/// Reads `key`. Missing and unparseable values both come back as `None`.
pub fn load<T: DeserializeOwned>(store: &impl SessionStore, key: &str) -> Option<T> {
    let raw = store.get_raw(key)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(key, error = %err, "ignoring corrupt stored value");
            None
        }
    }
}

pub fn save<T: Serialize + ?Sized>(
    store: &mut impl SessionStore,
    key: &str,
    value: &T,
) -> Result<(), StoreError> {
    let body = serde_json::to_string(value).map_err(|err| StoreError::Serialize {
        key: key.to_string(),
        message: err.to_string(),
    })?;
    store.set_raw(key, body)
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemoryStore {
    fn get_raw(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set_raw(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.values.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corrupt_value_reads_as_missing() {
        let mut store = MemoryStore::new();
        store.set_raw(keys::PLAYERS, "{not json".to_string()).unwrap();
        let players: Option<Vec<String>> = load(&store, keys::PLAYERS);
        assert!(players.is_none());
    }

    #[test]
    fn typed_values_survive_a_save() {
        let mut store = MemoryStore::new();
        save(&mut store, keys::ORACLE_DECK_USED, &["o1", "o7"]).unwrap();
        let used: Vec<String> = load(&store, keys::ORACLE_DECK_USED).unwrap();
        assert_eq!(used, vec!["o1".to_string(), "o7".to_string()]);
    }
}
