use panteon_core::{SessionStore, StoreError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

const STORE_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoreFile {
    version: u32,
    #[serde(default)]
    values: BTreeMap<String, Value>,
}

pub fn default_store_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os("PANTEON_STORE") {
        return Some(PathBuf::from(path));
    }
    std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".panteon_session.json"))
}

/// Key-value store kept in a single JSON file, rewritten on every change.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    values: BTreeMap<String, Value>,
}

impl FileStore {
    /// Opens `path`. A missing file is an empty store; an unreadable one is
    /// reported and then treated as empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = match read_store_file(&path) {
            Ok(values) => values,
            Err(message) => {
                tracing::warn!(path = %path.display(), %message, "starting from an empty store");
                BTreeMap::new()
            }
        };
        Self { path, values }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, key: &str) -> Result<(), StoreError> {
        let payload = StoreFile {
            version: STORE_SCHEMA_VERSION,
            values: self.values.clone(),
        };
        let body = serde_json::to_string_pretty(&payload).map_err(|err| StoreError::Serialize {
            key: key.to_string(),
            message: err.to_string(),
        })?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| write_error(key, &self.path, err))?;
        }
        fs::write(&self.path, body).map_err(|err| write_error(key, &self.path, err))
    }
}

impl SessionStore for FileStore {
    fn get_raw(&self, key: &str) -> Option<String> {
        self.values.get(key).map(Value::to_string)
    }

    fn set_raw(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        let value: Value = serde_json::from_str(&value).map_err(|err| StoreError::Serialize {
            key: key.to_string(),
            message: err.to_string(),
        })?;
        self.values.insert(key.to_string(), value);
        self.flush(key)
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        if self.values.remove(key).is_some() {
            self.flush(key)?;
        }
        Ok(())
    }
}

fn read_store_file(path: &Path) -> Result<BTreeMap<String, Value>, String> {
    if !path.exists() {
        return Ok(BTreeMap::new());
    }
    let body = fs::read_to_string(path).map_err(|err| err.to_string())?;
    let payload: StoreFile = serde_json::from_str(&body).map_err(|err| err.to_string())?;
    if payload.version != STORE_SCHEMA_VERSION {
        return Err(format!(
            "unsupported store version {} (expected {})",
            payload.version, STORE_SCHEMA_VERSION
        ));
    }
    Ok(payload.values)
}

fn write_error(key: &str, path: &Path, err: std::io::Error) -> StoreError {
    StoreError::Write {
        key: key.to_string(),
        message: format!("{}: {}", path.display(), err),
    }
}
