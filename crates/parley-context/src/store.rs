//! Key-value persistence abstraction.
//!
//! Callers must treat a failing store as an absent one: log, fall back
//! to in-memory state, never abort a turn over it.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use serde_json::Value;

use parley_core::{CoreError, Result};

pub trait KvStore: Send + Sync {
    fn get(&self, key: &str) -> Option<Value>;
    fn set(&self, key: &str, value: Value) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// In-memory store; the default when persistence is disabled.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        self.entries
            .lock()
            .map_err(|_| CoreError::Storage("store mutex poisoned".to_string()))?
            .insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries
            .lock()
            .map_err(|_| CoreError::Storage("store mutex poisoned".to_string()))?
            .remove(key);
        Ok(())
    }
}

/// One JSON file per key under a base directory. Keys are sanitized to
/// a safe filename.
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let safe: String = key
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '.' || c == '-' { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.json", safe))
    }
}

impl KvStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<Value> {
        let content = std::fs::read_to_string(self.path_for(key)).ok()?;
        serde_json::from_str(&content).ok()
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let content = serde_json::to_string(&value)?;
        std::fs::write(self.path_for(key), content)
            .map_err(|e| CoreError::Storage(format!("write failed for '{}': {}", key, e)))
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        if path.exists() {
            std::fs::remove_file(&path)
                .map_err(|e| CoreError::Storage(format!("remove failed for '{}': {}", key, e)))?;
        }
        Ok(())
    }
}
