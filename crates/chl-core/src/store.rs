use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::StoreResult;

/// Key-value persistence used for the session snapshot and the settings map.
///
/// Implementations may block; callers are expected to run them off the
/// thread that owns the engine.
pub trait Store: Send + Sync {
    /// Read the bytes stored under `key`, or `None` when absent.
    fn load(&self, key: &str) -> StoreResult<Option<Vec<u8>>>;

    /// Replace the bytes stored under `key`.
    fn save(&self, key: &str, bytes: &[u8]) -> StoreResult<()>;
}

/// A store that lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Store for MemoryStore {
    fn load(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        let entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(entries.get(key).cloned())
    }

    fn save(&self, key: &str, bytes: &[u8]) -> StoreResult<()> {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        entries.insert(key.to_string(), bytes.to_vec());
        Ok(())
    }
}
