use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use ps_core::errors::DeviceStorageError;
use ps_core::identity::StorageScope;
use ps_core::ports::DeviceStoragePort;
use tracing::warn;

/// In-memory storage with an optional byte budget per scope.
#[derive(Debug, Default)]
pub struct MemoryDeviceStorage {
    entries: Mutex<HashMap<(StorageScope, String), String>>,
    capacity_bytes: Option<usize>,
}

impl MemoryDeviceStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity_bytes: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            capacity_bytes: Some(capacity_bytes),
        }
    }

    /// Bytes currently used by keys and values in `scope`.
    pub fn used_bytes(&self, scope: StorageScope) -> usize {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries
            .iter()
            .filter(|((s, _), _)| *s == scope)
            .map(|((_, k), v)| k.len() + v.len())
            .sum()
    }

    pub fn keys(&self, scope: StorageScope) -> Vec<String> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let mut keys: Vec<String> = entries
            .keys()
            .filter(|(s, _)| *s == scope)
            .map(|(_, k)| k.clone())
            .collect();
        keys.sort();
        keys
    }
}

impl DeviceStoragePort for MemoryDeviceStorage {
    fn get(&self, scope: StorageScope, key: &str) -> Result<Option<String>, DeviceStorageError> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(&(scope, key.to_string())).cloned())
    }

    fn set(&self, scope: StorageScope, key: &str, value: &str) -> Result<(), DeviceStorageError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let slot = (scope, key.to_string());

        if let Some(capacity) = self.capacity_bytes {
            let used: usize = entries
                .iter()
                .filter(|(k, _)| k.0 == scope && **k != slot)
                .map(|((_, k), v)| k.len() + v.len())
                .sum();
            let needed = key.len() + value.len();
            if used + needed > capacity {
                warn!(?scope, key, used, needed, capacity, "device storage quota exceeded");
                return Err(DeviceStorageError::QuotaExceeded);
            }
        }

        entries.insert(slot, value.to_string());
        Ok(())
    }

    fn remove(&self, scope: StorageScope, key: &str) -> Result<(), DeviceStorageError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(&(scope, key.to_string()));
        Ok(())
    }
}
