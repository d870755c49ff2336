use std::sync::Arc;

use ps_core::errors::DeviceStorageError;
use ps_core::identity::StorageScope;
use ps_core::ports::DeviceStoragePort;

/// Routes the session scope and the durable scope to separate backends.
pub struct LayeredDeviceStorage {
    session: Arc<dyn DeviceStoragePort>,
    durable: Arc<dyn DeviceStoragePort>,
}

impl LayeredDeviceStorage {
    pub fn new(session: Arc<dyn DeviceStoragePort>, durable: Arc<dyn DeviceStoragePort>) -> Self {
        Self { session, durable }
    }

    fn area(&self, scope: StorageScope) -> &dyn DeviceStoragePort {
        match scope {
            StorageScope::Session => self.session.as_ref(),
            StorageScope::Durable => self.durable.as_ref(),
        }
    }
}

impl DeviceStoragePort for LayeredDeviceStorage {
    fn get(&self, scope: StorageScope, key: &str) -> Result<Option<String>, DeviceStorageError> {
        self.area(scope).get(scope, key)
    }

    fn set(&self, scope: StorageScope, key: &str, value: &str) -> Result<(), DeviceStorageError> {
        self.area(scope).set(scope, key, value)
    }

    fn remove(&self, scope: StorageScope, key: &str) -> Result<(), DeviceStorageError> {
        self.area(scope).remove(scope, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{FsDeviceStorage, MemoryDeviceStorage};
    use tempfile::TempDir;

    #[test]
    fn session_writes_never_touch_disk() {
        let dir = TempDir::new().unwrap();
        let memory = Arc::new(MemoryDeviceStorage::new());
        let storage = LayeredDeviceStorage::new(
            memory.clone(),
            Arc::new(FsDeviceStorage::new(dir.path())),
        );

        storage.set(StorageScope::Session, "k", "draft").unwrap();
        storage.set(StorageScope::Durable, "k", "saved").unwrap();

        assert!(!dir.path().join("session").exists());
        assert_eq!(memory.keys(StorageScope::Session), vec!["k".to_string()]);
        assert_eq!(
            storage.get(StorageScope::Durable, "k").unwrap().as_deref(),
            Some("saved")
        );
    }
}
