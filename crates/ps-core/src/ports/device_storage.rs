use std::sync::Arc;

use crate::errors::DeviceStorageError;
use crate::identity::StorageScope;

/// Device-local key-value storage with a session and a durable area.
pub trait DeviceStoragePort: Send + Sync {
    fn get(&self, scope: StorageScope, key: &str) -> Result<Option<String>, DeviceStorageError>;

    fn set(&self, scope: StorageScope, key: &str, value: &str) -> Result<(), DeviceStorageError>;

    /// Removing a missing key is not an error.
    fn remove(&self, scope: StorageScope, key: &str) -> Result<(), DeviceStorageError>;
}

impl<T: DeviceStoragePort + ?Sized> DeviceStoragePort for Arc<T> {
    fn get(&self, scope: StorageScope, key: &str) -> Result<Option<String>, DeviceStorageError> {
        (**self).get(scope, key)
    }

    fn set(&self, scope: StorageScope, key: &str, value: &str) -> Result<(), DeviceStorageError> {
        (**self).set(scope, key, value)
    }

    fn remove(&self, scope: StorageScope, key: &str) -> Result<(), DeviceStorageError> {
        (**self).remove(scope, key)
    }
}
