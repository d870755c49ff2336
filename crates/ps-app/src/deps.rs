//! # Engine Dependencies
//!
//! Parameter grouping for engine construction. Not a builder: no defaults,
//! no hidden logic, every port is required.

use std::sync::Arc;

use ps_core::ports::*;

pub struct EngineDeps {
    // Device-local storage
    pub device_storage: Arc<dyn DeviceStoragePort>,
    pub ephemeral_media: Arc<dyn EphemeralMediaPort>,

    // Remote storage
    pub project_store: Arc<dyn ProjectStorePort>,
    pub object_store: Arc<dyn ObjectStorePort>,

    // Identity and UI
    pub auth: Arc<dyn AuthSignalPort>,
    pub migration_events: Arc<dyn MigrationEventPort>,

    // System
    pub clock: Arc<dyn ClockPort>,
}
