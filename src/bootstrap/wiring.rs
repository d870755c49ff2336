//! # Dependency Injection
//!
//! Creates the infra adapters from [`EngineConfig`] and groups them into
//! [`EngineDeps`]. Assembly only: no business decisions and no configuration
//! validation happen here.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use ps_app::EngineDeps;
use ps_core::config::EngineConfig;
use ps_core::ports::DeviceStoragePort;
use ps_infra::{
    FsDeviceStorage, FsObjectStore, InMemoryEphemeralMedia, InMemoryProjectStore,
    LayeredDeviceStorage, ManualAuthSignal, MemoryDeviceStorage, SystemClock,
    WatchMigrationEvents,
};
use tracing::info;

pub type WiringResult<T> = Result<T, WiringError>;

/// Infrastructure initialization failures.
#[derive(Debug, thiserror::Error)]
pub enum WiringError {
    #[error("Device storage initialization failed: {0}")]
    DeviceStorageInit(String),

    #[error("Object store initialization failed: {0}")]
    ObjectStoreInit(String),
}

/// Engine dependencies plus the concrete adapters the host drives directly.
pub struct HostAdapters {
    pub deps: EngineDeps,
    pub auth: Arc<ManualAuthSignal>,
    pub migration_events: Arc<WatchMigrationEvents>,
    pub ephemeral_media: Arc<InMemoryEphemeralMedia>,
}

fn ensure_dir(path: &Path) -> std::io::Result<()> {
    fs::create_dir_all(path)
}

fn create_device_storage(config: &EngineConfig) -> WiringResult<Arc<dyn DeviceStoragePort>> {
    ensure_dir(&config.storage.data_dir).map_err(|e| {
        WiringError::DeviceStorageInit(format!(
            "Failed to create {}: {e}",
            config.storage.data_dir.display()
        ))
    })?;

    let session = match config.storage.session_capacity_bytes {
        Some(bytes) => MemoryDeviceStorage::with_capacity(bytes),
        None => MemoryDeviceStorage::new(),
    };
    let durable = FsDeviceStorage::new(&config.storage.data_dir);
    Ok(Arc::new(LayeredDeviceStorage::new(
        Arc::new(session),
        Arc::new(durable),
    )))
}

fn create_object_store(config: &EngineConfig) -> WiringResult<FsObjectStore> {
    ensure_dir(&config.storage.object_store_dir).map_err(|e| {
        WiringError::ObjectStoreInit(format!(
            "Failed to create {}: {e}",
            config.storage.object_store_dir.display()
        ))
    })?;
    Ok(FsObjectStore::new(
        &config.storage.object_store_dir,
        config.storage.public_base_url.clone(),
    ))
}

/// Wire every port of the engine.
///
/// # Errors
///
/// Returns a [`WiringError`] when a storage directory cannot be created.
pub fn wire_dependencies(config: &EngineConfig) -> WiringResult<HostAdapters> {
    let device_storage = create_device_storage(config)?;
    let object_store = create_object_store(config)?;
    let auth = Arc::new(ManualAuthSignal::new());
    let migration_events = Arc::new(WatchMigrationEvents::new());
    let ephemeral_media = Arc::new(InMemoryEphemeralMedia::new());

    let deps = EngineDeps {
        device_storage,
        ephemeral_media: ephemeral_media.clone(),
        project_store: Arc::new(InMemoryProjectStore::new()),
        object_store: Arc::new(object_store),
        auth: auth.clone(),
        migration_events: migration_events.clone(),
        clock: Arc::new(SystemClock),
    };

    info!(
        data_dir = %config.storage.data_dir.display(),
        object_store_dir = %config.storage.object_store_dir.display(),
        "dependencies wired"
    );
    Ok(HostAdapters {
        deps,
        auth,
        migration_events,
        ephemeral_media,
    })
}
