//! Port interfaces for the application layer
//!
//! Ports define the contract between the engine's use cases and the
//! infrastructure that backs them (device storage, the remote project and
//! object stores, the auth provider, the UI). Async ports use `async_trait`;
//! device storage is synchronous, like the browser storage it models.

mod auth;
mod clock;
mod device_storage;
mod ephemeral_media;
mod migration_event;
mod object_store;
mod project_store;

#[cfg(any(test, feature = "test-mocks"))]
pub mod mocks;

pub use auth::AuthSignalPort;
pub use clock::ClockPort;
pub use device_storage::DeviceStoragePort;
pub use ephemeral_media::EphemeralMediaPort;
pub use migration_event::MigrationEventPort;
pub use object_store::ObjectStorePort;
pub use project_store::ProjectStorePort;
