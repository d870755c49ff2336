//! # ps-infra
//!
//! Adapters that implement the `ps-core` ports: device storage (session and
//! durable areas), the in-process ephemeral media registry, a filesystem
//! object store, an in-memory remote project store, the auth signal, the
//! migration event channel and the system clock.

pub mod auth;
pub mod events;
pub mod media;
pub mod project;
pub mod storage;
pub mod time;

pub use auth::ManualAuthSignal;
pub use events::WatchMigrationEvents;
pub use media::{FsObjectStore, InMemoryEphemeralMedia};
pub use project::InMemoryProjectStore;
pub use storage::{FsDeviceStorage, LayeredDeviceStorage, MemoryDeviceStorage};
pub use time::SystemClock;
