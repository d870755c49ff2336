//! Device key-value storage.
//!
//! The session area lives in memory and disappears with the process; the
//! durable area is a directory of small files. [`LayeredDeviceStorage`]
//! routes each [`StorageScope`](ps_core::StorageScope) to its area.

mod fs_storage;
mod layered;
mod memory_storage;

pub use fs_storage::FsDeviceStorage;
pub use layered::LayeredDeviceStorage;
pub use memory_storage::MemoryDeviceStorage;
