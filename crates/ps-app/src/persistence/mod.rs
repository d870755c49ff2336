//! Device-local persistence: snapshot codec, primary/autosave slots, and the
//! debounced autosave scheduler.

mod autosave;
mod codec;
mod device_store;
mod keys;

pub use autosave::{AutosaveScheduler, DebounceTimer};
pub use codec::SectionSnapshotCodec;
pub use device_store::DevicePersistenceStore;
pub use keys::{StorageKeys, StorageSlot};
