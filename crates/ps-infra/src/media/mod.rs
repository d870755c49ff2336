mod ephemeral_registry;
mod fs_object_store;

pub use ephemeral_registry::InMemoryEphemeralMedia;
pub use fs_object_store::FsObjectStore;
