use async_trait::async_trait;

use crate::section::{EmbeddedMedia, EphemeralHandle};

/// Process-local registry of media bytes behind ephemeral handles.
#[async_trait]
pub trait EphemeralMediaPort: Send + Sync {
    /// Keep `media` in memory and return a fresh handle for it.
    fn register(&self, media: EmbeddedMedia) -> EphemeralHandle;

    /// Read the bytes and content type behind a handle.
    async fn read(&self, handle: &EphemeralHandle) -> anyhow::Result<EmbeddedMedia>;

    /// Drop the bytes. Releasing an unknown handle is a no-op.
    fn release(&self, handle: &EphemeralHandle);

    fn contains(&self, handle: &EphemeralHandle) -> bool;
}
