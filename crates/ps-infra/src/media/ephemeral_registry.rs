use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use anyhow::anyhow;
use async_trait::async_trait;
use ps_core::ports::EphemeralMediaPort;
use ps_core::section::{EmbeddedMedia, EphemeralHandle};
use tracing::debug;

/// Process-local media registry, the counterpart of browser object URLs.
#[derive(Debug, Default)]
pub struct InMemoryEphemeralMedia {
    entries: Mutex<HashMap<EphemeralHandle, EmbeddedMedia>>,
}

impl InMemoryEphemeralMedia {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl EphemeralMediaPort for InMemoryEphemeralMedia {
    fn register(&self, media: EmbeddedMedia) -> EphemeralHandle {
        let handle = EphemeralHandle::generate();
        debug!(handle = %handle, bytes = media.bytes.len(), "ephemeral media registered");
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(handle.clone(), media);
        handle
    }

    async fn read(&self, handle: &EphemeralHandle) -> anyhow::Result<EmbeddedMedia> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(handle)
            .cloned()
            .ok_or_else(|| anyhow!("ephemeral media not found: {handle}"))
    }

    fn release(&self, handle: &EphemeralHandle) {
        if self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(handle)
            .is_some()
        {
            debug!(handle = %handle, "ephemeral media released");
        }
    }

    fn contains(&self, handle: &EphemeralHandle) -> bool {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(handle)
    }
}
