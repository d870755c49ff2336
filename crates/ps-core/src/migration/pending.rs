use serde::{Deserialize, Serialize};
use twox_hash::xxh3::hash64;

use super::ledger::PayloadFingerprint;
use crate::section::StorableSection;

/// Summary of anonymous work found after sign-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingMigration {
    pub section_count: usize,
    pub media_count: usize,
    pub fingerprint: PayloadFingerprint,
}

impl PendingMigration {
    /// Summarise a stored section list.
    ///
    /// The fingerprint is taken over the storable form, which is stable across
    /// reloads (ephemeral handles are re-minted on every decode, embedded
    /// bytes are not).
    pub fn from_storable(sections: &[StorableSection]) -> Self {
        let encoded = serde_json::to_vec(sections).unwrap_or_default();
        Self {
            section_count: sections.len(),
            media_count: sections.iter().filter(|s| s.media.is_some()).count(),
            fingerprint: PayloadFingerprint(hash64(&encoded)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.section_count == 0
    }
}
