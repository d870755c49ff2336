use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Content hash of an anonymous payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PayloadFingerprint(pub u64);

impl fmt::Display for PayloadFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Payloads already settled during this session.
///
/// A payload whose migration was promoted, discarded, or deferred is never
/// offered again until the session ends.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationLedger {
    settled: HashSet<PayloadFingerprint>,
}

impl MigrationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, fingerprint: PayloadFingerprint) -> bool {
        self.settled.insert(fingerprint)
    }

    pub fn contains(&self, fingerprint: &PayloadFingerprint) -> bool {
        self.settled.contains(fingerprint)
    }

    pub fn len(&self) -> usize {
        self.settled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.settled.is_empty()
    }
}
