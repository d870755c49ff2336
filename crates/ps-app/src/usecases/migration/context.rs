use std::sync::Arc;

use ps_core::migration::{MigrationLedger, MigrationState};
use tokio::sync::Mutex;

/// Shared migration context: current state, settled payloads and the
/// dispatch lock.
///
/// ## Lock Ordering
/// Acquire `dispatch_lock` first, then `state` or `ledger`.
#[derive(Clone)]
pub struct MigrationContext {
    state: Arc<Mutex<MigrationState>>,
    ledger: Arc<Mutex<MigrationLedger>>,
    /// Serializes transition + actions + state update.
    dispatch_lock: Arc<Mutex<()>>,
}

impl MigrationContext {
    pub fn new(initial_state: MigrationState) -> Self {
        Self {
            state: Arc::new(Mutex::new(initial_state)),
            ledger: Arc::new(Mutex::new(MigrationLedger::new())),
            dispatch_lock: Arc::new(Mutex::new(())),
        }
    }

    pub async fn get_state(&self) -> MigrationState {
        self.state.lock().await.clone()
    }

    pub async fn acquire_dispatch_lock(&self) -> tokio::sync::MutexGuard<'_, ()> {
        self.dispatch_lock.lock().await
    }

    /// Only call while holding the dispatch lock.
    pub async fn set_state(&self, state: MigrationState) {
        *self.state.lock().await = state;
    }

    pub async fn ledger(&self) -> MigrationLedger {
        self.ledger.lock().await.clone()
    }

    pub async fn settle(&self, fingerprint: ps_core::migration::PayloadFingerprint) -> bool {
        self.ledger.lock().await.record(fingerprint)
    }
}

impl Default for MigrationContext {
    fn default() -> Self {
        Self::new(MigrationState::Idle)
    }
}
