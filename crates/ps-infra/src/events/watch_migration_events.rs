use async_trait::async_trait;
use ps_core::migration::MigrationState;
use ps_core::ports::MigrationEventPort;
use tokio::sync::watch;
use tracing::debug;

/// Publishes migration state on a watch channel for the UI to observe.
pub struct WatchMigrationEvents {
    tx: watch::Sender<MigrationState>,
}

impl WatchMigrationEvents {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(MigrationState::Idle);
        Self { tx }
    }

    pub fn subscribe(&self) -> watch::Receiver<MigrationState> {
        self.tx.subscribe()
    }

    pub fn latest(&self) -> MigrationState {
        self.tx.borrow().clone()
    }
}

impl Default for WatchMigrationEvents {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MigrationEventPort for WatchMigrationEvents {
    async fn emit_migration_state_changed(&self, state: MigrationState) {
        debug!(state = ?state, "migration state emitted");
        self.tx.send_replace(state);
    }
}
