use crate::migration::MigrationState;

/// UI-facing notifications for the migration offer.
#[async_trait::async_trait]
pub trait MigrationEventPort: Send + Sync {
    async fn emit_migration_state_changed(&self, state: MigrationState);
}
