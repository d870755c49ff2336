//! Anonymous-to-account migration.

mod context;
mod orchestrator;

pub use context::MigrationContext;
pub use orchestrator::MigrationReconciler;
