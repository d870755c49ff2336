//! Anonymous-to-account migration domain.
//!
//! Pure state types and transitions; side effects are carried out by the
//! application layer reconciler that interprets [`MigrationAction`]s.

mod ledger;
mod pending;
pub mod state_machine;

pub use ledger::{MigrationLedger, PayloadFingerprint};
pub use pending::PendingMigration;
pub use state_machine::{
    MigrationAction, MigrationEvent, MigrationState, MigrationStateMachine, MigrationTarget,
};
