//! # ps-core
//!
//! Core domain models and pure state logic for the pagesync engine.
//!
//! This crate contains no infrastructure: sections and their media
//! references, the edit history, the migration state machine, the remote
//! project model, configuration data, and the ports that adapters implement.

pub mod config;
pub mod errors;
pub mod history;
pub mod identity;
pub mod ids;
pub mod migration;
pub mod ports;
pub mod project;
pub mod section;

// Re-export commonly used types at the crate root
pub use config::EngineConfig;
pub use errors::{
    DecodeError, DeviceStorageError, MigrationError, PersistenceWriteFailure, ProjectQuotaExceeded,
    PromotionError, RemoteStoreError, SaveError,
};
pub use history::{EditHistory, HistoryPhase};
pub use identity::{Identity, StorageScope};
pub use ids::{ProjectId, SectionId, UserId};
pub use migration::{MigrationState, MigrationStateMachine};
pub use project::{MediaAsset, MediaUpload, Project, ProjectPatch, ProjectQuotaPolicy};
pub use section::{DurableUrl, EphemeralHandle, MediaKind, MediaReference, Section, SectionsSnapshot};
