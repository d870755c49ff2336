//! Business logic use cases
//!
//! Explicit, user-initiated operations against the remote stores. Each use
//! case is built from ports and exposes a single `execute`.

pub mod delete_media_asset;
pub mod delete_project;
pub mod list_projects;
pub mod load_project;
pub mod migration;
pub mod reset_media_quota;
pub mod save_project;

pub use delete_media_asset::DeleteMediaAsset;
pub use delete_project::DeleteProject;
pub use list_projects::ListProjects;
pub use load_project::LoadProject;
pub use migration::MigrationReconciler;
pub use reset_media_quota::{MediaQuotaReset, ResetMediaQuota};
pub use save_project::{SaveAttempt, SaveProject, SaveTarget, SavedProject};
