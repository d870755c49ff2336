//! pagesync application layer
//!
//! Use cases and runtime orchestration on top of the `ps-core` ports: media
//! promotion, device persistence with debounced autosave, remote saves, the
//! anonymous-work migration reconciler, and the editor session that ties
//! them together.

pub mod deps;
pub mod engine;
pub mod media;
pub mod persistence;
pub mod session;
pub mod usecases;

pub use deps::EngineDeps;
pub use engine::Engine;
pub use media::{MediaHandleResolver, PromotionReport};
pub use persistence::{AutosaveScheduler, DevicePersistenceStore, SectionSnapshotCodec};
pub use session::EditorSession;
pub use usecases::{MigrationReconciler, SaveAttempt, SaveProject, SaveTarget, SavedProject};
