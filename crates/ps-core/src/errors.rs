//! Error taxonomy shared by the engine.
//!
//! Per-item failures (`PromotionError`, `DecodeError`) are absorbed and
//! counted by their callers; whole-operation failures (`SaveError`,
//! `PersistenceWriteFailure`) are returned to the UI as typed results.

use thiserror::Error;

/// Failure to turn one ephemeral handle into a durable URL.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PromotionError {
    #[error("media handle is no longer available: {0}")]
    HandleUnavailable(String),
    #[error("media upload failed: {0}")]
    Upload(String),
    #[error("object store returned an unusable url: {0}")]
    InvalidUrl(String),
}

/// Failure to read back a stored record or one of its sections.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("stored record is not valid json: {0}")]
    Malformed(String),
    #[error("stored record has an unexpected shape: {0}")]
    Shape(String),
    #[error("stored record version {0} is not supported")]
    UnsupportedVersion(u64),
    #[error("embedded media could not be decoded: {0}")]
    EmbeddedMedia(String),
}

/// Error reported by a device key-value store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeviceStorageError {
    #[error("device storage quota exceeded")]
    QuotaExceeded,
    #[error("device storage unavailable: {0}")]
    Unavailable(String),
}

/// Explicit or autosave write to device storage did not complete.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PersistenceWriteFailure {
    #[error("device storage is full")]
    CapacityExceeded,
    #[error("device storage write failed: {0}")]
    Storage(String),
    #[error("record could not be encoded: {0}")]
    Encode(String),
}

impl PersistenceWriteFailure {
    pub fn remediation(&self) -> &'static str {
        match self {
            PersistenceWriteFailure::CapacityExceeded => {
                "Local storage is full. Remove large images or delete old drafts to free space."
            }
            PersistenceWriteFailure::Storage(_) | PersistenceWriteFailure::Encode(_) => {
                "Your changes could not be saved on this device. Try saving to your account."
            }
        }
    }
}

impl From<DeviceStorageError> for PersistenceWriteFailure {
    fn from(value: DeviceStorageError) -> Self {
        match value {
            DeviceStorageError::QuotaExceeded => PersistenceWriteFailure::CapacityExceeded,
            DeviceStorageError::Unavailable(msg) => PersistenceWriteFailure::Storage(msg),
        }
    }
}

/// Error returned by the remote project and object stores.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteStoreError {
    #[error("request is not authorized")]
    Unauthorized,
    #[error("remote record not found: {0}")]
    NotFound(String),
    #[error("remote storage quota exceeded")]
    QuotaExceeded,
    #[error("remote transport failed: {0}")]
    Transport(String),
}

/// Failure of an explicit remote save, surfaced to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SaveError {
    #[error("sign in to save projects to your account")]
    NotAuthenticated,
    #[error("project limit of {limit} reached")]
    ProjectLimitReached { limit: usize },
    #[error("remote storage quota exceeded")]
    CapacityExceeded,
    #[error("save failed: {0}")]
    TransportFailure(String),
    #[error("a save is already in progress")]
    SaveInProgress,
}

impl SaveError {
    pub fn remediation(&self) -> &'static str {
        match self {
            SaveError::NotAuthenticated => "Sign in to save this page to your account.",
            SaveError::ProjectLimitReached { .. } => {
                "Delete an existing project or overwrite one of your projects."
            }
            SaveError::CapacityExceeded => "Free space by deleting unused images or projects.",
            SaveError::TransportFailure(_) => "Check your connection and try again.",
            SaveError::SaveInProgress => "Wait for the current save to finish.",
        }
    }
}

impl From<ProjectQuotaExceeded> for SaveError {
    fn from(value: ProjectQuotaExceeded) -> Self {
        SaveError::ProjectLimitReached { limit: value.limit }
    }
}

impl From<RemoteStoreError> for SaveError {
    fn from(value: RemoteStoreError) -> Self {
        match value {
            RemoteStoreError::Unauthorized => SaveError::NotAuthenticated,
            RemoteStoreError::QuotaExceeded => SaveError::CapacityExceeded,
            RemoteStoreError::NotFound(what) => {
                SaveError::TransportFailure(format!("not found: {what}"))
            }
            RemoteStoreError::Transport(msg) => SaveError::TransportFailure(msg),
        }
    }
}

/// Creating one more project would exceed the per-account limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("project limit of {limit} reached")]
pub struct ProjectQuotaExceeded {
    pub limit: usize,
}

/// Failure while promoting anonymous work into an account.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MigrationError {
    #[error("no anonymous work is waiting to be migrated")]
    NothingToMigrate,
    #[error("migration requires a signed-in user")]
    NotAuthenticated,
    #[error(transparent)]
    Save(#[from] SaveError),
    #[error("anonymous work could not be cleared: {0}")]
    Cleanup(String),
}

impl MigrationError {
    pub fn remediation(&self) -> &'static str {
        match self {
            MigrationError::NothingToMigrate => "There is nothing left to import.",
            MigrationError::NotAuthenticated => "Sign in to keep your work.",
            MigrationError::Save(inner) => inner.remediation(),
            MigrationError::Cleanup(_) => {
                "Your work was imported. Reload to clear the local draft."
            }
        }
    }
}
