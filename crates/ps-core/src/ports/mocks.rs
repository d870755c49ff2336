//! Mock implementations of engine ports for testing.
//!
//! Enabled for this crate's own tests and, through the `test-mocks` feature,
//! for downstream crates' tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::mock;

use crate::errors::{DeviceStorageError, RemoteStoreError};
use crate::identity::StorageScope;
use crate::ids::{ProjectId, UserId};
use crate::migration::MigrationState;
use crate::ports::{
    ClockPort, DeviceStoragePort, EphemeralMediaPort, MigrationEventPort, ObjectStorePort,
    ProjectStorePort,
};
use crate::project::{MediaAsset, MediaUpload, Project, ProjectPatch};
use crate::section::{EmbeddedMedia, EphemeralHandle, Section};

mock! {
    pub ProjectStore {}

    #[async_trait]
    impl ProjectStorePort for ProjectStore {
        async fn list(&self, owner: &UserId) -> Result<Vec<Project>, RemoteStoreError>;
        async fn get(&self, id: &ProjectId) -> Result<Project, RemoteStoreError>;
        async fn create(
            &self,
            owner: &UserId,
            title: &str,
            sections: Vec<Section>,
        ) -> Result<Project, RemoteStoreError>;
        async fn update(&self, id: &ProjectId, patch: ProjectPatch)
            -> Result<Project, RemoteStoreError>;
        async fn delete(&self, id: &ProjectId) -> Result<(), RemoteStoreError>;
    }
}

mock! {
    pub ObjectStore {}

    #[async_trait]
    impl ObjectStorePort for ObjectStore {
        async fn put(&self, upload: MediaUpload) -> Result<MediaAsset, RemoteStoreError>;
        async fn delete(&self, owner: &UserId, path: &str) -> Result<(), RemoteStoreError>;
        async fn list(&self, owner: &UserId) -> Result<Vec<MediaAsset>, RemoteStoreError>;
    }
}

mock! {
    pub EphemeralMedia {}

    #[async_trait]
    impl EphemeralMediaPort for EphemeralMedia {
        fn register(&self, media: EmbeddedMedia) -> EphemeralHandle;
        async fn read(&self, handle: &EphemeralHandle) -> anyhow::Result<EmbeddedMedia>;
        fn release(&self, handle: &EphemeralHandle);
        fn contains(&self, handle: &EphemeralHandle) -> bool;
    }
}

mock! {
    pub DeviceStorage {}

    impl DeviceStoragePort for DeviceStorage {
        fn get(&self, scope: StorageScope, key: &str) -> Result<Option<String>, DeviceStorageError>;
        fn set(&self, scope: StorageScope, key: &str, value: &str) -> Result<(), DeviceStorageError>;
        fn remove(&self, scope: StorageScope, key: &str) -> Result<(), DeviceStorageError>;
    }
}

mock! {
    pub Clock {}

    impl ClockPort for Clock {
        fn now(&self) -> DateTime<Utc>;
    }
}

mock! {
    pub MigrationEvents {}

    #[async_trait]
    impl MigrationEventPort for MigrationEvents {
        async fn emit_migration_state_changed(&self, state: MigrationState);
    }
}
