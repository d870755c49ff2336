use async_trait::async_trait;

use crate::errors::RemoteStoreError;
use crate::ids::{ProjectId, UserId};
use crate::project::{Project, ProjectPatch};
use crate::section::Section;

/// Remote project store contract (request/response only).
#[async_trait]
pub trait ProjectStorePort: Send + Sync {
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
