use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use ps_core::errors::RemoteStoreError;
use ps_core::ids::{ProjectId, UserId};
use ps_core::ports::ProjectStorePort;
use ps_core::project::{Project, ProjectPatch};
use ps_core::section::Section;
use tokio::sync::RwLock;
use tracing::debug;

/// Remote project store kept in process memory.
///
/// Stands in for the hosted store in the headless host and in tests. An
/// optional hard limit mimics server-side storage quotas.
#[derive(Default)]
pub struct InMemoryProjectStore {
    projects: RwLock<HashMap<ProjectId, Project>>,
    hard_limit_per_owner: Option<usize>,
}

impl InMemoryProjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject creates beyond `limit` projects per owner with `QuotaExceeded`.
    pub fn with_hard_limit(limit: usize) -> Self {
        Self {
            projects: RwLock::new(HashMap::new()),
            hard_limit_per_owner: Some(limit),
        }
    }

    pub async fn len(&self) -> usize {
        self.projects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.projects.read().await.is_empty()
    }
}

#[async_trait]
impl ProjectStorePort for InMemoryProjectStore {
    async fn list(&self, owner: &UserId) -> Result<Vec<Project>, RemoteStoreError> {
        let projects = self.projects.read().await;
        let mut owned: Vec<Project> = projects
            .values()
            .filter(|p| &p.owner_id == owner)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(owned)
    }

    async fn get(&self, id: &ProjectId) -> Result<Project, RemoteStoreError> {
        self.projects
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| RemoteStoreError::NotFound(id.to_string()))
    }

    async fn create(
        &self,
        owner: &UserId,
        title: &str,
        sections: Vec<Section>,
    ) -> Result<Project, RemoteStoreError> {
        let mut projects = self.projects.write().await;
        if let Some(limit) = self.hard_limit_per_owner {
            let owned = projects.values().filter(|p| &p.owner_id == owner).count();
            if owned >= limit {
                return Err(RemoteStoreError::QuotaExceeded);
            }
        }

        let now = Utc::now();
        let project = Project {
            id: ProjectId::generate(),
            owner_id: owner.clone(),
            title: title.to_string(),
            sections,
            is_public: false,
            share_enabled: false,
            created_at: now,
            updated_at: now,
        };
        projects.insert(project.id.clone(), project.clone());
        debug!(project_id = %project.id, owner = %owner, "project created");
        Ok(project)
    }

    async fn update(
        &self,
        id: &ProjectId,
        patch: ProjectPatch,
    ) -> Result<Project, RemoteStoreError> {
        let mut projects = self.projects.write().await;
        let project = projects
            .get_mut(id)
            .ok_or_else(|| RemoteStoreError::NotFound(id.to_string()))?;
        patch.apply_to(project, Utc::now());
        debug!(project_id = %id, "project updated");
        Ok(project.clone())
    }

    async fn delete(&self, id: &ProjectId) -> Result<(), RemoteStoreError> {
        self.projects
            .write()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| RemoteStoreError::NotFound(id.to_string()))
    }
}
