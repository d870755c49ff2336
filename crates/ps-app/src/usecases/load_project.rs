use std::sync::Arc;

use ps_core::errors::RemoteStoreError;
use ps_core::ids::{ProjectId, UserId};
use ps_core::ports::ProjectStorePort;
use ps_core::project::Project;
use ps_core::section::MediaReference;
use tracing::warn;

/// Fetch one of the owner's projects for editing.
///
/// Projects owned by someone else are reported as not found.
pub struct LoadProject {
    project_store: Arc<dyn ProjectStorePort>,
}

impl LoadProject {
    pub fn new(project_store: Arc<dyn ProjectStorePort>) -> Self {
        Self { project_store }
    }

    #[tracing::instrument(
        name = "usecase.load_project.execute",
        skip(self),
        fields(owner = %owner, project_id = %id)
    )]
    pub async fn execute(&self, owner: &UserId, id: &ProjectId) -> Result<Project, RemoteStoreError> {
        let mut project = self.project_store.get(id).await?;
        if &project.owner_id != owner {
            warn!("project belongs to another account");
            return Err(RemoteStoreError::NotFound(id.to_string()));
        }

        for section in &mut project.sections {
            if !section.media.is_persistable() {
                warn!(section_id = %section.id, "dropping non-durable media from remote project");
                section.media = MediaReference::None;
            }
        }
        Ok(project)
    }
}
