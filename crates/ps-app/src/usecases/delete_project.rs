use std::sync::Arc;

use ps_core::errors::RemoteStoreError;
use ps_core::ids::{ProjectId, UserId};
use ps_core::ports::ProjectStorePort;
use tracing::info;

pub struct DeleteProject {
    project_store: Arc<dyn ProjectStorePort>,
}

impl DeleteProject {
    pub fn new(project_store: Arc<dyn ProjectStorePort>) -> Self {
        Self { project_store }
    }

    /// Delete one of the owner's projects. Media objects are left in place;
    /// they are reclaimed through the media quota reset.
    #[tracing::instrument(
        name = "usecase.delete_project.execute",
        skip(self),
        fields(owner = %owner, project_id = %id)
    )]
    pub async fn execute(&self, owner: &UserId, id: &ProjectId) -> Result<(), RemoteStoreError> {
        let project = self.project_store.get(id).await?;
        if &project.owner_id != owner {
            return Err(RemoteStoreError::Unauthorized);
        }
        self.project_store.delete(id).await?;
        info!("project deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use ps_core::ports::mocks::MockProjectStore;
    use ps_core::project::Project;

    fn project(owner: &str) -> Project {
        Project {
            id: ProjectId::from("p-1"),
            owner_id: UserId::from(owner),
            title: "Page".into(),
            sections: Vec::new(),
            is_public: false,
            share_enabled: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn owner_can_delete() {
        let mut store = MockProjectStore::new();
        store.expect_get().returning(|_| Ok(project("u-1")));
        store.expect_delete().times(1).returning(|_| Ok(()));

        DeleteProject::new(Arc::new(store))
            .execute(&UserId::from("u-1"), &ProjectId::from("p-1"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn other_accounts_cannot_delete() {
        let mut store = MockProjectStore::new();
        store.expect_get().returning(|_| Ok(project("u-2")));
        store.expect_delete().never();

        let err = DeleteProject::new(Arc::new(store))
            .execute(&UserId::from("u-1"), &ProjectId::from("p-1"))
            .await
            .unwrap_err();
        assert_eq!(err, RemoteStoreError::Unauthorized);
    }
}
