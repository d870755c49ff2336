use std::sync::Arc;

use anyhow::{Context, Result};
use ps_core::ids::UserId;
use ps_core::ports::ProjectStorePort;
use ps_core::project::ProjectSummary;

/// Project picker listing for the signed-in owner, newest first.
pub struct ListProjects {
    project_store: Arc<dyn ProjectStorePort>,
}

impl ListProjects {
    pub fn new(project_store: Arc<dyn ProjectStorePort>) -> Self {
        Self { project_store }
    }

    #[tracing::instrument(name = "usecase.list_projects.execute", skip(self), fields(owner = %owner))]
    pub async fn execute(&self, owner: &UserId) -> Result<Vec<ProjectSummary>> {
        let mut projects = self
            .project_store
            .list(owner)
            .await
            .with_context(|| format!("failed to list projects for {owner}"))?;
        projects.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(projects.iter().map(|p| p.summary()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use ps_core::errors::RemoteStoreError;
    use ps_core::ids::ProjectId;
    use ps_core::ports::mocks::MockProjectStore;
    use ps_core::project::Project;

    fn project(id: &str, age_secs: i64) -> Project {
        let at = Utc::now() - Duration::seconds(age_secs);
        Project {
            id: ProjectId::from(id),
            owner_id: UserId::from("u-1"),
            title: id.to_string(),
            sections: Vec::new(),
            is_public: false,
            share_enabled: false,
            created_at: at,
            updated_at: at,
        }
    }

    #[tokio::test]
    async fn summaries_are_newest_first() {
        let mut store = MockProjectStore::new();
        store
            .expect_list()
            .returning(|_| Ok(vec![project("old", 60), project("new", 1)]));

        let summaries = ListProjects::new(Arc::new(store))
            .execute(&UserId::from("u-1"))
            .await
            .unwrap();
        let ids: Vec<&str> = summaries.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "old"]);
    }

    #[tokio::test]
    async fn store_failure_carries_context() {
        let mut store = MockProjectStore::new();
        store
            .expect_list()
            .returning(|_| Err(RemoteStoreError::Transport("offline".into())));

        let err = ListProjects::new(Arc::new(store))
            .execute(&UserId::from("u-1"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("failed to list projects for u-1"));
    }
}
