use std::sync::Arc;

use anyhow::{Context, Result};
use futures::future::join_all;
use ps_core::ids::UserId;
use ps_core::ports::ObjectStorePort;
use tracing::{info, warn};

/// Outcome of wiping the owner's media prefix.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaQuotaReset {
    pub removed: usize,
    pub freed_bytes: u64,
    pub failed: Vec<String>,
}

/// Delete every media object stored under the owner's prefix.
pub struct ResetMediaQuota {
    object_store: Arc<dyn ObjectStorePort>,
}

impl ResetMediaQuota {
    pub fn new(object_store: Arc<dyn ObjectStorePort>) -> Self {
        Self { object_store }
    }

    #[tracing::instrument(name = "usecase.reset_media_quota.execute", skip(self), fields(owner = %owner))]
    pub async fn execute(&self, owner: &UserId) -> Result<MediaQuotaReset> {
        let assets = self
            .object_store
            .list(owner)
            .await
            .with_context(|| format!("failed to list media for {owner}"))?;

        let outcomes = join_all(assets.iter().map(|asset| async move {
            (asset, self.object_store.delete(owner, &asset.path).await)
        }))
        .await;

        let mut reset = MediaQuotaReset::default();
        for (asset, outcome) in outcomes {
            match outcome {
                Ok(()) => {
                    reset.removed += 1;
                    reset.freed_bytes += asset.size_bytes;
                }
                Err(err) => {
                    warn!(path = %asset.path, error = %err, "failed to delete media object");
                    reset.failed.push(asset.path.clone());
                }
            }
        }

        info!(
            removed = reset.removed,
            freed_bytes = reset.freed_bytes,
            failed = reset.failed.len(),
            "media quota reset"
        );
        Ok(reset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use ps_core::errors::RemoteStoreError;
    use ps_core::ports::mocks::MockObjectStore;
    use ps_core::project::MediaAsset;
    use ps_core::section::DurableUrl;

    fn asset(path: &str, size_bytes: u64) -> MediaAsset {
        MediaAsset {
            owner_id: UserId::from("u-1"),
            project_id: None,
            size_bytes,
            content_type: "image/png".into(),
            url: DurableUrl::parse(&format!("https://cdn.example.com/{path}")).unwrap(),
            path: path.to_string(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn removes_everything_and_reports_failures() {
        let mut store = MockObjectStore::new();
        store
            .expect_list()
            .returning(|_| Ok(vec![asset("u-1/a.png", 10), asset("u-1/b.png", 20), asset("u-1/c.png", 5)]));
        store.expect_delete().returning(|_, path| {
            if path == "u-1/b.png" {
                Err(RemoteStoreError::Transport("timeout".into()))
            } else {
                Ok(())
            }
        });

        let reset = ResetMediaQuota::new(Arc::new(store))
            .execute(&UserId::from("u-1"))
            .await
            .unwrap();
        assert_eq!(reset.removed, 2);
        assert_eq!(reset.freed_bytes, 15);
        assert_eq!(reset.failed, vec!["u-1/b.png".to_string()]);
    }
}
