use std::sync::Arc;

use anyhow::{Context, Result};
use ps_core::ids::UserId;
use ps_core::ports::ObjectStorePort;
use tracing::info;

/// Remove a single uploaded media object from the owner's prefix.
pub struct DeleteMediaAsset {
    object_store: Arc<dyn ObjectStorePort>,
}

impl DeleteMediaAsset {
    pub fn new(object_store: Arc<dyn ObjectStorePort>) -> Self {
        Self { object_store }
    }

    #[tracing::instrument(name = "usecase.delete_media_asset.execute", skip(self), fields(owner = %owner))]
    pub async fn execute(&self, owner: &UserId, path: &str) -> Result<()> {
        self.object_store
            .delete(owner, path)
            .await
            .with_context(|| format!("failed to delete media object {path}"))?;
        info!(path, "media object deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ps_core::errors::RemoteStoreError;
    use ps_core::ports::mocks::MockObjectStore;

    #[tokio::test]
    async fn forwards_owner_and_path() {
        let mut store = MockObjectStore::new();
        store
            .expect_delete()
            .withf(|owner, path| owner.as_str() == "u-1" && path == "u-1/1700000000000-abcd1234.png")
            .times(1)
            .returning(|_, _| Ok(()));

        DeleteMediaAsset::new(Arc::new(store))
            .execute(&UserId::from("u-1"), "u-1/1700000000000-abcd1234.png")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn wraps_store_errors() {
        let mut store = MockObjectStore::new();
        store
            .expect_delete()
            .returning(|_, _| Err(RemoteStoreError::Unauthorized));

        let err = DeleteMediaAsset::new(Arc::new(store))
            .execute(&UserId::from("u-1"), "u-2/x.png")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("u-2/x.png"));
        assert_eq!(
            err.downcast_ref::<RemoteStoreError>(),
            Some(&RemoteStoreError::Unauthorized)
        );
    }
}
