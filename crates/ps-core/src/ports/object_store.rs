use async_trait::async_trait;

use crate::errors::RemoteStoreError;
use crate::ids::UserId;
use crate::project::{MediaAsset, MediaUpload};

/// Remote object storage for durable media.
#[async_trait]
pub trait ObjectStorePort: Send + Sync {
    async fn put(&self, upload: MediaUpload) -> Result<MediaAsset, RemoteStoreError>;

    async fn delete(&self, owner: &UserId, path: &str) -> Result<(), RemoteStoreError>;

    async fn list(&self, owner: &UserId) -> Result<Vec<MediaAsset>, RemoteStoreError>;
}
