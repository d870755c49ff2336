use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use ps_core::errors::RemoteStoreError;
use ps_core::ids::UserId;
use ps_core::ports::ObjectStorePort;
use ps_core::project::{MediaAsset, MediaUpload};
use ps_core::section::DurableUrl;
use tokio::fs;
use tracing::{debug, info};

const META_SUFFIX: &str = ".meta.json";

/// Object store backed by a local directory and served under a public base URL.
///
/// Layout: `<root>/<owner>/<file_name>` plus a `<file_name>.meta.json` sidecar
/// holding the [`MediaAsset`] record.
pub struct FsObjectStore {
    root: PathBuf,
    public_base_url: String,
    quota_bytes_per_owner: Option<u64>,
}

impl FsObjectStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
            quota_bytes_per_owner: None,
        }
    }

    pub fn with_quota(mut self, bytes_per_owner: u64) -> Self {
        self.quota_bytes_per_owner = Some(bytes_per_owner);
        self
    }

    fn owner_dir(&self, owner: &UserId) -> Result<PathBuf, RemoteStoreError> {
        ensure_segment(owner.as_str())?;
        Ok(self.root.join(owner.as_str()))
    }

    fn public_url(&self, path: &str) -> Result<DurableUrl, RemoteStoreError> {
        DurableUrl::parse(&format!("{}/{}", self.public_base_url, path))
            .map_err(|e| RemoteStoreError::Transport(e.to_string()))
    }

    async fn used_bytes(&self, owner: &UserId) -> Result<u64, RemoteStoreError> {
        Ok(self.list(owner).await?.iter().map(|a| a.size_bytes).sum())
    }
}

#[async_trait]
impl ObjectStorePort for FsObjectStore {
    async fn put(&self, upload: MediaUpload) -> Result<MediaAsset, RemoteStoreError> {
        ensure_segment(&upload.file_name)?;
        let dir = self.owner_dir(&upload.owner_id)?;

        if let Some(quota) = self.quota_bytes_per_owner {
            let used = self.used_bytes(&upload.owner_id).await?;
            if used + upload.bytes.len() as u64 > quota {
                info!(owner = %upload.owner_id, used, quota, "object store quota exceeded");
                return Err(RemoteStoreError::QuotaExceeded);
            }
        }

        fs::create_dir_all(&dir)
            .await
            .map_err(|e| transport("create owner dir", &dir, e))?;

        let path = upload.object_path();
        let asset = MediaAsset {
            owner_id: upload.owner_id.clone(),
            project_id: upload.project_id.clone(),
            size_bytes: upload.bytes.len() as u64,
            content_type: upload.content_type.clone(),
            url: self.public_url(&path)?,
            path,
            created_at: Utc::now(),
        };

        let data_path = dir.join(&upload.file_name);
        fs::write(&data_path, &upload.bytes)
            .await
            .map_err(|e| transport("write object", &data_path, e))?;

        let meta_path = dir.join(format!("{}{META_SUFFIX}", upload.file_name));
        let meta = serde_json::to_vec(&asset)
            .map_err(|e| RemoteStoreError::Transport(format!("encode object meta failed: {e}")))?;
        fs::write(&meta_path, meta)
            .await
            .map_err(|e| transport("write object meta", &meta_path, e))?;

        debug!(path = %asset.path, bytes = asset.size_bytes, "object stored");
        Ok(asset)
    }

    async fn delete(&self, owner: &UserId, path: &str) -> Result<(), RemoteStoreError> {
        let file_name = path
            .strip_prefix(owner.as_str())
            .and_then(|rest| rest.strip_prefix('/'))
            .ok_or(RemoteStoreError::Unauthorized)?;
        ensure_segment(file_name)?;

        let dir = self.owner_dir(owner)?;
        let data_path = dir.join(file_name);
        match fs::remove_file(&data_path).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(RemoteStoreError::NotFound(path.to_string()))
            }
            Err(e) => return Err(transport("remove object", &data_path, e)),
        }

        let meta_path = dir.join(format!("{file_name}{META_SUFFIX}"));
        if let Err(e) = fs::remove_file(&meta_path).await {
            if e.kind() != ErrorKind::NotFound {
                return Err(transport("remove object meta", &meta_path, e));
            }
        }
        debug!(path, "object deleted");
        Ok(())
    }

    async fn list(&self, owner: &UserId) -> Result<Vec<MediaAsset>, RemoteStoreError> {
        let dir = self.owner_dir(owner)?;
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(transport("list owner dir", &dir, e)),
        };

        let mut assets = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| transport("list owner dir", &dir, e))?
        {
            let name = entry.file_name().to_string_lossy().into_owned();
            if !name.ends_with(META_SUFFIX) {
                continue;
            }
            let raw = fs::read(entry.path())
                .await
                .map_err(|e| transport("read object meta", &entry.path(), e))?;
            match serde_json::from_slice::<MediaAsset>(&raw) {
                Ok(asset) => assets.push(asset),
                Err(e) => debug!(file = %name, error = %e, "skipping unreadable object meta"),
            }
        }
        assets.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.path.cmp(&b.path)));
        Ok(assets)
    }
}

fn ensure_segment(segment: &str) -> Result<(), RemoteStoreError> {
    let invalid = segment.is_empty()
        || segment == "."
        || segment == ".."
        || segment.contains(['/', '\\']);
    if invalid {
        return Err(RemoteStoreError::Transport(format!(
            "invalid object path segment: {segment:?}"
        )));
    }
    Ok(())
}

fn transport(action: &str, path: &Path, err: std::io::Error) -> RemoteStoreError {
    RemoteStoreError::Transport(format!("{action} failed: {}: {err}", path.display()))
}
