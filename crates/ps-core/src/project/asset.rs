use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{ProjectId, UserId};
use crate::section::DurableUrl;

/// Bytes handed to the object store when an ephemeral handle is promoted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaUpload {
    pub owner_id: UserId,
    pub project_id: Option<ProjectId>,
    /// `<unix-millis>-<suffix>.<ext>`
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl MediaUpload {
    /// Object path under the owner's prefix.
    pub fn object_path(&self) -> String {
        format!("{}/{}", self.owner_id, self.file_name)
    }
}

/// Durable media object owned by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaAsset {
    pub owner_id: UserId,
    pub project_id: Option<ProjectId>,
    pub size_bytes: u64,
    pub content_type: String,
    pub url: DurableUrl,
    pub path: String,
    pub created_at: DateTime<Utc>,
}
