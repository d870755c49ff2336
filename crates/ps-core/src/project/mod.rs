//! Remote project catalogue and media asset models.

mod asset;
mod model;
mod quota;

pub use asset::{MediaAsset, MediaUpload};
pub use model::{Project, ProjectPatch, ProjectSummary};
pub use quota::{ProjectQuotaPolicy, DEFAULT_MAX_PROJECTS_PER_ACCOUNT};
