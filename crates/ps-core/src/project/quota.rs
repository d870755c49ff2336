use serde::{Deserialize, Serialize};

use crate::errors::ProjectQuotaExceeded;

pub const DEFAULT_MAX_PROJECTS_PER_ACCOUNT: usize = 3;

/// Per-account project limit, shared by every path that creates projects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectQuotaPolicy {
    pub max_projects_per_account: usize,
}

impl ProjectQuotaPolicy {
    pub fn new(max_projects_per_account: usize) -> Self {
        Self {
            max_projects_per_account,
        }
    }

    /// Check whether one more project may be created given the current count.
    pub fn check_create(&self, existing: usize) -> Result<(), ProjectQuotaExceeded> {
        if existing >= self.max_projects_per_account {
            return Err(ProjectQuotaExceeded {
                limit: self.max_projects_per_account,
            });
        }
        Ok(())
    }
}

impl Default for ProjectQuotaPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PROJECTS_PER_ACCOUNT)
    }
}
