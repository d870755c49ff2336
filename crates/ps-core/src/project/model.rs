use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{ProjectId, UserId};
use crate::section::Section;

/// A saved page in the remote project store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub owner_id: UserId,
    pub title: String,
    pub sections: Vec<Section>,
    pub is_public: bool,
    pub share_enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    pub fn summary(&self) -> ProjectSummary {
        ProjectSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            section_count: self.sections.len(),
            is_public: self.is_public,
            updated_at: self.updated_at,
        }
    }
}

/// Listing row for the project picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectSummary {
    pub id: ProjectId,
    pub title: String,
    pub section_count: usize,
    pub is_public: bool,
    pub updated_at: DateTime<Utc>,
}

/// Partial update; `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectPatch {
    pub title: Option<String>,
    pub sections: Option<Vec<Section>>,
    pub is_public: Option<bool>,
    pub share_enabled: Option<bool>,
}

impl ProjectPatch {
    pub fn sections(sections: Vec<Section>) -> Self {
        Self {
            sections: Some(sections),
            ..Default::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.sections.is_none()
            && self.is_public.is_none()
            && self.share_enabled.is_none()
    }

    /// Apply the patch in place and bump `updated_at`.
    pub fn apply_to(self, project: &mut Project, now: DateTime<Utc>) {
        if let Some(title) = self.title {
            project.title = title;
        }
        if let Some(sections) = self.sections {
            project.sections = sections;
        }
        if let Some(is_public) = self.is_public {
            project.is_public = is_public;
        }
        if let Some(share_enabled) = self.share_enabled {
            project.share_enabled = share_enabled;
        }
        project.updated_at = now;
    }
}
