use std::sync::Arc;

use ps_core::errors::SaveError;
use ps_core::identity::Identity;
use ps_core::ids::{ProjectId, UserId};
use ps_core::ports::ProjectStorePort;
use ps_core::project::{Project, ProjectPatch, ProjectQuotaPolicy};
use ps_core::section::{MediaReference, Section, SectionsSnapshot};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::media::{MediaHandleResolver, PromotionFailure};

/// Where an explicit save writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveTarget {
    New { title: String },
    Existing(ProjectId),
}

/// Result of a remote save, including media that could not be carried over.
#[derive(Debug, Clone, PartialEq)]
pub struct SavedProject {
    pub project: Project,
    pub promoted_media: usize,
    pub failed_media: usize,
    pub failures: Vec<PromotionFailure>,
    /// References that were neither empty nor durable after promotion.
    pub dropped_references: usize,
}

/// Outcome of one save attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveAttempt {
    /// Sections after promotion and sanitising; `None` when the save was
    /// refused before any media was touched.
    pub promoted_sections: Option<Vec<Section>>,
    pub result: Result<SavedProject, SaveError>,
}

impl SaveAttempt {
    fn refused(error: SaveError) -> Self {
        Self {
            promoted_sections: None,
            result: Err(error),
        }
    }
}

/// Remote save: promote media, sanitise references, then create or update.
pub struct SaveProject {
    project_store: Arc<dyn ProjectStorePort>,
    resolver: Arc<MediaHandleResolver>,
    quota: ProjectQuotaPolicy,
    in_flight: Mutex<()>,
}

impl SaveProject {
    pub fn new(
        project_store: Arc<dyn ProjectStorePort>,
        resolver: Arc<MediaHandleResolver>,
        quota: ProjectQuotaPolicy,
    ) -> Self {
        Self {
            project_store,
            resolver,
            quota,
            in_flight: Mutex::new(()),
        }
    }

    pub fn quota(&self) -> ProjectQuotaPolicy {
        self.quota
    }

    /// Save `snapshot` for `identity`.
    ///
    /// A second call while one is running returns [`SaveError::SaveInProgress`]
    /// instead of issuing another remote write.
    pub async fn execute(
        &self,
        snapshot: &SectionsSnapshot,
        identity: &Identity,
        target: SaveTarget,
    ) -> Result<SavedProject, SaveError> {
        self.attempt(snapshot, identity, target).await.result
    }

    /// Like [`SaveProject::execute`], but also hands back the promoted
    /// sections. Promotion releases the ephemeral handles, so a caller that
    /// keeps editing must adopt these sections even when the write failed.
    #[tracing::instrument(
        name = "usecase.save_project.execute",
        skip(self, snapshot),
        fields(sections = snapshot.len(), target = ?target)
    )]
    pub async fn attempt(
        &self,
        snapshot: &SectionsSnapshot,
        identity: &Identity,
        target: SaveTarget,
    ) -> SaveAttempt {
        let Some(owner) = identity.user_id() else {
            return SaveAttempt::refused(SaveError::NotAuthenticated);
        };
        let Ok(_guard) = self.in_flight.try_lock() else {
            return SaveAttempt::refused(SaveError::SaveInProgress);
        };

        if matches!(target, SaveTarget::New { .. }) {
            if let Err(err) = self.ensure_can_create(owner).await {
                return SaveAttempt::refused(err);
            }
        }

        let project_id = match &target {
            SaveTarget::Existing(id) => Some(id),
            SaveTarget::New { .. } => None,
        };
        let report = self
            .resolver
            .promote_all(snapshot.sections(), owner, project_id)
            .await;
        let (sections, dropped_references) = sanitize(report.sections);

        let written = match target {
            SaveTarget::New { title } => {
                self.project_store
                    .create(owner, &title, sections.clone())
                    .await
            }
            SaveTarget::Existing(id) => {
                self.project_store
                    .update(&id, ProjectPatch::sections(sections.clone()))
                    .await
            }
        };
        let project = match written {
            Ok(project) => project,
            Err(err) => {
                warn!(
                    error = %err,
                    promoted_media = report.promoted,
                    "remote write failed after media promotion"
                );
                return SaveAttempt {
                    promoted_sections: Some(sections),
                    result: Err(err.into()),
                };
            }
        };

        if report.failed_count > 0 || dropped_references > 0 {
            warn!(
                project_id = %project.id,
                failed_media = report.failed_count,
                dropped_references,
                "project saved without some media"
            );
        }
        info!(project_id = %project.id, "project saved");

        SaveAttempt {
            promoted_sections: Some(sections),
            result: Ok(SavedProject {
                project,
                promoted_media: report.promoted,
                failed_media: report.failed_count,
                failures: report.failures,
                dropped_references,
            }),
        }
    }

    async fn ensure_can_create(&self, owner: &UserId) -> Result<(), SaveError> {
        let existing = self.project_store.list(owner).await?.len();
        self.quota.check_create(existing)?;
        Ok(())
    }
}

/// Replace every reference that is not empty or durable with `None`.
fn sanitize(sections: Vec<Section>) -> (Vec<Section>, usize) {
    let mut dropped = 0;
    let sections = sections
        .into_iter()
        .map(|mut section| {
            if !section.media.is_persistable() {
                dropped += 1;
                section.media = MediaReference::None;
            }
            section
        })
        .collect();
    (sections, dropped)
}
