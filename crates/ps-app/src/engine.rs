//! # Engine
//!
//! Assembles the session, the migration reconciler and the catalogue use
//! cases from [`EngineDeps`] and follows the auth signal.

use std::sync::Arc;

use ps_core::config::EngineConfig;
use ps_core::errors::MigrationError;
use ps_core::identity::Identity;
use ps_core::migration::{MigrationState, MigrationTarget};
use ps_core::ports::AuthSignalPort;
use tokio::task::JoinHandle;
use tracing::{debug, info_span, warn, Instrument};

use crate::deps::EngineDeps;
use crate::media::MediaHandleResolver;
use crate::persistence::{
    AutosaveScheduler, DevicePersistenceStore, SectionSnapshotCodec, StorageKeys,
};
use crate::session::EditorSession;
use crate::usecases::{
    DeleteMediaAsset, DeleteProject, ListProjects, LoadProject, MigrationReconciler,
    ResetMediaQuota, SaveProject,
};

pub struct Engine {
    pub session: Arc<EditorSession>,
    pub migration: Arc<MigrationReconciler>,
    pub list_projects: ListProjects,
    pub delete_project: DeleteProject,
    pub delete_media_asset: DeleteMediaAsset,
    pub reset_media_quota: ResetMediaQuota,
    pub store: Arc<DevicePersistenceStore>,
    pub resolver: Arc<MediaHandleResolver>,
    auth: Arc<dyn AuthSignalPort>,
}

impl Engine {
    /// This constructor signature is the dependency manifest: every port is
    /// required, tunables come from `config`.
    pub fn new(deps: EngineDeps, config: &EngineConfig) -> Self {
        let codec = Arc::new(SectionSnapshotCodec::new(
            Arc::clone(&deps.ephemeral_media),
            Arc::clone(&deps.clock),
        ));
        let store = Arc::new(DevicePersistenceStore::new(
            deps.device_storage,
            codec,
            StorageKeys::new(config.storage.key_prefix.clone()),
        ));
        let resolver = Arc::new(MediaHandleResolver::new(
            Arc::clone(&deps.ephemeral_media),
            Arc::clone(&deps.object_store),
            deps.clock,
        ));
        let save_project = Arc::new(SaveProject::new(
            Arc::clone(&deps.project_store),
            Arc::clone(&resolver),
            config.projects.quota_policy(),
        ));
        let autosave = AutosaveScheduler::new(Arc::clone(&store), config.autosave.quiet_period());

        let session = Arc::new(EditorSession::new(
            Arc::clone(&store),
            autosave,
            Arc::clone(&save_project),
            LoadProject::new(Arc::clone(&deps.project_store)),
            deps.ephemeral_media,
            config.history.capacity,
            config.projects.default_title.clone(),
        ));
        let migration = Arc::new(MigrationReconciler::new(
            Arc::clone(&store),
            save_project,
            deps.migration_events,
        ));

        Self {
            session,
            migration,
            list_projects: ListProjects::new(Arc::clone(&deps.project_store)),
            delete_project: DeleteProject::new(deps.project_store),
            delete_media_asset: DeleteMediaAsset::new(Arc::clone(&deps.object_store)),
            reset_media_quota: ResetMediaQuota::new(deps.object_store),
            store,
            resolver,
            auth: deps.auth,
        }
    }

    /// Start the background tasks: auth following and editor resets.
    pub fn start(&self) -> Vec<JoinHandle<()>> {
        vec![
            self.follow_auth(),
            self.session
                .follow_resets(self.migration.subscribe_editor_resets()),
        ]
    }

    /// Promote the offered anonymous work and open the resulting project.
    pub async fn import_anonymous_work(
        &self,
        target: MigrationTarget,
    ) -> Result<MigrationState, MigrationError> {
        let state = self.migration.promote(target).await?;
        if let MigrationState::Promoted { project_id, .. } = &state {
            if let Err(err) = self.session.open_project(project_id).await {
                warn!(project_id = %project_id, error = %err, "imported project could not be opened");
            }
        }
        Ok(state)
    }

    /// Cancel pending autosaves and abandon any open migration offer.
    pub async fn shutdown(&self) {
        self.session.teardown();
        if let Err(err) = self.migration.session_ended().await {
            warn!(error = %err, "migration did not settle on shutdown");
        }
    }

    fn follow_auth(&self) -> JoinHandle<()> {
        let session = Arc::clone(&self.session);
        let migration = Arc::clone(&self.migration);
        let mut rx = self.auth.subscribe();
        tokio::spawn(
            async move {
                loop {
                    let user = rx.borrow_and_update().clone();
                    let outcome = match user {
                        Some(user_id) => {
                            let identity = Identity::Authenticated(user_id.clone());
                            if session.snapshot().is_empty() {
                                session.restore(identity);
                            } else {
                                // Keep the anonymous page on screen; the
                                // reconciler offers to import it.
                                session.set_identity(identity);
                            }
                            migration.on_authenticated(user_id).await
                        }
                        None => {
                            let outcome = migration.signed_out().await;
                            session.restore(Identity::Anonymous);
                            outcome
                        }
                    };
                    if let Err(err) = outcome {
                        warn!(error = %err, "migration reconcile after auth change failed");
                    }
                    if rx.changed().await.is_err() {
                        debug!("auth signal closed");
                        break;
                    }
                }
            }
            .instrument(info_span!("engine.follow_auth")),
        )
    }
}
