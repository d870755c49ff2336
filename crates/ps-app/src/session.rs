//! # Editor Session
//!
//! Owns the live section list of one editing session and keeps the edit
//! history, the autosave scheduler and the tracked remote project in step
//! with it.
//!
//! Every published value is an immutable [`SectionsSnapshot`]; subscribers
//! receive it through a `watch` channel.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};

use ps_core::errors::{PersistenceWriteFailure, RemoteStoreError, SaveError};
use ps_core::history::EditHistory;
use ps_core::identity::Identity;
use ps_core::ids::{ProjectId, SectionId};
use ps_core::ports::EphemeralMediaPort;
use ps_core::section::{EphemeralHandle, MediaReference, Section, SectionsSnapshot};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::persistence::{AutosaveScheduler, DevicePersistenceStore};
use crate::usecases::{LoadProject, SaveProject, SaveTarget, SavedProject};

pub struct EditorSession {
    sections: watch::Sender<SectionsSnapshot>,
    history: Mutex<EditHistory>,
    identity: Mutex<Identity>,
    project_id: Mutex<Option<ProjectId>>,
    store: Arc<DevicePersistenceStore>,
    autosave: AutosaveScheduler,
    save_project: Arc<SaveProject>,
    load_project: LoadProject,
    ephemeral_media: Arc<dyn EphemeralMediaPort>,
    default_title: String,
}

impl EditorSession {
    pub fn new(
        store: Arc<DevicePersistenceStore>,
        autosave: AutosaveScheduler,
        save_project: Arc<SaveProject>,
        load_project: LoadProject,
        ephemeral_media: Arc<dyn EphemeralMediaPort>,
        history_capacity: usize,
        default_title: impl Into<String>,
    ) -> Self {
        let (sections, _) = watch::channel(SectionsSnapshot::empty());
        Self {
            sections,
            history: Mutex::new(EditHistory::new(SectionsSnapshot::empty(), history_capacity)),
            identity: Mutex::new(Identity::Anonymous),
            project_id: Mutex::new(None),
            store,
            autosave,
            save_project,
            load_project,
            ephemeral_media,
            default_title: default_title.into(),
        }
    }

    pub fn snapshot(&self) -> SectionsSnapshot {
        self.sections.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SectionsSnapshot> {
        self.sections.subscribe()
    }

    pub fn identity(&self) -> Identity {
        lock(&self.identity).clone()
    }

    pub fn project_id(&self) -> Option<ProjectId> {
        lock(&self.project_id).clone()
    }

    pub fn can_undo(&self) -> bool {
        lock(&self.history).can_undo()
    }

    pub fn can_redo(&self) -> bool {
        lock(&self.history).can_redo()
    }

    /// Switch the identity the session saves under.
    ///
    /// The tracked remote project belongs to the previous account and is
    /// forgotten when the identity changes.
    pub fn set_identity(&self, identity: Identity) {
        let mut current = lock(&self.identity);
        if *current != identity {
            debug!(from = %current.namespace(), to = %identity.namespace(), "session identity changed");
            *lock(&self.project_id) = None;
            *current = identity;
        }
    }

    /// Load the device record for `identity` (primary, then autosave) and
    /// start a fresh history from it.
    #[tracing::instrument(name = "session.restore", skip(self), fields(namespace = %identity.namespace()))]
    pub fn restore(&self, identity: Identity) -> SectionsSnapshot {
        if self.autosave.cancel() {
            debug!("pending autosave cancelled before restore");
        }
        self.set_identity(identity.clone());
        let sections = self.store.load(&identity).unwrap_or_default();
        let snapshot = SectionsSnapshot::new(sections);
        info!(sections = snapshot.len(), "session restored");
        self.replace(snapshot.clone());
        snapshot
    }

    /// Publish a user edit, record it in history and schedule an autosave.
    pub fn apply_edit(&self, sections: Vec<Section>) -> SectionsSnapshot {
        let snapshot = SectionsSnapshot::new(sections);
        let mut history = lock(&self.history);
        self.sections.send_replace(snapshot.clone());
        history.push(snapshot.clone());
        drop(history);
        self.autosave.schedule(snapshot.clone(), self.identity());
        snapshot
    }

    pub fn undo(&self) -> Option<SectionsSnapshot> {
        let mut history = lock(&self.history);
        let snapshot = history.undo()?;
        self.publish_history_step(&mut history, snapshot)
    }

    pub fn redo(&self) -> Option<SectionsSnapshot> {
        let mut history = lock(&self.history);
        let snapshot = history.redo()?;
        self.publish_history_step(&mut history, snapshot)
    }

    fn publish_history_step(
        &self,
        history: &mut EditHistory,
        snapshot: SectionsSnapshot,
    ) -> Option<SectionsSnapshot> {
        self.sections.send_replace(snapshot.clone());
        // A feedback push from an observer is ignored in this phase.
        history.push(snapshot.clone());
        self.autosave.schedule(snapshot.clone(), self.identity());
        history.finish_transition();
        Some(snapshot)
    }

    /// Explicit save to the primary device slot.
    pub async fn save_local(&self) -> Result<(), PersistenceWriteFailure> {
        let snapshot = self.snapshot();
        self.store.try_save(&snapshot, &self.identity()).await
    }

    /// Explicit save to the account.
    ///
    /// Writes to the tracked project when there is one, otherwise creates a
    /// new project titled `title` (or the default title). Media promoted on
    /// the way is adopted by the editor whether or not the write succeeds.
    pub async fn save_remote(&self, title: Option<String>) -> Result<SavedProject, SaveError> {
        let target = match self.project_id() {
            Some(id) => SaveTarget::Existing(id),
            None => SaveTarget::New {
                title: title.unwrap_or_else(|| self.default_title.clone()),
            },
        };
        let before = self.snapshot();
        let attempt = self
            .save_project
            .attempt(&before, &self.identity(), target)
            .await;
        if let Some(promoted) = &attempt.promoted_sections {
            self.adopt_media(&before, promoted);
        }

        let saved = attempt.result?;
        *lock(&self.project_id) = Some(saved.project.id.clone());
        Ok(saved)
    }

    /// Carry media references changed by a save into the live content and
    /// every history entry.
    ///
    /// A section is updated only while it still holds the reference it had
    /// when the save started, so edits made during the save are kept.
    fn adopt_media(&self, before: &SectionsSnapshot, promoted: &[Section]) {
        let changes: HashMap<&SectionId, (&MediaReference, &MediaReference)> = before
            .iter()
            .zip(promoted)
            .filter(|(old, new)| old.id == new.id && old.media != new.media)
            .map(|(old, new)| (&old.id, (&old.media, &new.media)))
            .collect();
        if changes.is_empty() {
            return;
        }

        let substitute = |snapshot: &SectionsSnapshot| -> Option<SectionsSnapshot> {
            let mut changed = false;
            let sections: Vec<Section> = snapshot
                .iter()
                .map(|section| match changes.get(&section.id) {
                    Some((old, new)) if section.media == **old => {
                        changed = true;
                        section.clone().with_media((*new).clone())
                    }
                    _ => section.clone(),
                })
                .collect();
            changed.then(|| SectionsSnapshot::new(sections))
        };

        let mut history = lock(&self.history);
        let entries = history.rewrite_entries(&substitute);
        let current = self.snapshot();
        if let Some(updated) = substitute(&current) {
            self.sections.send_replace(updated.clone());
            // A pending autosave still holds the released handles.
            if self.autosave.is_pending() {
                self.autosave.schedule(updated, self.identity());
            }
        }
        debug!(sections = changes.len(), entries, "saved media adopted by the editor");
    }

    /// Replace the session content with a remote project and track its id.
    pub async fn open_project(&self, id: &ProjectId) -> Result<SectionsSnapshot, RemoteStoreError> {
        let identity = self.identity();
        let owner = identity.user_id().ok_or(RemoteStoreError::Unauthorized)?;
        self.autosave.cancel();

        let project = self.load_project.execute(owner, id).await?;
        let snapshot = SectionsSnapshot::new(project.sections);
        self.replace(snapshot.clone());
        *lock(&self.project_id) = Some(project.id);
        info!(project_id = %id, sections = snapshot.len(), "project opened");
        Ok(snapshot)
    }

    /// Delete the device records for the current identity and start over.
    pub fn clear_local(&self) -> Result<(), PersistenceWriteFailure> {
        self.store.clear(&self.identity())?;
        self.replace(SectionsSnapshot::empty());
        Ok(())
    }

    /// Empty the editor without touching storage.
    pub fn reset_to_empty(&self) {
        *lock(&self.project_id) = None;
        self.replace(SectionsSnapshot::empty());
    }

    /// Reset the editor whenever `resets` changes, e.g. after a discarded
    /// migration.
    pub fn follow_resets(self: &Arc<Self>, mut resets: watch::Receiver<u64>) -> JoinHandle<()> {
        let session = Arc::downgrade(self);
        tokio::spawn(async move {
            while resets.changed().await.is_ok() {
                let Some(session) = session.upgrade() else {
                    break;
                };
                session.reset_to_empty();
            }
        })
    }

    pub fn teardown(&self) {
        if self.autosave.cancel() {
            debug!("pending autosave cancelled on teardown");
        }
    }

    pub fn autosave(&self) -> &AutosaveScheduler {
        &self.autosave
    }

    /// Swap in unrelated content: history restarts from `snapshot` and
    /// ephemeral media only the discarded content referenced is released.
    fn replace(&self, snapshot: SectionsSnapshot) {
        self.autosave.cancel();
        let mut history = lock(&self.history);
        let mut retired: HashSet<EphemeralHandle> = history
            .iter()
            .chain(std::iter::once(&self.snapshot()))
            .flat_map(ephemeral_handles)
            .collect();
        for handle in ephemeral_handles(&snapshot) {
            retired.remove(&handle);
        }

        history.reset(snapshot.clone());
        self.sections.send_replace(snapshot);
        drop(history);

        for handle in &retired {
            self.ephemeral_media.release(handle);
        }
        if !retired.is_empty() {
            debug!(released = retired.len(), "ephemeral media of replaced content released");
        }
    }
}

fn ephemeral_handles(snapshot: &SectionsSnapshot) -> Vec<EphemeralHandle> {
    snapshot
        .iter()
        .filter_map(|section| section.media.as_ephemeral().cloned())
        .collect()
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
