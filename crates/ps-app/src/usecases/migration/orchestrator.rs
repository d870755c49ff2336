//! Migration reconciler.
//!
//! Drives the migration state machine and carries out its side effects:
//! presenting the offer, promoting anonymous work into the account,
//! clearing the anonymous namespace and resetting the editor.

use std::sync::Arc;

use ps_core::errors::MigrationError;
use ps_core::identity::Identity;
use ps_core::ids::UserId;
use ps_core::migration::{
    MigrationAction, MigrationEvent, MigrationState, MigrationStateMachine, MigrationTarget,
    PendingMigration,
};
use ps_core::ports::MigrationEventPort;
use ps_core::section::SectionsSnapshot;
use tokio::sync::{watch, Mutex};
use tracing::{debug, error, info, info_span, warn, Instrument};

use super::context::MigrationContext;
use crate::persistence::DevicePersistenceStore;
use crate::usecases::save_project::{SaveProject, SaveTarget};

pub struct MigrationReconciler {
    context: MigrationContext,
    store: Arc<DevicePersistenceStore>,
    save_project: Arc<SaveProject>,
    events: Arc<dyn MigrationEventPort>,
    /// Bumped every time the editor must drop its content.
    editor_resets: watch::Sender<u64>,
    /// Failure raised by the last dispatched action, returned to the caller.
    last_error: Mutex<Option<MigrationError>>,
}

impl MigrationReconciler {
    pub fn new(
        store: Arc<DevicePersistenceStore>,
        save_project: Arc<SaveProject>,
        events: Arc<dyn MigrationEventPort>,
    ) -> Self {
        let (editor_resets, _) = watch::channel(0);
        Self {
            context: MigrationContext::default(),
            store,
            save_project,
            events,
            editor_resets,
            last_error: Mutex::new(None),
        }
    }

    pub async fn state(&self) -> MigrationState {
        self.context.get_state().await
    }

    /// Receives a new value whenever a discard requires the editor to start
    /// from an empty page.
    pub fn subscribe_editor_resets(&self) -> watch::Receiver<u64> {
        self.editor_resets.subscribe()
    }

    /// A user signed in: offer their anonymous work unless it was already
    /// settled in this session.
    pub async fn on_authenticated(&self, user_id: UserId) -> Result<MigrationState, MigrationError> {
        let pending = self.pending_anonymous_work();
        self.dispatch(MigrationEvent::Authenticated { user_id, pending })
            .await
    }

    /// Promote the offered work into `target`.
    ///
    /// A failed promotion leaves the offer open so the user can retry, pick
    /// another target, or discard.
    pub async fn promote(&self, target: MigrationTarget) -> Result<MigrationState, MigrationError> {
        if !matches!(self.state().await, MigrationState::Offered { .. }) {
            return Err(MigrationError::NothingToMigrate);
        }
        self.dispatch(MigrationEvent::PromoteRequested { target })
            .await
    }

    pub async fn discard(&self) -> Result<MigrationState, MigrationError> {
        if !matches!(self.state().await, MigrationState::Offered { .. }) {
            return Err(MigrationError::NothingToMigrate);
        }
        self.dispatch(MigrationEvent::DiscardRequested).await
    }

    /// Keep the anonymous work on the device and stop offering it.
    pub async fn defer(&self) -> Result<MigrationState, MigrationError> {
        self.dispatch(MigrationEvent::DeferRequested).await
    }

    pub async fn session_ended(&self) -> Result<MigrationState, MigrationError> {
        self.dispatch(MigrationEvent::SessionEnded).await
    }

    pub async fn signed_out(&self) -> Result<MigrationState, MigrationError> {
        self.dispatch(MigrationEvent::SignedOut).await
    }

    fn pending_anonymous_work(&self) -> Option<PendingMigration> {
        let record = self.store.load_preferred_record(&Identity::Anonymous)?;
        let pending = PendingMigration::from_storable(&record.sections);
        (!pending.is_empty()).then_some(pending)
    }

    async fn dispatch(&self, event: MigrationEvent) -> Result<MigrationState, MigrationError> {
        let _dispatch_guard = self.context.acquire_dispatch_lock().await;

        let span = info_span!("usecase.migration.dispatch", event = ?event);
        async {
            let mut current = self.context.get_state().await;
            let mut pending_events = vec![event];

            while let Some(event) = pending_events.pop() {
                let from = current.clone();
                let event_name = format!("{:?}", event);
                let ledger = self.context.ledger().await;
                let (next, actions) = MigrationStateMachine::transition(current, event, &ledger);
                if next != from {
                    info!(from = ?from, to = ?next, event = %event_name, "migration state transition");
                }
                let follow_up_events = self.execute_actions(actions).await;
                self.context.set_state(next.clone()).await;
                if next != from {
                    self.events.emit_migration_state_changed(next.clone()).await;
                }
                current = next;
                pending_events.extend(follow_up_events);
            }

            match self.last_error.lock().await.take() {
                Some(err) => Err(err),
                None => Ok(current),
            }
        }
        .instrument(span)
        .await
    }

    async fn execute_actions(&self, actions: Vec<MigrationAction>) -> Vec<MigrationEvent> {
        let mut follow_up_events = Vec::new();
        for action in actions {
            debug!(?action, "migration executing action");
            match action {
                MigrationAction::PresentOffer { pending } => {
                    info!(
                        sections = pending.section_count,
                        media = pending.media_count,
                        fingerprint = %pending.fingerprint,
                        "anonymous work found; offering migration"
                    );
                    follow_up_events.push(MigrationEvent::OfferPresented);
                }
                MigrationAction::PromoteAnonymousWork { user_id, target } => {
                    follow_up_events.push(self.promote_anonymous_work(user_id, target).await);
                }
                MigrationAction::ClearAnonymousData => {
                    if let Err(err) = self.store.clear(&Identity::Anonymous) {
                        error!(error = %err, "failed to clear anonymous work");
                        self.record_error(MigrationError::Cleanup(err.to_string()))
                            .await;
                    }
                }
                MigrationAction::ResetEditor => {
                    self.editor_resets.send_modify(|generation| *generation += 1);
                }
                MigrationAction::RecordSettled { fingerprint } => {
                    self.context.settle(fingerprint).await;
                }
            }
        }
        follow_up_events
    }

    async fn promote_anonymous_work(
        &self,
        user_id: UserId,
        target: MigrationTarget,
    ) -> MigrationEvent {
        let Some(record) = self.store.load_preferred_record(&Identity::Anonymous) else {
            self.record_error(MigrationError::NothingToMigrate).await;
            return MigrationEvent::PromotionFailed {
                error: MigrationError::NothingToMigrate.to_string(),
            };
        };

        let snapshot = SectionsSnapshot::new(self.store.codec().decode(record));
        let identity = Identity::Authenticated(user_id);
        match self
            .save_project
            .execute(&snapshot, &identity, SaveTarget::from(target))
            .await
        {
            Ok(saved) => MigrationEvent::PromotionSucceeded {
                project_id: saved.project.id,
                promoted_media: saved.promoted_media,
                failed_media: saved.failed_media + saved.dropped_references,
            },
            Err(err) => {
                warn!(error = %err, "promoting anonymous work failed");
                let message = err.to_string();
                self.record_error(MigrationError::Save(err)).await;
                MigrationEvent::PromotionFailed { error: message }
            }
        }
    }

    async fn record_error(&self, err: MigrationError) {
        *self.last_error.lock().await = Some(err);
    }
}

impl From<MigrationTarget> for SaveTarget {
    fn from(value: MigrationTarget) -> Self {
        match value {
            MigrationTarget::NewProject { title } => SaveTarget::New { title },
            MigrationTarget::Existing(id) => SaveTarget::Existing(id),
        }
    }
}
