//! # Debounced Autosave Scheduler
//!
//! Coalesces rapid edits into one write of the autosave slot after a quiet
//! period.
//!
//! ## Cancellation
//!
//! The [`DebounceTimer`] holds at most one pending autosave and a generation
//! counter. A fired timer writes only if its generation is still the armed
//! one, and the check and the (synchronous) storage write happen under the
//! timer lock. `cancel` takes the same lock, so once it returns no earlier
//! schedule can write: clearing device data always wins over a late autosave.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use ps_core::errors::PersistenceWriteFailure;
use ps_core::identity::Identity;
use ps_core::section::SectionsSnapshot;
use tokio::sync::watch;
use tokio::task::AbortHandle;
use tracing::{debug, warn};

use super::device_store::DevicePersistenceStore;
use super::keys::StorageSlot;

struct PendingAutosave {
    generation: u64,
    identity: Identity,
    abort: AbortHandle,
}

#[derive(Default)]
struct TimerState {
    generation: u64,
    pending: Option<PendingAutosave>,
}

/// Single-slot debounce timer shared by the scheduler and the device store.
#[derive(Default)]
pub struct DebounceTimer {
    state: Mutex<TimerState>,
}

impl DebounceTimer {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, TimerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace any pending timer with a new one. `spawn` receives the new
    /// generation and returns the abort handle of the task it started.
    pub fn arm<F>(&self, identity: &Identity, spawn: F) -> u64
    where
        F: FnOnce(u64) -> AbortHandle,
    {
        let mut state = self.lock();
        if let Some(previous) = state.pending.take() {
            previous.abort.abort();
        }
        state.generation += 1;
        let generation = state.generation;
        let abort = spawn(generation);
        state.pending = Some(PendingAutosave {
            generation,
            identity: identity.clone(),
            abort,
        });
        generation
    }

    /// Run `write` if `generation` is still armed; `None` when superseded or
    /// cancelled.
    pub fn fire<T>(&self, generation: u64, write: impl FnOnce() -> T) -> Option<T> {
        let mut state = self.lock();
        match &state.pending {
            Some(pending) if pending.generation == generation => {}
            _ => return None,
        }
        state.pending = None;
        Some(write())
    }

    /// Idempotent. Returns whether a pending timer was cancelled.
    pub fn cancel(&self) -> bool {
        match self.lock().pending.take() {
            Some(pending) => {
                pending.abort.abort();
                true
            }
            None => false,
        }
    }

    /// Cancel only if the pending timer writes for `identity`. Scope and
    /// namespace both have to match.
    pub fn cancel_for(&self, identity: &Identity) -> bool {
        let mut state = self.lock();
        let matches = state.pending.as_ref().is_some_and(|pending| {
            pending.identity.scope() == identity.scope()
                && pending.identity.namespace() == identity.namespace()
        });
        if !matches {
            return false;
        }
        if let Some(pending) = state.pending.take() {
            pending.abort.abort();
        }
        true
    }

    pub fn is_pending(&self) -> bool {
        self.lock().pending.is_some()
    }
}

pub struct AutosaveScheduler {
    store: Arc<DevicePersistenceStore>,
    timer: Arc<DebounceTimer>,
    quiet_period: Duration,
    failures: Arc<watch::Sender<Option<PersistenceWriteFailure>>>,
}

impl AutosaveScheduler {
    pub fn new(store: Arc<DevicePersistenceStore>, quiet_period: Duration) -> Self {
        let (failures, _rx) = watch::channel(None);
        Self {
            timer: store.timer(),
            store,
            quiet_period,
            failures: Arc::new(failures),
        }
    }

    pub fn quiet_period(&self) -> Duration {
        self.quiet_period
    }

    /// Restart the quiet period; only the last snapshot scheduled before it
    /// elapses is written. Must be called within a tokio runtime.
    pub fn schedule(&self, snapshot: SectionsSnapshot, identity: Identity) {
        let store = Arc::clone(&self.store);
        let timer = Arc::clone(&self.timer);
        let failures = Arc::clone(&self.failures);
        let quiet_period = self.quiet_period;
        let owner = identity.clone();

        let generation = self.timer.arm(&owner, move |generation| {
            tokio::spawn(async move {
                tokio::time::sleep(quiet_period).await;
                Self::write(store, timer, failures, generation, snapshot, identity).await;
            })
            .abort_handle()
        });
        debug!(namespace = owner.namespace(), generation, "autosave scheduled");
    }

    async fn write(
        store: Arc<DevicePersistenceStore>,
        timer: Arc<DebounceTimer>,
        failures: Arc<watch::Sender<Option<PersistenceWriteFailure>>>,
        generation: u64,
        snapshot: SectionsSnapshot,
        identity: Identity,
    ) {
        let outcome = match store.encode_record(&snapshot).await {
            Ok(text) => timer.fire(generation, || {
                store.write_slot(&identity, StorageSlot::Autosave, &text)
            }),
            Err(failure) => timer.fire(generation, || Err(failure)),
        };

        match outcome {
            None => debug!(generation, "autosave superseded before write"),
            Some(Ok(())) => {
                debug!(namespace = identity.namespace(), sections = snapshot.len(), "autosave written");
                failures.send_replace(None);
            }
            Some(Err(failure)) => {
                warn!(
                    namespace = identity.namespace(),
                    error = %failure,
                    remediation = failure.remediation(),
                    "autosave failed"
                );
                failures.send_replace(Some(failure));
            }
        }
    }

    pub fn cancel(&self) -> bool {
        self.timer.cancel()
    }

    pub fn cancel_for(&self, identity: &Identity) -> bool {
        self.timer.cancel_for(identity)
    }

    pub fn is_pending(&self) -> bool {
        self.timer.is_pending()
    }

    /// Latest autosave failure; cleared by the next successful write.
    pub fn subscribe_failures(&self) -> watch::Receiver<Option<PersistenceWriteFailure>> {
        self.failures.subscribe()
    }
}

impl Drop for AutosaveScheduler {
    fn drop(&mut self) {
        if self.timer.cancel() {
            debug!("pending autosave cancelled on teardown");
        }
    }
}
