//! # Device Persistence Store
//!
//! Primary and autosave records per identity in device storage. Anonymous
//! work lives in the session area, signed-in work in the durable area.
//!
//! Write failures are returned as [`PersistenceWriteFailure`] (or logged, for
//! the `bool` variants); nothing here panics on a full or broken store.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use ps_core::errors::PersistenceWriteFailure;
use ps_core::identity::Identity;
use ps_core::ports::DeviceStoragePort;
use ps_core::section::{Section, StoredProjectRecord};
use tracing::{debug, info, warn};

use super::autosave::DebounceTimer;
use super::codec::SectionSnapshotCodec;
use super::keys::{StorageKeys, StorageSlot};

pub struct DevicePersistenceStore {
    storage: Arc<dyn DeviceStoragePort>,
    codec: Arc<SectionSnapshotCodec>,
    keys: StorageKeys,
    timer: Arc<DebounceTimer>,
}

impl DevicePersistenceStore {
    pub fn new(
        storage: Arc<dyn DeviceStoragePort>,
        codec: Arc<SectionSnapshotCodec>,
        keys: StorageKeys,
    ) -> Self {
        Self {
            storage,
            codec,
            keys,
            timer: Arc::new(DebounceTimer::new()),
        }
    }

    /// Debounce timer shared with the autosave scheduler so `clear` can cancel it.
    pub fn timer(&self) -> Arc<DebounceTimer> {
        Arc::clone(&self.timer)
    }

    pub fn codec(&self) -> &SectionSnapshotCodec {
        &self.codec
    }

    /// Write the primary record.
    pub async fn try_save(
        &self,
        sections: &[Section],
        identity: &Identity,
    ) -> Result<(), PersistenceWriteFailure> {
        let text = self.encode_record(sections).await?;
        self.write_slot(identity, StorageSlot::Primary, &text)?;
        info!(
            namespace = identity.namespace(),
            sections = sections.len(),
            "project saved to device"
        );
        Ok(())
    }

    /// Like [`try_save`](Self::try_save), reporting failure as `false`.
    pub async fn save(&self, sections: &[Section], identity: &Identity) -> bool {
        match self.try_save(sections, identity).await {
            Ok(()) => true,
            Err(failure) => {
                warn!(
                    namespace = identity.namespace(),
                    error = %failure,
                    remediation = failure.remediation(),
                    "device save failed"
                );
                false
            }
        }
    }

    /// Write the autosave record directly, bypassing the debounce timer.
    pub async fn save_autosave(
        &self,
        sections: &[Section],
        identity: &Identity,
    ) -> Result<(), PersistenceWriteFailure> {
        let text = self.encode_record(sections).await?;
        self.write_slot(identity, StorageSlot::Autosave, &text)
    }

    pub async fn encode_record(&self, sections: &[Section]) -> Result<String, PersistenceWriteFailure> {
        self.codec.encode_to_string(sections).await
    }

    /// Synchronous write of already-encoded record text.
    pub fn write_slot(
        &self,
        identity: &Identity,
        slot: StorageSlot,
        text: &str,
    ) -> Result<(), PersistenceWriteFailure> {
        let key = self.keys.key(identity, slot);
        self.storage
            .set(identity.scope(), &key, text)
            .map_err(PersistenceWriteFailure::from)?;
        debug!(key = %key, bytes = text.len(), "device record written");
        Ok(())
    }

    /// Load the primary record, falling back to the autosave record.
    pub fn load(&self, identity: &Identity) -> Option<Vec<Section>> {
        self.load_slot(identity, StorageSlot::Primary)
            .or_else(|| self.load_slot(identity, StorageSlot::Autosave))
    }

    pub fn load_autosave(&self, identity: &Identity) -> Option<Vec<Section>> {
        self.load_slot(identity, StorageSlot::Autosave)
    }

    fn load_slot(&self, identity: &Identity, slot: StorageSlot) -> Option<Vec<Section>> {
        self.load_record(identity, slot)
            .map(|record| self.codec.decode(record))
    }

    /// Validated record of one slot, without materialising media.
    pub fn load_record(&self, identity: &Identity, slot: StorageSlot) -> Option<StoredProjectRecord> {
        let text = self.read_slot(identity, slot)?;
        match SectionSnapshotCodec::validate(&text) {
            Ok(validated) => Some(validated.record),
            Err(error) => {
                warn!(namespace = identity.namespace(), ?slot, error = %error, "ignoring unreadable device record");
                None
            }
        }
    }

    /// Preferred record the way [`load`](Self::load) picks it.
    pub fn load_preferred_record(&self, identity: &Identity) -> Option<StoredProjectRecord> {
        self.load_record(identity, StorageSlot::Primary)
            .or_else(|| self.load_record(identity, StorageSlot::Autosave))
    }

    fn read_slot(&self, identity: &Identity, slot: StorageSlot) -> Option<String> {
        let key = self.keys.key(identity, slot);
        match self.storage.get(identity.scope(), &key) {
            Ok(text) => text,
            Err(error) => {
                warn!(key = %key, error = %error, "device storage read failed");
                None
            }
        }
    }

    pub fn has_saved_data(&self, identity: &Identity) -> bool {
        [StorageSlot::Primary, StorageSlot::Autosave]
            .into_iter()
            .any(|slot| self.read_slot(identity, slot).is_some())
    }

    /// Cancel any pending autosave for `identity`, then remove both records.
    pub fn clear(&self, identity: &Identity) -> Result<(), PersistenceWriteFailure> {
        if self.timer.cancel_for(identity) {
            debug!(namespace = identity.namespace(), "pending autosave cancelled by clear");
        }
        for slot in [StorageSlot::Primary, StorageSlot::Autosave] {
            let key = self.keys.key(identity, slot);
            self.storage
                .remove(identity.scope(), &key)
                .map_err(PersistenceWriteFailure::from)?;
        }
        info!(namespace = identity.namespace(), "device records cleared");
        Ok(())
    }

    /// Newest `savedAt` across both slots.
    pub fn last_saved_at(&self, identity: &Identity) -> Option<DateTime<Utc>> {
        [StorageSlot::Primary, StorageSlot::Autosave]
            .into_iter()
            .filter_map(|slot| self.load_record(identity, slot))
            .map(|record| record.saved_at)
            .max()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use ps_core::errors::DeviceStorageError;
    use ps_core::identity::StorageScope;
    use ps_core::ports::mocks::{MockClock, MockDeviceStorage, MockEphemeralMedia};
    use ps_core::ports::ClockPort;
    use ps_core::section::{DurableUrl, EphemeralHandle, MediaReference};
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MapStorage {
        entries: Mutex<HashMap<(StorageScope, String), String>>,
    }

    impl DeviceStoragePort for MapStorage {
        fn get(&self, scope: StorageScope, key: &str) -> Result<Option<String>, DeviceStorageError> {
            Ok(self.entries.lock().unwrap().get(&(scope, key.to_string())).cloned())
        }

        fn set(&self, scope: StorageScope, key: &str, value: &str) -> Result<(), DeviceStorageError> {
            self.entries
                .lock()
                .unwrap()
                .insert((scope, key.to_string()), value.to_string());
            Ok(())
        }

        fn remove(&self, scope: StorageScope, key: &str) -> Result<(), DeviceStorageError> {
            self.entries.lock().unwrap().remove(&(scope, key.to_string()));
            Ok(())
        }
    }

    fn fixed_clock(at: DateTime<Utc>) -> Arc<dyn ClockPort> {
        let mut clock = MockClock::new();
        clock.expect_now().returning(move || at);
        Arc::new(clock)
    }

    fn store_with(
        storage: Arc<dyn DeviceStoragePort>,
        ephemeral: MockEphemeralMedia,
        at: DateTime<Utc>,
    ) -> DevicePersistenceStore {
        let codec = SectionSnapshotCodec::new(Arc::new(ephemeral), fixed_clock(at));
        DevicePersistenceStore::new(storage, Arc::new(codec), StorageKeys::default())
    }

    fn sections(label: &str) -> Vec<Section> {
        vec![Section::new("text").with_id(label).with_field("label", label)]
    }

    #[tokio::test]
    async fn anonymous_saves_go_to_session_scope() {
        let storage = Arc::new(MapStorage::default());
        let store = store_with(storage.clone(), MockEphemeralMedia::new(), Utc::now());

        assert!(store.save(&sections("a"), &Identity::Anonymous).await);
        let entries = storage.entries.lock().unwrap();
        assert!(entries.contains_key(&(StorageScope::Session, "pagesync:anonymous:project".to_string())));
        assert!(!entries.keys().any(|(scope, _)| *scope == StorageScope::Durable));
    }

    #[tokio::test]
    async fn load_prefers_primary_and_falls_back_to_autosave() {
        let storage = Arc::new(MapStorage::default());
        let store = store_with(storage, MockEphemeralMedia::new(), Utc::now());
        let user = Identity::authenticated("u-1");

        assert!(store.load(&user).is_none());
        store.save_autosave(&sections("auto"), &user).await.unwrap();
        assert_eq!(store.load(&user).unwrap()[0].id.as_str(), "auto");

        store.try_save(&sections("primary"), &user).await.unwrap();
        assert_eq!(store.load(&user).unwrap()[0].id.as_str(), "primary");
        assert_eq!(store.load_autosave(&user).unwrap()[0].id.as_str(), "auto");
        assert!(store.has_saved_data(&user));
        assert!(!store.has_saved_data(&Identity::Anonymous));
    }

    #[tokio::test]
    async fn corrupted_primary_falls_back_to_autosave() {
        let storage = Arc::new(MapStorage::default());
        let store = store_with(storage.clone(), MockEphemeralMedia::new(), Utc::now());
        let user = Identity::authenticated("u-1");
        store.save_autosave(&sections("auto"), &user).await.unwrap();
        storage
            .set(StorageScope::Durable, "pagesync:u-1:project", "{broken")
            .unwrap();

        assert_eq!(store.load(&user).unwrap()[0].id.as_str(), "auto");
    }

    #[tokio::test]
    async fn clear_removes_both_slots() {
        let storage = Arc::new(MapStorage::default());
        let store = store_with(storage.clone(), MockEphemeralMedia::new(), Utc::now());
        let user = Identity::authenticated("u-1");
        store.try_save(&sections("p"), &user).await.unwrap();
        store.save_autosave(&sections("a"), &user).await.unwrap();

        store.clear(&user).unwrap();
        assert!(!store.has_saved_data(&user));
        assert!(store.last_saved_at(&user).is_none());
        assert!(storage.entries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn last_saved_at_is_newest_across_slots() {
        let storage: Arc<dyn DeviceStoragePort> = Arc::new(MapStorage::default());
        let early = Utc::now() - Duration::minutes(10);
        let late = Utc::now();
        let user = Identity::authenticated("u-1");

        store_with(storage.clone(), MockEphemeralMedia::new(), late)
            .save_autosave(&sections("a"), &user)
            .await
            .unwrap();
        let store = store_with(storage, MockEphemeralMedia::new(), early);
        store.try_save(&sections("p"), &user).await.unwrap();

        let newest = store.last_saved_at(&user).unwrap();
        assert_eq!(newest.timestamp_millis(), late.timestamp_millis());
    }

    #[tokio::test]
    async fn quota_failure_is_reported_with_capacity_hint() {
        let mut storage = MockDeviceStorage::new();
        storage
            .expect_set()
            .returning(|_, _, _| Err(DeviceStorageError::QuotaExceeded));
        let store = store_with(Arc::new(storage), MockEphemeralMedia::new(), Utc::now());

        let failure = store
            .try_save(&sections("big"), &Identity::Anonymous)
            .await
            .unwrap_err();
        assert_eq!(failure, PersistenceWriteFailure::CapacityExceeded);
        assert!(failure.remediation().contains("free space"));
        assert!(!store.save(&sections("big"), &Identity::Anonymous).await);
    }

    #[tokio::test]
    async fn stored_text_never_contains_ephemeral_handles() {
        let storage = Arc::new(MapStorage::default());
        let mut ephemeral = MockEphemeralMedia::new();
        ephemeral
            .expect_read()
            .returning(|_| Ok(ps_core::section::EmbeddedMedia::new("image/png", vec![1])));
        let store = store_with(storage.clone(), ephemeral, Utc::now());

        let handle = EphemeralHandle::generate();
        let durable = DurableUrl::parse("https://cdn.example.com/x.png").unwrap();
        let page = vec![
            Section::new("hero").with_media(handle.clone().into()),
            Section::new("logo").with_media(durable.into()),
            Section::new("bad").with_media(MediaReference::Malformed("blob:".into())),
        ];
        store.try_save(&page, &Identity::Anonymous).await.unwrap();
        store.save_autosave(&page, &Identity::Anonymous).await.unwrap();

        for value in storage.entries.lock().unwrap().values() {
            assert!(!value.contains("blob:"), "leaked handle in {value}");
        }
    }
}
