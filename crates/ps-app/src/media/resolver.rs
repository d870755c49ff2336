//! # Media Handle Resolver
//!
//! Classifies section media and promotes ephemeral handles to durable URLs
//! through the object store.
//!
//! Promotion never fails a batch: a section whose media cannot be promoted
//! keeps its content and loses only its media, and the failure is reported.

use std::sync::Arc;

use futures::future::join_all;
use ps_core::errors::PromotionError;
use ps_core::ids::{ProjectId, SectionId, UserId};
use ps_core::ports::{ClockPort, EphemeralMediaPort, ObjectStorePort};
use ps_core::project::MediaUpload;
use ps_core::section::{DurableUrl, EphemeralHandle, MediaKind, MediaReference, Section};
use tracing::{debug, info, warn};

use super::file_name::media_file_name;

/// One section whose media could not be promoted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromotionFailure {
    pub section_id: SectionId,
    pub error: PromotionError,
}

/// Outcome of promoting every ephemeral reference in a section list.
#[derive(Debug, Clone, PartialEq)]
pub struct PromotionReport {
    /// Every input section, in input order.
    pub sections: Vec<Section>,
    pub promoted: usize,
    pub failed_count: usize,
    pub failures: Vec<PromotionFailure>,
}

impl PromotionReport {
    pub fn has_failures(&self) -> bool {
        self.failed_count > 0
    }
}

pub struct MediaHandleResolver {
    ephemeral: Arc<dyn EphemeralMediaPort>,
    object_store: Arc<dyn ObjectStorePort>,
    clock: Arc<dyn ClockPort>,
}

impl MediaHandleResolver {
    pub fn new(
        ephemeral: Arc<dyn EphemeralMediaPort>,
        object_store: Arc<dyn ObjectStorePort>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        Self {
            ephemeral,
            object_store,
            clock,
        }
    }

    pub fn classify(&self, reference: &MediaReference) -> MediaKind {
        reference.kind()
    }

    /// Classify raw editor text. Bare handle ids known to the registry count
    /// as ephemeral even without the `blob:` scheme.
    pub fn classify_raw(&self, raw: &str) -> MediaReference {
        match MediaReference::from_raw(raw) {
            MediaReference::Malformed(text) => {
                match EphemeralHandle::parse(&format!("blob:{text}")) {
                    Some(handle) if self.ephemeral.contains(&handle) => {
                        MediaReference::Ephemeral(handle)
                    }
                    _ => MediaReference::Malformed(text),
                }
            }
            other => other,
        }
    }

    /// Upload the bytes behind `handle` and return their durable URL.
    ///
    /// The handle is released whether or not the upload succeeds.
    pub async fn promote(
        &self,
        handle: &EphemeralHandle,
        owner: &UserId,
        project_id: Option<&ProjectId>,
    ) -> Result<DurableUrl, PromotionError> {
        let result = self.upload(handle, owner, project_id).await;
        self.ephemeral.release(handle);
        result
    }

    async fn upload(
        &self,
        handle: &EphemeralHandle,
        owner: &UserId,
        project_id: Option<&ProjectId>,
    ) -> Result<DurableUrl, PromotionError> {
        let media = self
            .ephemeral
            .read(handle)
            .await
            .map_err(|e| PromotionError::HandleUnavailable(e.to_string()))?;

        let file_name =
            media_file_name(self.clock.now_ms(), &media.content_type, &mut rand::thread_rng());
        let upload = MediaUpload {
            owner_id: owner.clone(),
            project_id: project_id.cloned(),
            file_name,
            content_type: media.content_type,
            bytes: media.bytes,
        };

        let asset = self
            .object_store
            .put(upload)
            .await
            .map_err(|e| PromotionError::Upload(e.to_string()))?;

        match MediaReference::from_raw(asset.url.as_str()) {
            MediaReference::Durable(url) => {
                debug!(handle = %handle, url = %url, "media promoted");
                Ok(url)
            }
            _ => Err(PromotionError::InvalidUrl(asset.url.to_string())),
        }
    }

    /// Promote every ephemeral reference concurrently.
    ///
    /// Sections without ephemeral media pass through untouched; sections whose
    /// promotion failed come back with no media.
    pub async fn promote_all(
        &self,
        sections: &[Section],
        owner: &UserId,
        project_id: Option<&ProjectId>,
    ) -> PromotionReport {
        let outcomes = join_all(sections.iter().map(|section| async move {
            match section.media.as_ephemeral() {
                Some(handle) => Some(self.promote(handle, owner, project_id).await),
                None => None,
            }
        }))
        .await;

        let mut report = PromotionReport {
            sections: Vec::with_capacity(sections.len()),
            promoted: 0,
            failed_count: 0,
            failures: Vec::new(),
        };

        for (section, outcome) in sections.iter().zip(outcomes) {
            let mut section = section.clone();
            match outcome {
                None => {}
                Some(Ok(url)) => {
                    section.media = MediaReference::Durable(url);
                    report.promoted += 1;
                }
                Some(Err(error)) => {
                    warn!(section_id = %section.id, error = %error, "media promotion failed; dropping media");
                    section.media = MediaReference::None;
                    report.failed_count += 1;
                    report.failures.push(PromotionFailure {
                        section_id: section.id.clone(),
                        error,
                    });
                }
            }
            report.sections.push(section);
        }

        if report.promoted > 0 || report.failed_count > 0 {
            info!(
                promoted = report.promoted,
                failed = report.failed_count,
                "media promotion finished"
            );
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use ps_core::errors::RemoteStoreError;
    use ps_core::ports::mocks::{MockClock, MockEphemeralMedia, MockObjectStore};
    use ps_core::project::MediaAsset;
    use ps_core::section::EmbeddedMedia;

    fn clock() -> Arc<dyn ClockPort> {
        let mut clock = MockClock::new();
        clock
            .expect_now()
            .returning(|| Utc.timestamp_millis_opt(1_700_000_000_000).unwrap());
        Arc::new(clock)
    }

    fn asset_for(upload: &MediaUpload) -> MediaAsset {
        MediaAsset {
            owner_id: upload.owner_id.clone(),
            project_id: upload.project_id.clone(),
            size_bytes: upload.bytes.len() as u64,
            content_type: upload.content_type.clone(),
            url: DurableUrl::parse(&format!("https://cdn.test/{}", upload.object_path())).unwrap(),
            path: upload.object_path(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn promote_uploads_and_releases_handle() {
        let handle = EphemeralHandle::generate();
        let mut ephemeral = MockEphemeralMedia::new();
        ephemeral
            .expect_read()
            .returning(|_| Ok(EmbeddedMedia::new("image/png", vec![1, 2])));
        ephemeral.expect_release().times(1).return_const(());

        let mut store = MockObjectStore::new();
        store
            .expect_put()
            .withf(|upload| {
                upload.file_name.starts_with("1700000000000-")
                    && upload.file_name.ends_with(".png")
                    && upload.owner_id.as_str() == "u-1"
            })
            .times(1)
            .returning(|upload| Ok(asset_for(&upload)));

        let resolver = MediaHandleResolver::new(Arc::new(ephemeral), Arc::new(store), clock());
        let url = resolver
            .promote(&handle, &UserId::from("u-1"), None)
            .await
            .unwrap();
        assert!(url.as_str().starts_with("https://cdn.test/u-1/1700000000000-"));
    }

    #[tokio::test]
    async fn failed_upload_still_releases_handle() {
        let mut ephemeral = MockEphemeralMedia::new();
        ephemeral
            .expect_read()
            .returning(|_| Ok(EmbeddedMedia::new("image/gif", vec![0])));
        ephemeral.expect_release().times(1).return_const(());

        let mut store = MockObjectStore::new();
        store
            .expect_put()
            .returning(|_| Err(RemoteStoreError::Transport("503".into())));

        let resolver = MediaHandleResolver::new(Arc::new(ephemeral), Arc::new(store), clock());
        let err = resolver
            .promote(&EphemeralHandle::generate(), &UserId::from("u"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, PromotionError::Upload(msg) if msg.contains("503")));
    }

    #[tokio::test]
    async fn missing_handle_is_unavailable() {
        let mut ephemeral = MockEphemeralMedia::new();
        ephemeral
            .expect_read()
            .returning(|_| Err(anyhow::anyhow!("gone")));
        ephemeral.expect_release().return_const(());
        let mut store = MockObjectStore::new();
        store.expect_put().never();

        let resolver = MediaHandleResolver::new(Arc::new(ephemeral), Arc::new(store), clock());
        let err = resolver
            .promote(&EphemeralHandle::generate(), &UserId::from("u"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, PromotionError::HandleUnavailable(_)));
    }

    #[tokio::test]
    async fn promote_all_tolerates_partial_failure() {
        let good = EphemeralHandle::generate();
        let bad = EphemeralHandle::generate();
        let bad_for_read = bad.clone();

        let mut ephemeral = MockEphemeralMedia::new();
        ephemeral.expect_read().returning(move |handle| {
            if *handle == bad_for_read {
                Err(anyhow::anyhow!("revoked"))
            } else {
                Ok(EmbeddedMedia::new("image/jpeg", vec![9; 4]))
            }
        });
        ephemeral.expect_release().times(2).return_const(());

        let mut store = MockObjectStore::new();
        store.expect_put().returning(|upload| Ok(asset_for(&upload)));

        let durable = DurableUrl::parse("https://example.com/a.png").unwrap();
        let sections = vec![
            Section::new("hero").with_id("s1").with_media(good.into()),
            Section::new("text").with_id("s2"),
            Section::new("gallery").with_id("s3").with_media(bad.into()),
            Section::new("footer")
                .with_id("s4")
                .with_media(durable.clone().into()),
        ];

        let resolver = MediaHandleResolver::new(Arc::new(ephemeral), Arc::new(store), clock());
        let report = resolver
            .promote_all(&sections, &UserId::from("u"), None)
            .await;

        assert_eq!(report.sections.len(), 4);
        assert_eq!(report.promoted, 1);
        assert_eq!(report.failed_count, 1);
        assert_eq!(report.failures[0].section_id.as_str(), "s3");
        let ids: Vec<&str> = report.sections.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["s1", "s2", "s3", "s4"]);
        assert!(matches!(report.sections[0].media, MediaReference::Durable(_)));
        assert_eq!(report.sections[1].media, MediaReference::None);
        assert_eq!(report.sections[2].media, MediaReference::None);
        assert_eq!(report.sections[3].media, MediaReference::Durable(durable));
        assert!(report.sections.iter().all(|s| s.media.is_persistable()));
    }

    #[test]
    fn classify_raw_recognises_registered_bare_ids() {
        let mut ephemeral = MockEphemeralMedia::new();
        ephemeral
            .expect_contains()
            .returning(|handle| handle.as_str() == "blob:known-id");
        let resolver = MediaHandleResolver::new(
            Arc::new(ephemeral),
            Arc::new(MockObjectStore::new()),
            clock(),
        );

        assert!(resolver.classify_raw("known-id").is_ephemeral());
        assert_eq!(
            resolver.classify_raw("unknown-id").kind(),
            MediaKind::Malformed
        );
        assert_eq!(resolver.classify_raw("").kind(), MediaKind::None);
        assert_eq!(
            resolver.classify(&MediaReference::from_raw("https://a.b/c.png")),
            MediaKind::Durable
        );
    }
}
