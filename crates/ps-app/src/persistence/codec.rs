//! # Section Snapshot Codec
//!
//! Converts between live sections and the self-contained
//! [`StoredProjectRecord`] kept in device storage.
//!
//! | live media         | stored `media` text                 |
//! |--------------------|-------------------------------------|
//! | `Ephemeral(handle)`| `data:<content-type>;base64,<bytes>`|
//! | `Durable(url)`     | the URL text                        |
//! | `None`/`Malformed` | omitted                             |
//!
//! Decoding registers embedded bytes under a fresh handle, since handles
//! from a previous session are meaningless after reload.

use std::sync::Arc;

use ps_core::errors::{DecodeError, PersistenceWriteFailure};
use ps_core::ports::{ClockPort, EphemeralMediaPort};
use ps_core::section::{
    is_data_url, EmbeddedMedia, MediaReference, Section, StorableSection, StoredProjectRecord,
    ValidatedRecord,
};
use tracing::{debug, warn};

pub struct SectionSnapshotCodec {
    ephemeral: Arc<dyn EphemeralMediaPort>,
    clock: Arc<dyn ClockPort>,
}

impl SectionSnapshotCodec {
    pub fn new(ephemeral: Arc<dyn EphemeralMediaPort>, clock: Arc<dyn ClockPort>) -> Self {
        Self { ephemeral, clock }
    }

    pub async fn encode(&self, sections: &[Section]) -> StoredProjectRecord {
        let mut storable = Vec::with_capacity(sections.len());
        for section in sections {
            storable.push(StorableSection {
                id: section.id.clone(),
                layout: section.layout.clone(),
                fields: section.fields.clone(),
                media: self.encode_media(section).await,
            });
        }
        StoredProjectRecord::new(self.clock.now(), storable)
    }

    pub async fn encode_to_string(
        &self,
        sections: &[Section],
    ) -> Result<String, PersistenceWriteFailure> {
        self.encode(sections)
            .await
            .to_json()
            .map_err(|e| PersistenceWriteFailure::Encode(e.to_string()))
    }

    async fn encode_media(&self, section: &Section) -> Option<String> {
        match &section.media {
            MediaReference::None => None,
            MediaReference::Durable(url) => Some(url.to_string()),
            MediaReference::Ephemeral(handle) => match self.ephemeral.read(handle).await {
                Ok(media) => Some(media.to_data_url()),
                Err(e) => {
                    warn!(section_id = %section.id, error = %e, "ephemeral media unreadable; storing section without media");
                    None
                }
            },
            MediaReference::Malformed(raw) => {
                debug!(section_id = %section.id, raw = %raw, "dropping malformed media reference");
                None
            }
        }
    }

    pub fn decode(&self, record: StoredProjectRecord) -> Vec<Section> {
        record
            .sections
            .into_iter()
            .map(|stored| {
                let media = stored
                    .media
                    .as_deref()
                    .map(|text| self.decode_media(&stored.id.to_string(), text))
                    .unwrap_or_default();
                Section {
                    id: stored.id,
                    layout: stored.layout,
                    fields: stored.fields,
                    media,
                }
            })
            .collect()
    }

    /// Validate and decode stored text; structural mismatch yields an empty list.
    pub fn decode_str(&self, text: &str) -> Vec<Section> {
        match Self::validate(text) {
            Ok(validated) => self.decode(validated.record),
            Err(error) => {
                warn!(error = %error, "stored record rejected");
                Vec::new()
            }
        }
    }

    /// Shape-check stored text without materialising any media.
    pub fn validate(text: &str) -> Result<ValidatedRecord, DecodeError> {
        let validated = StoredProjectRecord::validate_str(text)?;
        if validated.skipped_sections > 0 {
            warn!(
                skipped = validated.skipped_sections,
                "skipped structurally invalid stored sections"
            );
        }
        Ok(validated)
    }

    fn decode_media(&self, section_id: &str, text: &str) -> MediaReference {
        if is_data_url(text) {
            return match EmbeddedMedia::parse_data_url(text) {
                Ok(media) => MediaReference::Ephemeral(self.ephemeral.register(media)),
                Err(error) => {
                    warn!(section_id, error = %error, "embedded media unreadable; section loaded without media");
                    MediaReference::None
                }
            };
        }

        match MediaReference::from_raw(text) {
            durable @ MediaReference::Durable(_) => durable,
            // A live handle from an earlier session is never trusted.
            MediaReference::Ephemeral(handle) => {
                warn!(section_id, handle = %handle, "stale ephemeral handle in stored record");
                MediaReference::None
            }
            _ => MediaReference::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use ps_core::ports::mocks::{MockClock, MockEphemeralMedia};
    use ps_core::section::{DurableUrl, EphemeralHandle};
    use serde_json::json;

    fn clock() -> Arc<dyn ClockPort> {
        let mut clock = MockClock::new();
        clock.expect_now().returning(Utc::now);
        Arc::new(clock)
    }

    fn codec_with(ephemeral: MockEphemeralMedia) -> SectionSnapshotCodec {
        SectionSnapshotCodec::new(Arc::new(ephemeral), clock())
    }

    #[tokio::test]
    async fn round_trip_for_none_and_durable_media() {
        let codec = codec_with(MockEphemeralMedia::new());
        let url = DurableUrl::parse("https://cdn.example.com/u/hero.png").unwrap();
        let sections = vec![
            Section::new("hero")
                .with_field("headline", "Hello")
                .with_media(url.clone().into()),
            Section::new("text").with_field("body", json!({"rich": true})),
        ];

        let text = codec.encode_to_string(&sections).await.unwrap();
        let decoded = codec.decode_str(&text);
        assert_eq!(decoded, sections);
    }

    #[tokio::test]
    async fn ephemeral_media_is_embedded_then_rematerialised() {
        let original = EphemeralHandle::generate();
        let fresh = EphemeralHandle::generate();
        let fresh_for_register = fresh.clone();

        let mut ephemeral = MockEphemeralMedia::new();
        ephemeral
            .expect_read()
            .returning(|_| Ok(EmbeddedMedia::new("image/png", vec![137, 80, 78, 71])));
        ephemeral
            .expect_register()
            .withf(|media| media.content_type == "image/png" && media.bytes == [137, 80, 78, 71])
            .times(1)
            .returning(move |_| fresh_for_register.clone());
        let codec = codec_with(ephemeral);

        let sections = vec![Section::new("hero").with_media(original.clone().into())];
        let text = codec.encode_to_string(&sections).await.unwrap();
        assert!(!text.contains(original.as_str()));
        assert!(text.contains("data:image/png;base64,"));

        let decoded = codec.decode_str(&text);
        assert_eq!(decoded[0].media, MediaReference::Ephemeral(fresh));
    }

    #[tokio::test]
    async fn unreadable_handle_degrades_only_that_section() {
        let mut ephemeral = MockEphemeralMedia::new();
        ephemeral
            .expect_read()
            .returning(|_| Err(anyhow::anyhow!("revoked")));
        let codec = codec_with(ephemeral);

        let sections = vec![
            Section::new("hero").with_media(EphemeralHandle::generate().into()),
            Section::new("text").with_field("body", "kept"),
        ];
        let record = codec.encode(&sections).await;
        assert_eq!(record.sections.len(), 2);
        assert!(record.sections[0].media.is_none());
        assert_eq!(record.sections[1].fields["body"], "kept");
    }

    #[test]
    fn decode_str_rejects_bad_shapes_with_empty_list() {
        let codec = codec_with(MockEphemeralMedia::new());
        assert!(codec.decode_str("not json").is_empty());
        assert!(codec.decode_str("{\"version\":1}").is_empty());
        assert!(codec
            .decode_str(&json!({"version": 99, "savedAt": "2024-01-01T00:00:00Z", "sections": []}).to_string())
            .is_empty());
    }

    #[test]
    fn decode_drops_stale_handles_and_bad_embeds() {
        let codec = codec_with(MockEphemeralMedia::new());
        let text = json!({
            "version": 1,
            "savedAt": "2024-01-01T00:00:00Z",
            "sections": [
                {"id": "a", "layout": "hero", "media": "blob:pagesync/old"},
                {"id": "b", "layout": "hero", "media": "data:image/png;base64,@@@"},
                {"id": "c", "layout": "hero", "media": "ftp://nope"},
                {"id": "d", "layout": 5}
            ]
        })
        .to_string();

        let decoded = codec.decode_str(&text);
        assert_eq!(decoded.len(), 3);
        assert!(decoded.iter().all(|s| s.media == MediaReference::None));
    }
}
