use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::ops::Deref;
use std::sync::Arc;

use crate::ids::SectionId;
use crate::section::media::MediaReference;

/// One visual block of the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub id: SectionId,
    /// Layout variant tag understood by the renderer catalogue.
    pub layout: String,
    /// Layout-specific fields (headline, copy, colours, ...).
    #[serde(default)]
    pub fields: Map<String, Value>,
    #[serde(default)]
    pub media: MediaReference,
}

impl Section {
    pub fn new(layout: impl Into<String>) -> Self {
        Self {
            id: SectionId::generate(),
            layout: layout.into(),
            fields: Map::new(),
            media: MediaReference::None,
        }
    }

    pub fn with_id(mut self, id: impl Into<SectionId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn with_media(mut self, media: MediaReference) -> Self {
        self.media = media;
        self
    }
}

/// Immutable copy of the section list at one point in time.
///
/// Cloning is cheap; every consumer (history, autosave, remote save) reads the
/// same frozen value instead of shared mutable state.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionsSnapshot(Arc<[Section]>);

impl Default for SectionsSnapshot {
    fn default() -> Self {
        Self(Arc::from(Vec::new()))
    }
}

impl SectionsSnapshot {
    pub fn new(sections: Vec<Section>) -> Self {
        Self(Arc::from(sections))
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn sections(&self) -> &[Section] {
        &self.0
    }

    pub fn to_vec(&self) -> Vec<Section> {
        self.0.to_vec()
    }

    /// Whether two snapshots share the same allocation.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Deref for SectionsSnapshot {
    type Target = [Section];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<Section>> for SectionsSnapshot {
    fn from(value: Vec<Section>) -> Self {
        Self::new(value)
    }
}

impl FromIterator<Section> for SectionsSnapshot {
    fn from_iter<T: IntoIterator<Item = Section>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_clones_share_storage() {
        let snapshot = SectionsSnapshot::new(vec![Section::new("hero"), Section::new("footer")]);
        let clone = snapshot.clone();
        assert!(snapshot.ptr_eq(&clone));
        assert_eq!(clone.len(), 2);
        assert_eq!(clone[1].layout, "footer");
    }

    #[test]
    fn section_builder_sets_fields() {
        let section = Section::new("hero")
            .with_id("s-1")
            .with_field("headline", "Ship faster");
        assert_eq!(section.id.as_str(), "s-1");
        assert_eq!(section.fields["headline"], "Ship faster");
        assert_eq!(section.media, MediaReference::None);
    }
}
