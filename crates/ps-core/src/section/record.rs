//! Device-local persisted form of a section list.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::DecodeError;
use crate::ids::SectionId;

pub const RECORD_SCHEMA_VERSION: u32 = 1;

/// Section whose media field is self-contained text.
///
/// `media` holds either an embedded `data:` URL or durable URL text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorableSection {
    pub id: SectionId,
    pub layout: String,
    #[serde(default)]
    pub fields: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredProjectRecord {
    pub version: u32,
    pub saved_at: DateTime<Utc>,
    pub sections: Vec<StorableSection>,
}

/// Outcome of validating a stored record: the usable record plus how many
/// structurally invalid sections were skipped.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRecord {
    pub record: StoredProjectRecord,
    pub skipped_sections: usize,
}

impl StoredProjectRecord {
    pub fn new(saved_at: DateTime<Utc>, sections: Vec<StorableSection>) -> Self {
        Self {
            version: RECORD_SCHEMA_VERSION,
            saved_at,
            sections,
        }
    }

    pub fn to_json(&self) -> Result<String, DecodeError> {
        serde_json::to_string(self).map_err(|e| DecodeError::Malformed(e.to_string()))
    }

    /// Parse and shape-check stored text without trusting its structure.
    pub fn validate_str(text: &str) -> Result<ValidatedRecord, DecodeError> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| DecodeError::Malformed(e.to_string()))?;
        Self::validate_value(value)
    }

    pub fn validate_value(value: Value) -> Result<ValidatedRecord, DecodeError> {
        let Value::Object(mut object) = value else {
            return Err(DecodeError::Shape("record is not an object".to_string()));
        };

        let version = object
            .get("version")
            .and_then(Value::as_u64)
            .ok_or_else(|| DecodeError::Shape("missing numeric version".to_string()))?;
        if version == 0 || version > u64::from(RECORD_SCHEMA_VERSION) {
            return Err(DecodeError::UnsupportedVersion(version));
        }

        let saved_at = object
            .get("savedAt")
            .and_then(Value::as_str)
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|dt| dt.with_timezone(&Utc))
            .ok_or_else(|| DecodeError::Shape("missing or invalid savedAt".to_string()))?;

        let Some(Value::Array(raw_sections)) = object.remove("sections") else {
            return Err(DecodeError::Shape("sections is not an array".to_string()));
        };

        let total = raw_sections.len();
        let sections: Vec<StorableSection> = raw_sections
            .into_iter()
            .filter_map(|raw| serde_json::from_value::<StorableSection>(raw).ok())
            .collect();
        let skipped_sections = total - sections.len();

        Ok(ValidatedRecord {
            record: StoredProjectRecord {
                version: version as u32,
                saved_at,
                sections,
            },
            skipped_sections,
        })
    }
}
