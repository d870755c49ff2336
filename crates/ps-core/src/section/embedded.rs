//! Self-describing binary-safe text for media embedded in device records.
//!
//! Format: `data:<content-type>;base64,<payload>`.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::errors::DecodeError;

pub const DATA_URL_PREFIX: &str = "data:";
const BASE64_MARKER: &str = ";base64,";
const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Bytes plus the content type needed to rebuild them into a handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedMedia {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl EmbeddedMedia {
    pub fn new(content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            content_type: content_type.into(),
            bytes,
        }
    }

    pub fn to_data_url(&self) -> String {
        let content_type = if self.content_type.trim().is_empty() {
            FALLBACK_CONTENT_TYPE
        } else {
            self.content_type.trim()
        };
        format!(
            "{DATA_URL_PREFIX}{content_type}{BASE64_MARKER}{}",
            STANDARD.encode(&self.bytes)
        )
    }

    pub fn parse_data_url(text: &str) -> Result<Self, DecodeError> {
        let rest = text
            .strip_prefix(DATA_URL_PREFIX)
            .ok_or_else(|| DecodeError::EmbeddedMedia("missing data: prefix".to_string()))?;
        let (content_type, payload) = rest
            .split_once(BASE64_MARKER)
            .ok_or_else(|| DecodeError::EmbeddedMedia("payload is not base64".to_string()))?;
        let bytes = STANDARD
            .decode(payload.trim())
            .map_err(|e| DecodeError::EmbeddedMedia(e.to_string()))?;
        let content_type = if content_type.is_empty() {
            FALLBACK_CONTENT_TYPE.to_string()
        } else {
            content_type.to_string()
        };
        Ok(Self {
            content_type,
            bytes,
        })
    }
}

pub fn is_data_url(text: &str) -> bool {
    text.starts_with(DATA_URL_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_url_round_trips_bytes_and_type() {
        let media = EmbeddedMedia::new("image/png", vec![0x89, 0x50, 0x4e, 0x47, 0x00, 0xff]);
        let text = media.to_data_url();
        assert!(text.starts_with("data:image/png;base64,"));
        assert_eq!(EmbeddedMedia::parse_data_url(&text).unwrap(), media);
    }

    #[test]
    fn parse_rejects_corrupted_payloads() {
        assert!(EmbeddedMedia::parse_data_url("data:image/png;base64,***").is_err());
        assert!(EmbeddedMedia::parse_data_url("data:image/png,plain").is_err());
        assert!(EmbeddedMedia::parse_data_url("https://example.com/a.png").is_err());
    }

    #[test]
    fn empty_content_type_falls_back_to_octet_stream() {
        let text = EmbeddedMedia::new("", vec![1, 2, 3]).to_data_url();
        let parsed = EmbeddedMedia::parse_data_url(&text).unwrap();
        assert_eq!(parsed.content_type, "application/octet-stream");
    }
}
