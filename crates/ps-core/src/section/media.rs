//! Media references carried by sections.
//!
//! A section holds at most one media reference. Only `None` and `Durable`
//! may ever reach a persisted store; `Ephemeral` handles are process-local
//! and must be embedded (device storage) or promoted (remote storage) first.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Scheme prefix used by process-local media handles.
pub const EPHEMERAL_SCHEME: &str = "blob:";

/// Process-local reference to in-memory binary data.
///
/// Valid only for the lifetime of the session that registered it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EphemeralHandle(String);

impl EphemeralHandle {
    /// Generate a fresh handle in the `blob:` namespace.
    pub fn generate() -> Self {
        Self(format!("{EPHEMERAL_SCHEME}pagesync/{}", uuid::Uuid::new_v4()))
    }

    /// Wrap raw handle text; returns `None` unless it carries the `blob:` scheme.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.len() > EPHEMERAL_SCHEME.len() && trimmed.starts_with(EPHEMERAL_SCHEME) {
            Some(Self(trimmed.to_string()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for EphemeralHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A stable, remotely-resolvable media address (absolute http/https URL).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DurableUrl(String);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("not a durable media url: {0}")]
pub struct InvalidDurableUrl(pub String);

impl DurableUrl {
    pub fn parse(raw: &str) -> Result<Self, InvalidDurableUrl> {
        let trimmed = raw.trim();
        let parsed =
            url::Url::parse(trimmed).map_err(|_| InvalidDurableUrl(trimmed.to_string()))?;
        let scheme_ok = matches!(parsed.scheme(), "http" | "https");
        if !scheme_ok || parsed.host_str().map_or(true, str::is_empty) {
            return Err(InvalidDurableUrl(trimmed.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for DurableUrl {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for DurableUrl {
    type Error = InvalidDurableUrl;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<DurableUrl> for String {
    fn from(value: DurableUrl) -> Self {
        value.0
    }
}

/// Discriminated media reference of a section.
///
/// `Malformed` keeps text that is neither a handle nor a durable URL so that
/// persisting paths can drop it explicitly instead of trusting it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum MediaReference {
    #[default]
    None,
    Ephemeral(EphemeralHandle),
    Durable(DurableUrl),
    Malformed(String),
}

/// Classification result, without the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    None,
    Ephemeral,
    Durable,
    Malformed,
}

impl MediaReference {
    /// Classify raw reference text as it arrives from the editor.
    pub fn from_raw(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return MediaReference::None;
        }
        if let Some(handle) = EphemeralHandle::parse(trimmed) {
            return MediaReference::Ephemeral(handle);
        }
        match DurableUrl::parse(trimmed) {
            Ok(url) => MediaReference::Durable(url),
            Err(_) => MediaReference::Malformed(trimmed.to_string()),
        }
    }

    pub fn kind(&self) -> MediaKind {
        match self {
            MediaReference::None => MediaKind::None,
            MediaReference::Ephemeral(_) => MediaKind::Ephemeral,
            MediaReference::Durable(_) => MediaKind::Durable,
            MediaReference::Malformed(_) => MediaKind::Malformed,
        }
    }

    pub fn is_ephemeral(&self) -> bool {
        matches!(self, MediaReference::Ephemeral(_))
    }

    /// Whether this reference may be written to any persisted store as-is.
    pub fn is_persistable(&self) -> bool {
        matches!(self, MediaReference::None | MediaReference::Durable(_))
    }

    pub fn as_ephemeral(&self) -> Option<&EphemeralHandle> {
        match self {
            MediaReference::Ephemeral(handle) => Some(handle),
            _ => None,
        }
    }
}

impl From<DurableUrl> for MediaReference {
    fn from(value: DurableUrl) -> Self {
        MediaReference::Durable(value)
    }
}

impl From<EphemeralHandle> for MediaReference {
    fn from(value: EphemeralHandle) -> Self {
        MediaReference::Ephemeral(value)
    }
}
