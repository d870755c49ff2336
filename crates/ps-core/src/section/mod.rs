//! Section domain: the page's building blocks, their media references, and
//! the device-local record they are persisted as.

pub mod embedded;
pub mod media;
pub mod record;
#[allow(clippy::module_inception)]
mod section;

pub use embedded::{is_data_url, EmbeddedMedia};
pub use media::{DurableUrl, EphemeralHandle, InvalidDurableUrl, MediaKind, MediaReference};
pub use record::{StorableSection, StoredProjectRecord, ValidatedRecord, RECORD_SCHEMA_VERSION};
pub use section::{Section, SectionsSnapshot};
