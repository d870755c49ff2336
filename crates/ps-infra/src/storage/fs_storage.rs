use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use ps_core::errors::DeviceStorageError;
use ps_core::identity::StorageScope;
use ps_core::ports::DeviceStoragePort;
use tracing::{debug, warn};

const RECORD_EXTENSION: &str = "rec";

/// File-backed device storage: one file per key under `<root>/<scope>/`.
///
/// Writes go to a temporary sibling first and are renamed into place, so a
/// reader sees either the previous value or the complete new one.
#[derive(Debug, Clone)]
pub struct FsDeviceStorage {
    root: PathBuf,
    capacity_bytes: Option<u64>,
}

impl FsDeviceStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            capacity_bytes: None,
        }
    }

    pub fn with_capacity(mut self, capacity_bytes: u64) -> Self {
        self.capacity_bytes = Some(capacity_bytes);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn scope_dir(&self, scope: StorageScope) -> PathBuf {
        let name = match scope {
            StorageScope::Session => "session",
            StorageScope::Durable => "durable",
        };
        self.root.join(name)
    }

    fn key_path(&self, scope: StorageScope, key: &str) -> PathBuf {
        let file_name = format!("{}.{RECORD_EXTENSION}", URL_SAFE_NO_PAD.encode(key));
        self.scope_dir(scope).join(file_name)
    }

    fn used_bytes_excluding(&self, dir: &Path, exclude: &Path) -> Result<u64, DeviceStorageError> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(unavailable("scan storage dir", dir, e)),
        };

        let mut used = 0;
        for entry in entries.flatten() {
            let path = entry.path();
            if path == exclude
                || path.extension().and_then(|e| e.to_str()) != Some(RECORD_EXTENSION)
            {
                continue;
            }
            used += entry.metadata().map(|m| m.len()).unwrap_or(0);
        }
        Ok(used)
    }

    fn atomic_write(&self, path: &Path, value: &str) -> Result<(), DeviceStorageError> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|e| unavailable("create storage dir", dir, e))?;
        }

        let tmp_path = path.with_extension("rec.tmp");
        fs::write(&tmp_path, value).map_err(|e| map_write_error(&tmp_path, e))?;
        fs::rename(&tmp_path, path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            unavailable("rename temp record", path, e)
        })?;
        Ok(())
    }
}

impl DeviceStoragePort for FsDeviceStorage {
    fn get(&self, scope: StorageScope, key: &str) -> Result<Option<String>, DeviceStorageError> {
        let path = self.key_path(scope, key);
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(unavailable("read record", &path, e)),
        }
    }

    fn set(&self, scope: StorageScope, key: &str, value: &str) -> Result<(), DeviceStorageError> {
        let path = self.key_path(scope, key);

        if let Some(capacity) = self.capacity_bytes {
            let used = self.used_bytes_excluding(&self.scope_dir(scope), &path)?;
            if used + value.len() as u64 > capacity {
                warn!(?scope, key, used, capacity, "device storage quota exceeded");
                return Err(DeviceStorageError::QuotaExceeded);
            }
        }

        self.atomic_write(&path, value)?;
        debug!(?scope, key, bytes = value.len(), "device record written");
        Ok(())
    }

    fn remove(&self, scope: StorageScope, key: &str) -> Result<(), DeviceStorageError> {
        let path = self.key_path(scope, key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(unavailable("remove record", &path, e)),
        }
    }
}

fn unavailable(action: &str, path: &Path, err: std::io::Error) -> DeviceStorageError {
    DeviceStorageError::Unavailable(format!("{action} failed: {}: {err}", path.display()))
}

// ENOSPC
const OUT_OF_SPACE: i32 = 28;

fn map_write_error(path: &Path, err: std::io::Error) -> DeviceStorageError {
    if err.raw_os_error() == Some(OUT_OF_SPACE) {
        return DeviceStorageError::QuotaExceeded;
    }
    unavailable("write temp record", path, err)
}
