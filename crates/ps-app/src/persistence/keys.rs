use ps_core::config::DEFAULT_KEY_PREFIX;
use ps_core::identity::Identity;

/// The two independent records kept per identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageSlot {
    /// Written only by an explicit save.
    Primary,
    /// Written only by the autosave scheduler.
    Autosave,
}

impl StorageSlot {
    fn suffix(self) -> &'static str {
        match self {
            StorageSlot::Primary => "project",
            StorageSlot::Autosave => "autosave",
        }
    }
}

/// Builds `<prefix>:<namespace>:<slot>` keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    prefix: String,
}

impl StorageKeys {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn key(&self, identity: &Identity, slot: StorageSlot) -> String {
        format!("{}:{}:{}", self.prefix, identity.namespace(), slot.suffix())
    }
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self::new(DEFAULT_KEY_PREFIX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_namespaced_per_identity_and_slot() {
        let keys = StorageKeys::default();
        assert_eq!(
            keys.key(&Identity::Anonymous, StorageSlot::Primary),
            "pagesync:anonymous:project"
        );
        assert_eq!(
            keys.key(&Identity::authenticated("u-7"), StorageSlot::Autosave),
            "pagesync:u-7:autosave"
        );
        assert_eq!(
            StorageKeys::new("demo").key(&Identity::Anonymous, StorageSlot::Autosave),
            "demo:anonymous:autosave"
        );
    }
}
