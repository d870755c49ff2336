//! Engine configuration (pure data).
//!
//! Every section is `#[serde(default)]` so a partial TOML file only overrides
//! the keys it names. No validation happens here; consumers normalise the
//! values they depend on (for example a history capacity of 0 becomes 1).

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::history::DEFAULT_HISTORY_CAPACITY;
use crate::project::{ProjectQuotaPolicy, DEFAULT_MAX_PROJECTS_PER_ACCOUNT};

pub const DEFAULT_KEY_PREFIX: &str = "pagesync";
pub const DEFAULT_QUIET_PERIOD_MS: u64 = 3_000;
pub const DEFAULT_PROJECT_TITLE: &str = "Untitled page";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub history: HistoryConfig,
    pub autosave: AutosaveConfig,
    pub projects: ProjectsConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub capacity: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutosaveConfig {
    pub quiet_period_ms: u64,
}

impl AutosaveConfig {
    pub fn quiet_period(&self) -> Duration {
        Duration::from_millis(self.quiet_period_ms)
    }
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self {
            quiet_period_ms: DEFAULT_QUIET_PERIOD_MS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectsConfig {
    pub max_per_account: usize,
    pub default_title: String,
}

impl ProjectsConfig {
    pub fn quota_policy(&self) -> ProjectQuotaPolicy {
        ProjectQuotaPolicy::new(self.max_per_account)
    }
}

impl Default for ProjectsConfig {
    fn default() -> Self {
        Self {
            max_per_account: DEFAULT_MAX_PROJECTS_PER_ACCOUNT,
            default_title: DEFAULT_PROJECT_TITLE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub key_prefix: String,
    /// Root directory of durable device storage.
    pub data_dir: PathBuf,
    /// Byte budget of session storage; unlimited when absent.
    pub session_capacity_bytes: Option<usize>,
    /// Root directory of the filesystem object store.
    pub object_store_dir: PathBuf,
    /// Base URL under which stored objects are served.
    pub public_base_url: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            data_dir: PathBuf::from("data/device"),
            session_capacity_bytes: Some(5 * 1024 * 1024),
            object_store_dir: PathBuf::from("data/objects"),
            public_base_url: "http://localhost:8080/media".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Directory for rolling log files; console only when absent.
    pub log_dir: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = EngineConfig::default();
        assert_eq!(config.history.capacity, 50);
        assert_eq!(config.autosave.quiet_period(), Duration::from_secs(3));
        assert_eq!(config.projects.quota_policy().max_projects_per_account, 3);
        assert_eq!(config.storage.key_prefix, "pagesync");
        assert!(config.logging.log_dir.is_none());
    }

    #[test]
    fn partial_json_keeps_other_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"autosave": {"quiet_period_ms": 500}}"#).unwrap();
        assert_eq!(config.autosave.quiet_period_ms, 500);
        assert_eq!(config.history.capacity, 50);
        assert_eq!(config.projects.default_title, "Untitled page");
    }
}
