use std::path::PathBuf;

use template_publisher_core::storage_keys::DEFAULT_STORAGE_DOMAIN;

pub const LOG_LEVEL_VAR: &str = "TEMPLATE_PUBLISHER_LOG_LEVEL";
pub const STORAGE_DOMAIN_VAR: &str = "TEMPLATE_PUBLISHER_STORAGE_DOMAIN";
pub const SCRATCH_DIR_VAR: &str = "TEMPLATE_PUBLISHER_SCRATCH_DIR";
pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublisherConfig {
    pub storage_domain: String,
    pub scratch_dir: PathBuf,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            storage_domain: DEFAULT_STORAGE_DOMAIN.to_string(),
            scratch_dir: std::env::temp_dir(),
        }
    }
}

/// Startup configuration for the Lambda binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub log_level: String,
    pub publisher: PublisherConfig,
}

impl RuntimeConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Empty values are treated as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let defaults = PublisherConfig::default();

        Self {
            log_level: read(LOG_LEVEL_VAR).unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
            publisher: PublisherConfig {
                storage_domain: read(STORAGE_DOMAIN_VAR).unwrap_or(defaults.storage_domain),
                scratch_dir: read(SCRATCH_DIR_VAR)
                    .map(PathBuf::from)
                    .unwrap_or(defaults.scratch_dir),
            },
        }
    }
}
