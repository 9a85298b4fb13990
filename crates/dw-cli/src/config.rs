//! Configuration loading and management.

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

use dw_core::ClassifierConfig;

/// Application configuration.
///
/// Every field is policy, not correctness: changing the lists or the idle
/// threshold never affects the tracker's state machine, only what it
/// classifies and how much idle dwell it forfeits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the local bucket database.
    pub database_path: PathBuf,

    /// Ingestion endpoint of the remote aggregator. `None` disables
    /// forwarding entirely.
    pub remote_endpoint: Option<String>,

    /// Inactivity gap after which dwell time stops accruing, in
    /// milliseconds.
    pub idle_threshold_ms: i64,

    /// Productive/unproductive membership lists.
    pub classifier: ClassifierConfig,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            database_path: data_dir.join("dw.db"),
            remote_endpoint: None,
            idle_threshold_ms: 300_000,
            classifier: ClassifierConfig::default(),
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    ///
    /// Merge order: defaults, then `config.toml` in the platform config
    /// directory, then the explicit file, then `DW_*` environment variables.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        figment = figment.merge(Env::prefixed("DW_"));

        figment.extract()
    }
}

/// Returns the platform-specific config directory for dw.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("dw"))
}

/// Returns the platform-specific data directory for dw.
///
/// On Linux: `~/.local/share/dw`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("dw"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_uses_data_dir_for_db() {
        let config = Config::default();
        let data_dir = dirs_data_path().unwrap();
        assert_eq!(config.database_path, data_dir.join("dw.db"));
    }

    #[test]
    fn default_idle_threshold_is_five_minutes() {
        assert_eq!(Config::default().idle_threshold_ms, 300_000);
    }

    #[test]
    fn default_has_no_remote_endpoint() {
        assert_eq!(Config::default().remote_endpoint, None);
    }

    #[test]
    fn default_classifier_lists_are_populated() {
        let config = Config::default();
        assert!(!config.classifier.productive.is_empty());
        assert!(!config.classifier.unproductive.is_empty());
    }
}
