//! Settings file support.
//!
//! One YAML document configures every component:
//!
//! ```yaml
//! signatures: Hashes.txt
//! scan:
//!   workers: 8
//!   remote_failure_policy: fail_open
//!   decision_timeout_secs: 120
//! quarantine:
//!   directory: ./quarantine
//!   restore_policy: original_location
//!   restore_dir: .
//! reputation:
//!   enabled: true
//!   submit_unknown: true
//!   courtesy_delay_secs: 15
//! ```
//!
//! The API key may be left out of the file and supplied through the
//! `HASHGUARD_API_KEY` environment variable instead.

use crate::core::{ConfigError, QuarantineError};
use crate::manager::{default_workers, RemoteFailurePolicy, ScanManagerConfig};
use crate::quarantine::{FilesystemQuarantine, RestorePolicy};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable that overrides `reputation.api_key`.
pub const API_KEY_ENV: &str = "HASHGUARD_API_KEY";

/// Top-level settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Signature source file.
    pub signatures: PathBuf,

    /// Orchestrator settings.
    pub scan: ScanSettings,

    /// Quarantine settings.
    pub quarantine: QuarantineSettings,

    /// Reputation service settings.
    pub reputation: ReputationSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            signatures: PathBuf::from("Hashes.txt"),
            scan: ScanSettings::default(),
            quarantine: QuarantineSettings::default(),
            reputation: ReputationSettings::default(),
        }
    }
}

/// Orchestrator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScanSettings {
    /// Worker count; defaults to the available parallelism.
    pub workers: usize,
    /// Transient lookup failure handling.
    pub remote_failure_policy: RemoteFailurePolicy,
    /// Abort when no signature is loaded.
    pub require_signatures: bool,
    /// Seconds to wait for a decision before ignoring the threat.
    pub decision_timeout_secs: Option<u64>,
    /// Follow symbolic links during traversal.
    pub follow_symlinks: bool,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            remote_failure_policy: RemoteFailurePolicy::default(),
            require_signatures: true,
            decision_timeout_secs: None,
            follow_symlinks: false,
        }
    }
}

/// Quarantine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QuarantineSettings {
    /// Quarantine root directory.
    pub directory: PathBuf,
    /// Where restored files go.
    pub restore_policy: RestorePolicy,
    /// Target directory for directory restores and unknown origins.
    pub restore_dir: PathBuf,
}

impl Default for QuarantineSettings {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("quarantine"),
            restore_policy: RestorePolicy::default(),
            restore_dir: PathBuf::from("."),
        }
    }
}

/// Reputation service settings.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReputationSettings {
    /// Consult the reputation service at all.
    pub enabled: bool,
    /// API key; prefer the environment variable.
    pub api_key: Option<String>,
    /// Override of the API base URL.
    pub base_url: Option<String>,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Upload files the service has never seen.
    pub submit_unknown: bool,
    /// Largest file uploaded, in bytes.
    pub max_upload_size: u64,
    /// Seconds between analysis polls.
    pub poll_delay_secs: u64,
    /// Maximum analysis polls.
    pub max_polls: u32,
    /// Minimum seconds between requests.
    pub courtesy_delay_secs: u64,
    /// Share the courtesy delay across all workers.
    pub shared_spacing: bool,
}

impl Default for ReputationSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key: None,
            base_url: None,
            timeout_secs: 30,
            submit_unknown: false,
            max_upload_size: 32 * 1024 * 1024,
            poll_delay_secs: 15,
            max_polls: 4,
            courtesy_delay_secs: 15,
            shared_spacing: false,
        }
    }
}

impl fmt::Debug for ReputationSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReputationSettings")
            .field("enabled", &self.enabled)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("submit_unknown", &self.submit_unknown)
            .field("max_upload_size", &self.max_upload_size)
            .field("poll_delay_secs", &self.poll_delay_secs)
            .field("max_polls", &self.max_polls)
            .field("courtesy_delay_secs", &self.courtesy_delay_secs)
            .field("shared_spacing", &self.shared_spacing)
            .finish()
    }
}

impl Settings {
    /// Reads settings from a YAML file, then applies the environment.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let mut settings = Self::from_yaml(&content)?;
        settings.apply_env();
        tracing::debug!(path = %path.display(), "Settings loaded");
        Ok(settings)
    }

    /// Parses and validates settings from YAML text.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let settings: Self = if content.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(content)?
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Applies environment overrides.
    pub fn apply_env(&mut self) {
        self.apply_api_key(std::env::var(API_KEY_ENV).ok());
    }

    fn apply_api_key(&mut self, key: Option<String>) {
        if let Some(key) = key.filter(|k| !k.trim().is_empty()) {
            self.reputation.api_key = Some(key);
        }
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scan.workers == 0 {
            return Err(invalid("scan.workers", "must be at least 1"));
        }
        if self.scan.decision_timeout_secs == Some(0) {
            return Err(invalid("scan.decision_timeout_secs", "must be positive"));
        }
        if self.reputation.max_polls == 0 {
            return Err(invalid("reputation.max_polls", "must be at least 1"));
        }
        if let Some(url) = &self.reputation.base_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(invalid("reputation.base_url", "must be an http(s) URL"));
            }
        }
        Ok(())
    }

    /// Builds the orchestrator configuration.
    pub fn scan_config(&self) -> ScanManagerConfig {
        let mut config = ScanManagerConfig::new()
            .with_workers(self.scan.workers)
            .with_remote_failure_policy(self.scan.remote_failure_policy)
            .with_require_signatures(self.scan.require_signatures)
            .with_follow_symlinks(self.scan.follow_symlinks);
        if let Some(secs) = self.scan.decision_timeout_secs {
            config = config.with_decision_timeout(Duration::from_secs(secs));
        }
        config
    }

    /// Opens the configured quarantine store.
    pub fn quarantine_store(&self) -> Result<FilesystemQuarantine, QuarantineError> {
        Ok(FilesystemQuarantine::new(&self.quarantine.directory)?
            .with_restore_policy(self.quarantine.restore_policy)
            .with_restore_dir(&self.quarantine.restore_dir))
    }

    /// Builds the reputation client configuration.
    ///
    /// Returns `None` when the service is disabled or no API key is known.
    #[cfg(feature = "virustotal")]
    pub fn virustotal_config(&self) -> Option<crate::backends::VirusTotalConfig> {
        let rep = &self.reputation;
        if !rep.enabled {
            return None;
        }
        let Some(key) = rep.api_key.clone() else {
            tracing::warn!(
                env = API_KEY_ENV,
                "No API key configured, reputation lookups disabled"
            );
            return None;
        };

        let mut config = crate::backends::VirusTotalConfig::new(key)
            .with_timeout(Duration::from_secs(rep.timeout_secs))
            .with_submit_unknown(rep.submit_unknown)
            .with_max_upload_size(rep.max_upload_size)
            .with_polling(Duration::from_secs(rep.poll_delay_secs), rep.max_polls)
            .with_courtesy_delay(Duration::from_secs(rep.courtesy_delay_secs))
            .with_shared_spacing(rep.shared_spacing);
        if let Some(url) = &rep.base_url {
            config = config.with_base_url(url);
        }
        Some(config)
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_document_uses_defaults() {
        let settings = Settings::from_yaml("").unwrap();
        assert_eq!(settings.signatures, PathBuf::from("Hashes.txt"));
        assert!(settings.scan.require_signatures);
        assert_eq!(settings.scan.remote_failure_policy, RemoteFailurePolicy::FailOpen);
        assert_eq!(
            settings.quarantine.restore_policy,
            RestorePolicy::OriginalLocation
        );
    }

    #[test]
    fn test_parse_full_document() {
        let yaml = r#"
signatures: /etc/hashguard/Hashes.txt
scan:
  workers: 3
  remote_failure_policy: fail_closed
  decision_timeout_secs: 30
quarantine:
  directory: /var/lib/hashguard/quarantine
  restore_policy: directory
reputation:
  enabled: true
  api_key: from-file
  submit_unknown: true
  courtesy_delay_secs: 0
"#;
        let settings = Settings::from_yaml(yaml).unwrap();
        assert_eq!(settings.scan.workers, 3);
        assert_eq!(
            settings.scan.remote_failure_policy,
            RemoteFailurePolicy::FailClosed
        );
        assert_eq!(settings.quarantine.restore_policy, RestorePolicy::Directory);
        assert!(settings.reputation.submit_unknown);

        let scan = settings.scan_config();
        assert_eq!(scan.workers, 3);
        assert_eq!(scan.decision_timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result = Settings::from_yaml("scan:\n  wrokers: 2\n");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let result = Settings::from_yaml("scan:\n  workers: 0\n");
        assert!(matches!(result, Err(ConfigError::Invalid { ref field, .. }) if field == "scan.workers"));

        let result = Settings::from_yaml("reputation:\n  base_url: ftp://example\n");
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_env_key_overrides_file() {
        let mut settings = Settings::from_yaml("reputation:\n  api_key: from-file\n").unwrap();
        settings.apply_api_key(Some("from-env".to_string()));
        assert_eq!(settings.reputation.api_key.as_deref(), Some("from-env"));

        settings.apply_api_key(Some("  ".to_string()));
        assert_eq!(settings.reputation.api_key.as_deref(), Some("from-env"));
    }

    #[test]
    fn test_debug_redacts_key() {
        let settings = Settings::from_yaml("reputation:\n  api_key: hunter2\n").unwrap();
        let debug = format!("{settings:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_load_missing_file() {
        let result = Settings::load("/nonexistent/hashguard.yaml");
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "signatures: sigs.txt").unwrap();
        file.flush().unwrap();

        let settings = Settings::load(file.path()).unwrap();
        assert_eq!(settings.signatures, PathBuf::from("sigs.txt"));
    }

    #[cfg(feature = "virustotal")]
    #[test]
    fn test_virustotal_config_requires_key() {
        let mut settings = Settings::default();
        settings.reputation.api_key = None;
        assert!(settings.virustotal_config().is_none());

        settings.reputation.api_key = Some("key".into());
        settings.reputation.base_url = Some("http://127.0.0.1:9/api".into());
        let config = settings.virustotal_config().unwrap();
        assert_eq!(config.base_url, "http://127.0.0.1:9/api");

        settings.reputation.enabled = false;
        assert!(settings.virustotal_config().is_none());
    }
}
