//! Configuration file support for fwswitchd
//!
//! Loads and validates controller configuration from TOML files. Every
//! key is optional; a missing file yields the defaults.

use crate::error::{ConfigError, ConfigResult};
use crate::policy::{Policy, PolicyCompiler};
use ofctl_common::{RetryPolicy, TableId};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Flow-table pipeline layout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Table holding the compiled firewall policy
    #[serde(default = "default_policy_table")]
    pub policy_table: TableId,

    /// Table holding reactive forwarding flows
    #[serde(default = "default_forwarding_table")]
    pub forwarding_table: TableId,

    /// Priority of compiled policy entries
    #[serde(default = "default_policy_priority")]
    pub policy_priority: u16,

    /// Priority of reactive forwarding flows
    #[serde(default = "default_forwarding_priority")]
    pub forwarding_priority: u16,

    /// Install a punt-to-controller table-miss in the forwarding table
    #[serde(default = "default_install_forwarding_table_miss")]
    pub install_forwarding_table_miss: bool,

    /// Idle timeout of reactive flows in seconds (0 = never expire)
    #[serde(default)]
    pub flow_idle_timeout_secs: u16,
}

/// Policy compilation options
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Give each rule a strictly lower priority than the one before it
    #[serde(default)]
    pub ordered_priorities: bool,
}

/// Learning table options
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearningConfig {
    /// Maximum learned addresses per device (0 = unbounded)
    #[serde(default)]
    pub max_entries_per_device: usize,
}

/// Flow installation options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallConfig {
    /// Attempts per flow entry, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Pause between attempts in milliseconds
    #[serde(default = "default_retry_backoff")]
    pub retry_backoff_ms: u64,
}

/// Complete fwswitchd configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerConfig {
    #[serde(default)]
    pub pipeline: PipelineConfig,

    #[serde(default)]
    pub policy: PolicyConfig,

    #[serde(default)]
    pub learning: LearningConfig,

    #[serde(default)]
    pub install: InstallConfig,
}

fn default_policy_table() -> TableId {
    0
}

fn default_forwarding_table() -> TableId {
    1
}

fn default_policy_priority() -> u16 {
    2
}

fn default_forwarding_priority() -> u16 {
    1
}

fn default_install_forwarding_table_miss() -> bool {
    true
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_backoff() -> u64 {
    50
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            policy_table: default_policy_table(),
            forwarding_table: default_forwarding_table(),
            policy_priority: default_policy_priority(),
            forwarding_priority: default_forwarding_priority(),
            install_forwarding_table_miss: default_install_forwarding_table_miss(),
            flow_idle_timeout_secs: 0,
        }
    }
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            retry_backoff_ms: default_retry_backoff(),
        }
    }
}

impl InstallConfig {
    /// Retry policy for flow installation
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Duration::from_millis(self.retry_backoff_ms))
    }
}

impl ControllerConfig {
    /// Load configuration from file, falling back to defaults if file not found
    pub fn load_or_default(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();

        match fs::read_to_string(path) {
            Ok(content) => Self::from_toml(&content).map_err(|e| match e {
                ConfigError::Parse { message, .. } => ConfigError::Parse {
                    path: path.to_path_buf(),
                    message,
                },
                other => other,
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "Config file not found, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(ConfigError::Io(e)),
        }
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> ConfigResult<Self> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: "<inline>".into(),
            message: e.to_string(),
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if self.pipeline.policy_table == self.pipeline.forwarding_table {
            return Err(ConfigError::Invalid(format!(
                "pipeline.policy_table and pipeline.forwarding_table must differ (both {})",
                self.pipeline.policy_table
            )));
        }

        if self.pipeline.forwarding_priority >= self.pipeline.policy_priority {
            return Err(ConfigError::Invalid(format!(
                "pipeline.forwarding_priority ({}) must be below pipeline.policy_priority ({})",
                self.pipeline.forwarding_priority, self.pipeline.policy_priority
            )));
        }

        if self.pipeline.forwarding_priority == 0 {
            return Err(ConfigError::Invalid(
                "pipeline.forwarding_priority must be > 0 (0 is the table-miss priority)"
                    .to_string(),
            ));
        }

        if self.install.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "install.max_attempts must be > 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Compiler configured by `[pipeline]` and `[policy]`
    pub fn policy_compiler(&self) -> PolicyCompiler {
        PolicyCompiler::new(self.pipeline.policy_priority)
            .with_ordered_priorities(self.policy.ordered_priorities)
    }

    /// Validate settings that depend on the loaded policy
    pub fn validate_for_policy(&self, policy: &Policy) -> ConfigResult<()> {
        if self.policy_compiler().top_priority(policy.len()).is_none() {
            return Err(ConfigError::Invalid(format!(
                "policy.ordered_priorities needs {} priorities starting at pipeline.policy_priority ({}), above the maximum {}",
                policy.len(),
                self.pipeline.policy_priority,
                u16::MAX
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = ControllerConfig::default();
        assert_eq!(config.pipeline.policy_table, 0);
        assert_eq!(config.pipeline.forwarding_table, 1);
        assert_eq!(config.pipeline.policy_priority, 2);
        assert_eq!(config.pipeline.forwarding_priority, 1);
        assert!(config.pipeline.install_forwarding_table_miss);
        assert_eq!(config.pipeline.flow_idle_timeout_secs, 0);
        assert!(!config.policy.ordered_priorities);
        assert_eq!(config.learning.max_entries_per_device, 0);
        assert_eq!(config.install.max_attempts, 3);
        assert_eq!(config.install.retry_backoff_ms, 50);
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(ControllerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_same_tables() {
        let mut config = ControllerConfig::default();
        config.pipeline.forwarding_table = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_priority_order() {
        let mut config = ControllerConfig::default();
        config.pipeline.forwarding_priority = 2;
        assert!(config.validate().is_err());

        config.pipeline.policy_priority = 100;
        config.pipeline.forwarding_priority = 10;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_zero_attempts() {
        let mut config = ControllerConfig::default();
        config.install.max_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_ordered_priorities_overflow() {
        let policy = Policy::from_rules_text("deny TCP dst 23\npermit TCP dst 23\n").unwrap();
        let mut config = ControllerConfig::default();
        config.pipeline.policy_priority = u16::MAX;
        config.policy.ordered_priorities = true;

        assert!(config.validate().is_ok());
        let err = config.validate_for_policy(&policy).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        config.pipeline.policy_priority = u16::MAX - 1;
        assert!(config.validate_for_policy(&policy).is_ok());

        config.pipeline.policy_priority = u16::MAX;
        config.policy.ordered_priorities = false;
        assert!(config.validate_for_policy(&policy).is_ok());
    }

    #[test]
    fn test_toml_deserialization() {
        let toml_str = r#"
[pipeline]
install_forwarding_table_miss = false
flow_idle_timeout_secs = 30

[learning]
max_entries_per_device = 1024
"#;
        let config = ControllerConfig::from_toml(toml_str).unwrap();
        assert!(!config.pipeline.install_forwarding_table_miss);
        assert_eq!(config.pipeline.flow_idle_timeout_secs, 30);
        assert_eq!(config.learning.max_entries_per_device, 1024);
        // Unspecified values should use defaults
        assert_eq!(config.pipeline.policy_priority, 2);
        assert_eq!(config.install.max_attempts, 3);
    }

    #[test]
    fn test_toml_round_trip() {
        let config = ControllerConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        assert!(toml_str.contains("policy_priority"));
        assert_eq!(ControllerConfig::from_toml(&toml_str).unwrap(), config);
    }

    #[test]
    fn test_load_nonexistent_file_defaults() {
        let config = ControllerConfig::load_or_default("/nonexistent/fwswitchd.toml").unwrap();
        assert_eq!(config, ControllerConfig::default());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[policy]\nordered_priorities = true").unwrap();

        let config = ControllerConfig::load_or_default(file.path()).unwrap();
        assert!(config.policy.ordered_priorities);
    }

    #[test]
    fn test_load_invalid_file_reports_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[pipeline]\npolicy_table = \"zero\"").unwrap();

        let err = ControllerConfig::load_or_default(file.path()).unwrap_err();
        match err {
            ConfigError::Parse { path, .. } => assert_eq!(path, file.path()),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_retry_policy() {
        let policy = InstallConfig::default().retry_policy();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.backoff, Duration::from_millis(50));
    }
}
