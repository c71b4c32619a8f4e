//! Configuration management for Turnstile.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::error::{Result, TurnstileError};
use crate::ratelimit::{LimitRules, TimeWindow};

/// Prefix for environment overrides, e.g. `TURNSTILE__SWEEPER__INTERVAL_SECS`.
const ENV_PREFIX: &str = "TURNSTILE";

/// Main configuration for the Turnstile service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TurnstileConfig {
    /// Per-class ceilings
    #[serde(default)]
    pub limits: LimitRules,

    /// Background cleanup configuration
    #[serde(default)]
    pub sweeper: SweeperConfig,

    /// Log output configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Background cleanup configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweeperConfig {
    /// Seconds between sweep passes
    #[serde(default = "default_interval")]
    pub interval_secs: u64,

    /// Seconds after its newest request before a key may be evicted
    #[serde(default = "default_retention")]
    pub retention_secs: u64,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval(),
            retention_secs: default_retention(),
        }
    }
}

fn default_interval() -> u64 {
    30 * 60
}

fn default_retention() -> u64 {
    2 * 60 * 60
}

impl SweeperConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_secs)
    }
}

/// Log output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` takes precedence
    #[serde(default = "default_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable text
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            json: false,
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

impl TurnstileConfig {
    /// Load configuration from an optional YAML file with environment overrides.
    ///
    /// Sources layer as defaults, then the file, then `TURNSTILE__*`
    /// variables, so any source may set a single field.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let defaults = ::config::Config::try_from(&TurnstileConfig::default())
            .map_err(|e| TurnstileError::Config(e.to_string()))?;
        let mut builder = ::config::Config::builder().add_source(defaults);

        if let Some(path) = path {
            info!(path = %path.display(), "Loading configuration file");
            builder = builder.add_source(
                ::config::File::from(path).format(::config::FileFormat::Yaml),
            );
        }

        let config: TurnstileConfig = builder
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| TurnstileError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: TurnstileConfig = serde_yaml::from_str(yaml)
            .map_err(|e| TurnstileError::Config(format!("Failed to parse configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that parse but cannot work.
    pub fn validate(&self) -> Result<()> {
        if self.sweeper.interval_secs == 0 {
            return Err(TurnstileError::Config(
                "sweeper.interval_secs must be greater than zero".to_string(),
            ));
        }

        let longest_window = TimeWindow::Hour.duration();
        if self.sweeper.retention() <= longest_window {
            return Err(TurnstileError::Config(format!(
                "sweeper.retention_secs must exceed {} seconds, got {}",
                longest_window.as_secs(),
                self.sweeper.retention_secs
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ratelimit::{ActionClass, Ceiling};

    #[test]
    fn test_defaults() {
        let config = TurnstileConfig::default();
        assert_eq!(config.sweeper.interval(), Duration::from_secs(1800));
        assert_eq!(config.sweeper.retention(), Duration::from_secs(7200));
        assert_eq!(config.limits.ceiling(ActionClass::Login), Ceiling::new(5, 20));
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.json);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = r#"
limits:
  general:
    per_minute: 120
    per_hour: 2000
sweeper:
  interval_secs: 600
logging:
  json: true
"#;
        let config = TurnstileConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.limits.general, Ceiling::new(120, 2000));
        assert_eq!(config.limits.login, Ceiling::new(5, 20));
        assert_eq!(config.sweeper.interval_secs, 600);
        assert_eq!(config.sweeper.retention_secs, 7200);
        assert!(config.logging.json);
    }

    #[test]
    fn test_empty_yaml_is_default() {
        let config = TurnstileConfig::from_yaml("{}").unwrap();
        assert_eq!(config.limits, LimitRules::default());
    }

    #[test]
    fn test_rejects_short_retention() {
        let yaml = r#"
sweeper:
  retention_secs: 3600
"#;
        let err = TurnstileConfig::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, TurnstileError::Config(_)));
    }

    #[test]
    fn test_rejects_zero_interval() {
        let yaml = r#"
sweeper:
  interval_secs: 0
"#;
        assert!(TurnstileConfig::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!(
            "turnstile-config-{}.yaml",
            std::process::id()
        ));
        std::fs::write(
            &path,
            "limits:\n  login:\n    per_minute: 2\n    per_hour: 8\nsweeper:\n  retention_secs: 10800\n",
        )
        .unwrap();

        let config = TurnstileConfig::load(Some(&path)).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.limits.login, Ceiling::new(2, 8));
        assert_eq!(config.sweeper.retention(), Duration::from_secs(10800));
    }

    #[test]
    fn test_load_file_with_partial_ceiling() {
        let path = std::env::temp_dir().join(format!(
            "turnstile-partial-{}.yaml",
            std::process::id()
        ));
        std::fs::write(&path, "limits:\n  login:\n    per_minute: 3\n").unwrap();

        let config = TurnstileConfig::load(Some(&path)).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.limits.login, Ceiling::new(3, 20));
        assert_eq!(config.sweeper.retention_secs, 7200);
    }

    #[test]
    fn test_env_overrides_single_field() {
        std::env::set_var("TURNSTILE__LIMITS__GENERAL__PER_MINUTE", "90");
        let loaded = TurnstileConfig::load(None);
        std::env::remove_var("TURNSTILE__LIMITS__GENERAL__PER_MINUTE");

        let config = loaded.unwrap();
        assert_eq!(config.limits.general, Ceiling::new(90, 1000));
        assert_eq!(config.sweeper.interval_secs, 1800);
        assert_eq!(config.logging.level, "info");
    }
}
