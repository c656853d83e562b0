//! Core runtime configuration.
//!
//! # Responsibility
//! - Describe where the store lives, how logging is set up and which timer
//!   policy applies.
//! - Parse the JSON form handed over by host applications.
//!
//! # Invariants
//! - Missing keys fall back to defaults; unknown keys are rejected.
//! - `log_level` is validated at parse time.

use crate::logging::{self, default_log_level};
use crate::service::timer_service::TimerPolicy;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoreConfig {
    /// SQLite file; `None` keeps everything in memory.
    pub database_path: Option<PathBuf>,
    pub log_level: String,
    /// Absolute directory for rolling log files; `None` disables file logs.
    pub log_dir: Option<PathBuf>,
    pub single_active_timer: bool,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            log_level: default_log_level().to_string(),
            log_dir: None,
            single_active_timer: TimerPolicy::default().single_active_timer,
        }
    }
}

impl CoreConfig {
    /// Parses and validates a JSON config document.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        logging::normalize_level(&self.log_level).map_err(ConfigError::Invalid)?;
        Ok(())
    }

    pub fn timer_policy(&self) -> TimerPolicy {
        TimerPolicy {
            single_active_timer: self.single_active_timer,
        }
    }

    /// Starts file logging when `log_dir` is set; otherwise a no-op.
    pub fn init_logging(&self) -> Result<(), ConfigError> {
        let Some(log_dir) = self.log_dir.as_deref() else {
            return Ok(());
        };
        logging::init_logging(&self.log_level, log_dir).map_err(ConfigError::Invalid)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Parse(serde_json::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "invalid config json: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, CoreConfig};
    use std::path::PathBuf;

    #[test]
    fn empty_object_yields_defaults() {
        let config = CoreConfig::from_json_str("{}").unwrap();
        assert_eq!(config, CoreConfig::default());
        assert!(config.single_active_timer);
        assert!(config.database_path.is_none());
    }

    #[test]
    fn explicit_fields_are_read() {
        let config = CoreConfig::from_json_str(
            r#"{"database_path":"/tmp/tally.db","log_level":"WARN","single_active_timer":false}"#,
        )
        .unwrap();
        assert_eq!(config.database_path, Some(PathBuf::from("/tmp/tally.db")));
        assert!(!config.timer_policy().single_active_timer);
    }

    #[test]
    fn unknown_level_is_rejected() {
        let err = CoreConfig::from_json_str(r#"{"log_level":"loud"}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = CoreConfig::from_json_str(r#"{"db":"x"}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
