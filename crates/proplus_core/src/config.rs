//! Runtime configuration.
//!
//! # Responsibility
//! - Resolve settings from `PROPLUS_*` environment variables over defaults.
//! - Validate them before any storage or logging is started.
//!
//! # Invariants
//! - A validated config always has a non-empty app id without `/` and an
//!   absolute log directory.

use crate::logging::{LogLevel, LoggingError};
use crate::service::state_store::DEFAULT_APP_ID;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const ENV_APP_ID: &str = "PROPLUS_APP_ID";
pub const ENV_DATA_DIR: &str = "PROPLUS_DATA_DIR";
pub const ENV_LOG_LEVEL: &str = "PROPLUS_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "PROPLUS_LOG_DIR";
pub const ENV_USER_ID: &str = "PROPLUS_USER_ID";

const DATA_DIR_NAME: &str = ".proplus";
const DB_FILE_NAME: &str = "proplus.sqlite3";

#[derive(Debug)]
pub enum ConfigError {
    EmptyAppId,
    /// App ids become a path segment of the remote document.
    InvalidAppId(String),
    InvalidLogLevel(LoggingError),
    RelativeLogDir(PathBuf),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyAppId => write!(f, "{ENV_APP_ID} cannot be empty"),
            Self::InvalidAppId(value) => {
                write!(f, "{ENV_APP_ID} must not contain `/`, got `{value}`")
            }
            Self::InvalidLogLevel(err) => write!(f, "{ENV_LOG_LEVEL}: {err}"),
            Self::RelativeLogDir(dir) => {
                write!(f, "log directory must be absolute, got `{}`", dir.display())
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidLogLevel(err) => Some(err),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub app_id: String,
    pub data_dir: PathBuf,
    pub log_level: LogLevel,
    /// Defaults to `<data_dir>/logs`.
    pub log_dir: Option<PathBuf>,
    /// Remote identity to establish at startup, if any.
    pub remote_user_id: Option<String>,
}

impl CoreConfig {
    /// Reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves the config from an arbitrary variable source. Empty values
    /// count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let log_level = match read(ENV_LOG_LEVEL) {
            Some(value) => value.parse().map_err(ConfigError::InvalidLogLevel)?,
            None => LogLevel::build_default(),
        };
        let data_dir = read(ENV_DATA_DIR)
            .map(PathBuf::from)
            .unwrap_or_else(|| default_data_dir(read("HOME")));

        let config = Self {
            app_id: read(ENV_APP_ID).unwrap_or_else(|| DEFAULT_APP_ID.to_string()),
            data_dir,
            log_level,
            log_dir: read(ENV_LOG_DIR).map(PathBuf::from),
            remote_user_id: read(ENV_USER_ID),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.app_id.trim().is_empty() {
            return Err(ConfigError::EmptyAppId);
        }
        if self.app_id.contains('/') {
            return Err(ConfigError::InvalidAppId(self.app_id.clone()));
        }
        let log_dir = self.log_dir();
        if !log_dir.is_absolute() {
            return Err(ConfigError::RelativeLogDir(log_dir));
        }
        Ok(())
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILE_NAME)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.log_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join("logs"))
    }
}

fn default_data_dir(home: Option<String>) -> PathBuf {
    match home {
        Some(home) => PathBuf::from(home).join(DATA_DIR_NAME),
        None => std::env::temp_dir().join("proplus"),
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, CoreConfig, ENV_APP_ID, ENV_DATA_DIR, ENV_LOG_LEVEL, ENV_USER_ID};
    use crate::logging::LogLevel;
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn config_from(pairs: &[(&str, &str)]) -> Result<CoreConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        CoreConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = config_from(&[("HOME", "/home/grace")]).unwrap();
        assert_eq!(config.app_id, "default-app-id");
        assert_eq!(config.data_dir, PathBuf::from("/home/grace/.proplus"));
        assert_eq!(config.log_dir(), PathBuf::from("/home/grace/.proplus/logs"));
        assert_eq!(
            config.db_path(),
            PathBuf::from("/home/grace/.proplus/proplus.sqlite3")
        );
        assert!(config.remote_user_id.is_none());
    }

    #[test]
    fn environment_overrides_defaults() {
        let config = config_from(&[
            (ENV_APP_ID, "campus"),
            (ENV_DATA_DIR, "/srv/proplus"),
            (ENV_LOG_LEVEL, "WARN"),
            (ENV_USER_ID, " user-7 "),
        ])
        .unwrap();
        assert_eq!(config.app_id, "campus");
        assert_eq!(config.log_level, LogLevel::Warn);
        assert_eq!(config.remote_user_id.as_deref(), Some("user-7"));
        assert_eq!(config.log_dir(), PathBuf::from("/srv/proplus/logs"));
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(
            config_from(&[(ENV_APP_ID, "a/b"), (ENV_DATA_DIR, "/tmp/x")]),
            Err(ConfigError::InvalidAppId(_))
        ));
        assert!(matches!(
            config_from(&[(ENV_LOG_LEVEL, "loud"), (ENV_DATA_DIR, "/tmp/x")]),
            Err(ConfigError::InvalidLogLevel(_))
        ));
        assert!(matches!(
            config_from(&[(ENV_DATA_DIR, "relative/dir")]),
            Err(ConfigError::RelativeLogDir(_))
        ));
    }
}
