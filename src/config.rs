use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use trip_journal_core::RollbackIdentity;

const ENV_DATABASE_PATH: &str = "TRIPJOURNAL_DATABASE_PATH";
const ENV_USER: &str = "TRIPJOURNAL_USER";
const ENV_ROLLBACK_IDENTITY: &str = "TRIPJOURNAL_ROLLBACK_IDENTITY";

/// Source of a configuration value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Default,
    File,
    Environment,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Default => write!(f, "default"),
            ConfigSource::File => write!(f, "file"),
            ConfigSource::Environment => write!(f, "environment"),
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }
}

/// Application configuration with source tracking
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Path to the SQLite database
    pub database_path: ConfigValue<PathBuf>,
    /// User that owns created trips and is checked on deletion
    pub user_id: ConfigValue<String>,
    /// How a failed trip deletion restores records
    pub rollback_identity: ConfigValue<RollbackIdentity>,
    /// Config file path used (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
}

/// Internal struct for deserializing config file
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    database_path: Option<PathBuf>,
    user_id: Option<String>,
    rollback_identity: Option<RollbackIdentity>,
}

impl Config {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut database_path = ConfigValue::new(
            Self::default_data_dir().join("trips.db"),
            ConfigSource::Default,
        );
        let mut user_id = ConfigValue::new("default".to_string(), ConfigSource::Default);
        let mut rollback_identity =
            ConfigValue::new(RollbackIdentity::default(), ConfigSource::Default);
        let mut config_file = None;

        let path = config_path.unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadError(path.clone(), e))?;
            let file_config: ConfigFile = serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::ParseError(path.clone(), e))?;

            config_file = Some(path.clone());

            if let Some(db_path) = file_config.database_path {
                // Resolve relative paths against config file's directory
                let resolved_path = if db_path.is_relative() {
                    path.parent().map(|p| p.join(&db_path)).unwrap_or(db_path)
                } else {
                    db_path
                };
                database_path = ConfigValue::new(resolved_path, ConfigSource::File);
            }
            if let Some(user) = file_config.user_id {
                user_id = ConfigValue::new(user, ConfigSource::File);
            }
            if let Some(identity) = file_config.rollback_identity {
                rollback_identity = ConfigValue::new(identity, ConfigSource::File);
            }
        }

        if let Ok(db_path) = std::env::var(ENV_DATABASE_PATH) {
            database_path = ConfigValue::new(PathBuf::from(db_path), ConfigSource::Environment);
        }
        if let Ok(user) = std::env::var(ENV_USER) {
            user_id = ConfigValue::new(user, ConfigSource::Environment);
        }
        if let Ok(identity) = std::env::var(ENV_ROLLBACK_IDENTITY) {
            let identity = identity
                .parse()
                .map_err(|reason| ConfigError::InvalidValue(ENV_ROLLBACK_IDENTITY, reason))?;
            rollback_identity = ConfigValue::new(identity, ConfigSource::Environment);
        }

        Ok(Self {
            database_path,
            user_id,
            rollback_identity,
            config_file,
        })
    }

    /// Default config directory (platform-specific):
    /// - Linux: ~/.config/tripjournal/
    /// - macOS: ~/Library/Application Support/tripjournal/
    /// - Windows: %APPDATA%/tripjournal/
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tripjournal")
    }

    /// Default data directory (platform-specific):
    /// - Linux: ~/.local/share/tripjournal/
    /// - macOS: ~/Library/Application Support/tripjournal/
    /// - Windows: %APPDATA%/tripjournal/
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tripjournal")
    }

    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join("config.yaml")
    }
}

#[derive(Debug)]
pub enum ConfigError {
    ReadError(PathBuf, std::io::Error),
    ParseError(PathBuf, serde_yaml::Error),
    InvalidValue(&'static str, String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
            ConfigError::InvalidValue(key, reason) => write!(f, "Invalid {}: {}", key, reason),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("nonexistent.yaml");

        let config = Config::load(Some(config_path)).unwrap();
        assert!(config
            .database_path
            .value
            .to_string_lossy()
            .contains("trips.db"));
        assert_eq!(config.database_path.source, ConfigSource::Default);
        assert_eq!(config.user_id.value, "default");
        assert_eq!(config.rollback_identity.value, RollbackIdentity::Fresh);
        assert!(config.config_file.is_none());
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "database_path: /custom/path/trips.sqlite").unwrap();
        writeln!(file, "user_id: alice").unwrap();
        writeln!(file, "rollback_identity: preserve").unwrap();

        let config = Config::load(Some(config_path.clone())).unwrap();
        assert_eq!(
            config.database_path.value,
            PathBuf::from("/custom/path/trips.sqlite")
        );
        assert_eq!(config.database_path.source, ConfigSource::File);
        assert_eq!(config.user_id.value, "alice");
        assert_eq!(config.user_id.source, ConfigSource::File);
        assert_eq!(config.rollback_identity.value, RollbackIdentity::Preserve);
        assert_eq!(config.config_file, Some(config_path));
    }

    #[test]
    fn test_relative_database_path_resolves_against_config_dir() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "database_path: data/trips.db").unwrap();

        let config = Config::load(Some(config_path)).unwrap();
        assert_eq!(
            config.database_path.value,
            temp_dir.path().join("data/trips.db")
        );
    }

    #[test]
    #[ignore] // Run with --ignored; env vars can pollute parallel tests
    fn test_env_var_overrides_file() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "user_id: fromfile").unwrap();

        std::env::set_var(ENV_USER, "fromenv");

        let config = Config::load(Some(config_path)).unwrap();
        assert_eq!(config.user_id.value, "fromenv");
        assert_eq!(config.user_id.source, ConfigSource::Environment);

        std::env::remove_var(ENV_USER);
    }

    #[test]
    fn test_invalid_yaml_error() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "invalid: yaml: content: [").unwrap();

        let result = Config::load(Some(config_path));
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_unknown_rollback_identity_in_file() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "rollback_identity: sometimes").unwrap();

        let err = Config::load(Some(config_path)).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(..)));
    }

    #[test]
    fn test_partial_file_config() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "user_id: fileuser").unwrap();

        let config = Config::load(Some(config_path)).unwrap();
        assert_eq!(config.database_path.source, ConfigSource::Default);
        assert_eq!(config.rollback_identity.source, ConfigSource::Default);
        assert_eq!(config.user_id.value, "fileuser");
        assert_eq!(config.user_id.source, ConfigSource::File);
    }
}
