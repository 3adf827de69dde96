//! Settings resolution
//!
//! Each setting is resolved in priority order:
//! 1. Command-line argument
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::{Error, Result};

pub const ENV_CONFIG: &str = "MARQUEE_CONFIG";
pub const ENV_BACKEND: &str = "MARQUEE_BACKEND";
pub const ENV_DATASET: &str = "MARQUEE_DATASET";
pub const ENV_DATABASE: &str = "MARQUEE_DATABASE";
pub const ENV_LOG_LEVEL: &str = "MARQUEE_LOG_LEVEL";

pub const DEFAULT_DATASET: &str = "data/movies.csv";
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Storage backend behind the repository handle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Memory,
    Sqlite,
}

impl FromStr for BackendKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(BackendKind::Memory),
            "sqlite" => Ok(BackendKind::Sqlite),
            other => Err(Error::Config(format!(
                "unknown backend '{}' (expected 'memory' or 'sqlite')",
                other
            ))),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Memory => write!(f, "memory"),
            BackendKind::Sqlite => write!(f, "sqlite"),
        }
    }
}

/// Contents of `config.toml`; every key is optional
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TomlConfig {
    pub backend: Option<BackendKind>,
    pub dataset: Option<PathBuf>,
    pub database: Option<PathBuf>,
    pub log_level: Option<String>,
    pub reseed: Option<bool>,
}

/// Values given on the command line
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub config_file: Option<PathBuf>,
    pub backend: Option<BackendKind>,
    pub dataset: Option<PathBuf>,
    pub database: Option<PathBuf>,
    pub log_level: Option<String>,
    pub reseed: bool,
}

/// Fully resolved runtime settings
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub backend: BackendKind,
    pub dataset_path: PathBuf,
    pub database_path: PathBuf,
    pub log_level: String,
    /// Wipe and repopulate a persistent backend at startup
    pub reseed: bool,
}

impl Settings {
    pub fn resolve(overrides: &Overrides) -> Result<Self> {
        let file = match config_path(overrides) {
            Some(path) => load_toml(&path)?,
            None => TomlConfig::default(),
        };

        let backend = match overrides.backend {
            Some(backend) => backend,
            None => match env_var(ENV_BACKEND) {
                Some(value) => value.parse()?,
                None => file.backend.unwrap_or_default(),
            },
        };

        let dataset_path = overrides
            .dataset
            .clone()
            .or_else(|| env_var(ENV_DATASET).map(PathBuf::from))
            .or(file.dataset)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATASET));

        let database_path = overrides
            .database
            .clone()
            .or_else(|| env_var(ENV_DATABASE).map(PathBuf::from))
            .or(file.database)
            .unwrap_or_else(default_database_path);

        let log_level = overrides
            .log_level
            .clone()
            .or_else(|| env_var(ENV_LOG_LEVEL))
            .or(file.log_level)
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());

        let settings = Settings {
            backend,
            dataset_path,
            database_path,
            log_level,
            reseed: overrides.reseed || file.reseed.unwrap_or(false),
        };
        debug!("Resolved settings: {:?}", settings);
        Ok(settings)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            dataset_path: PathBuf::from(DEFAULT_DATASET),
            database_path: default_database_path(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            reseed: false,
        }
    }
}

/// `<config_dir>/marquee/config.toml` for the current platform
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("marquee").join("config.toml"))
}

/// `<data_local_dir>/marquee/marquee.db`, or the working directory when the
/// platform has no data directory
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("marquee"))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("marquee.db")
}

/// Read a TOML config file. A missing file yields the empty config.
pub fn load_toml(path: &Path) -> Result<TomlConfig> {
    match std::fs::read_to_string(path) {
        Ok(content) => toml::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!("Config file not found: {}, using defaults", path.display());
            Ok(TomlConfig::default())
        }
        Err(e) => Err(Error::Io(e)),
    }
}

fn config_path(overrides: &Overrides) -> Option<PathBuf> {
    overrides
        .config_file
        .clone()
        .or_else(|| env_var(ENV_CONFIG).map(PathBuf::from))
        .or_else(default_config_path)
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_parse() {
        assert_eq!("memory".parse::<BackendKind>().unwrap(), BackendKind::Memory);
        assert_eq!(" SQLite ".parse::<BackendKind>().unwrap(), BackendKind::Sqlite);
        assert!(matches!(
            "postgres".parse::<BackendKind>(),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_toml_keys() {
        let config: TomlConfig = toml::from_str(
            r#"
            backend = "sqlite"
            dataset = "/srv/movies.csv"
            reseed = true
            "#,
        )
        .unwrap();

        assert_eq!(config.backend, Some(BackendKind::Sqlite));
        assert_eq!(config.dataset, Some(PathBuf::from("/srv/movies.csv")));
        assert_eq!(config.database, None);
        assert_eq!(config.reseed, Some(true));
    }

    #[test]
    fn test_toml_rejects_unknown_backend() {
        assert!(toml::from_str::<TomlConfig>("backend = \"mysql\"").is_err());
    }

    #[test]
    fn test_default_database_path_name() {
        assert!(default_database_path().ends_with("marquee.db"));
    }
}
