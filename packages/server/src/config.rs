//! Server configuration
//!
//! Settings are read from an optional JSON file and then overridden by
//! environment variables. Every field has a default, so a missing file or a
//! file written by an older version both load cleanly.
//!
//! # Environment Variables
//!
//! - `NOTESPACE_CONFIG` - config file path (default: `~/.notespace/server.json`)
//! - `NOTESPACE_HOST` - bind address (default: `127.0.0.1`)
//! - `NOTESPACE_PORT` - server port (default: 3001)
//! - `NOTESPACE_DB_PATH` - database file (default: `~/.notespace/database/notespace.db`)
//! - `NOTESPACE_MAX_CONTENT_LENGTH` - content bound in characters (default: 20000)
//! - `CORS_ALLOW_ORIGIN` - comma-separated allowed origins

use notespace_core::models::{NoteLimits, DEFAULT_MAX_CONTENT_LENGTH};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

const CONFIG_FILE: &str = "server.json";

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to get home directory")]
    NoHomeDirectory,

    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid value for {var}: '{value}'")]
    InvalidEnv { var: &'static str, value: String },

    #[error("Invalid setting {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

/// Server settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,

    /// Database file; `None` resolves to the per-user default
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_path: Option<PathBuf>,

    pub max_content_length: usize,

    pub cors_allow_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3001,
            database_path: None,
            max_content_length: DEFAULT_MAX_CONTENT_LENGTH,
            cors_allow_origins: vec![
                "http://localhost:1420".to_string(),
                "http://localhost:5173".to_string(),
            ],
        }
    }
}

impl ServerConfig {
    /// Load from the config file (if present) and apply env overrides
    pub fn load() -> Result<Self, ConfigError> {
        let path = match std::env::var("NOTESPACE_CONFIG") {
            Ok(path) => PathBuf::from(path),
            Err(_) => notespace_home()?.join(CONFIG_FILE),
        };

        let mut config = Self::from_file(&path)?;
        config.apply_env_overrides(|var| std::env::var(var).ok())?;
        Ok(config)
    }

    /// Read a config file, falling back to defaults when it does not exist
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config: Self =
            serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the server cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_content_length == 0 {
            return Err(ConfigError::Invalid {
                field: "maxContentLength",
                reason: "must be at least 1",
            });
        }
        Ok(())
    }

    /// Apply overrides from a variable lookup (normally `std::env::var`)
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        if let Some(host) = lookup("NOTESPACE_HOST") {
            self.host = host;
        }
        if let Some(port) = lookup("NOTESPACE_PORT") {
            self.port = parse_env("NOTESPACE_PORT", port)?;
        }
        if let Some(path) = lookup("NOTESPACE_DB_PATH") {
            self.database_path = Some(PathBuf::from(path));
        }
        if let Some(max) = lookup("NOTESPACE_MAX_CONTENT_LENGTH") {
            let max: usize = parse_env("NOTESPACE_MAX_CONTENT_LENGTH", max)?;
            if max == 0 {
                return Err(ConfigError::InvalidEnv {
                    var: "NOTESPACE_MAX_CONTENT_LENGTH",
                    value: "0".to_string(),
                });
            }
            self.max_content_length = max;
        }
        if let Some(origins) = lookup("CORS_ALLOW_ORIGIN") {
            self.cors_allow_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_string)
                .collect();
        }
        Ok(())
    }

    /// Database path, resolving the per-user default when unset
    pub fn resolved_database_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.database_path {
            Some(path) => Ok(path.clone()),
            None => Ok(notespace_home()?.join("database").join("notespace.db")),
        }
    }

    pub fn note_limits(&self) -> NoteLimits {
        NoteLimits {
            max_content_length: self.max_content_length,
            ..NoteLimits::default()
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn notespace_home() -> Result<PathBuf, ConfigError> {
    dirs::home_dir()
        .map(|home| home.join(".notespace"))
        .ok_or(ConfigError::NoHomeDirectory)
}

fn parse_env<T: std::str::FromStr>(var: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidEnv { var, value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn lookup_from(vars: &[(&'static str, &str)]) -> impl Fn(&'static str) -> Option<String> {
        let map: HashMap<&'static str, String> =
            vars.iter().map(|(k, v)| (*k, v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = ServerConfig::from_file(&temp_dir.path().join("absent.json")).unwrap();
        assert_eq!(config, ServerConfig::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("server.json");
        std::fs::write(&path, r#"{"port": 4000, "maxContentLength": 500}"#).unwrap();

        let config = ServerConfig::from_file(&path).unwrap();
        assert_eq!(config.port, 4000);
        assert_eq!(config.max_content_length, 500);
        assert_eq!(config.host, "127.0.0.1");
    }

    #[test]
    fn test_zero_content_length_in_file_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("server.json");
        std::fs::write(&path, r#"{"maxContentLength": 0}"#).unwrap();

        assert!(matches!(
            ServerConfig::from_file(&path),
            Err(ConfigError::Invalid {
                field: "maxContentLength",
                ..
            })
        ));
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("server.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            ServerConfig::from_file(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = ServerConfig::default();
        config
            .apply_env_overrides(lookup_from(&[
                ("NOTESPACE_PORT", "8080"),
                ("NOTESPACE_DB_PATH", "/tmp/notes.db"),
                ("NOTESPACE_MAX_CONTENT_LENGTH", "42"),
                ("CORS_ALLOW_ORIGIN", "http://a.test, http://b.test"),
            ]))
            .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(
            config.resolved_database_path().unwrap(),
            PathBuf::from("/tmp/notes.db")
        );
        assert_eq!(config.note_limits().max_content_length, 42);
        assert_eq!(
            config.cors_allow_origins,
            vec!["http://a.test".to_string(), "http://b.test".to_string()]
        );
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        let mut config = ServerConfig::default();
        let err = config
            .apply_env_overrides(lookup_from(&[("NOTESPACE_PORT", "eighty")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { var: "NOTESPACE_PORT", .. }));
    }
}
