//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub datasource: DatasourceConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// CnosDB connection configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DatasourceConfig {
    #[serde(default = "default_url")]
    pub url: String,

    #[serde(default = "default_database")]
    pub database: String,

    /// Pre-encoded Basic credential, sent as `Authorization: Basic <auth>`
    #[serde(default)]
    pub auth: Option<String>,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_url() -> String {
    "http://localhost:8902".to_string()
}

fn default_database() -> String {
    "public".to_string()
}

fn default_timeout() -> u64 {
    10
}

impl Default for DatasourceConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            database: default_database(),
            auth: None,
            timeout_secs: default_timeout(),
        }
    }
}

/// API server configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Allowed CORS origins; empty allows any origin
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8903
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
        }
    }
}

impl ApiConfig {
    /// Create config with custom host and port
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// Get the socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// `pretty` or `json`
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load an explicit file, or fall back to the default locations
    pub fn resolve(path: Option<&Path>) -> Result<LoadedConfig, ConfigError> {
        match path {
            Some(path) => Ok(LoadedConfig {
                config: Self::load_with_env(path)?,
                source: ConfigSource::File(path.to_path_buf()),
                skipped: Vec::new(),
            }),
            None => Ok(Self::load_default()),
        }
    }

    /// Load from default locations or environment
    pub fn load_default() -> LoadedConfig {
        let config_paths: Vec<PathBuf> = [
            dirs::config_dir().map(|p| p.join("cnosdb-datasource").join("config.toml")),
            Some(PathBuf::from("/etc/cnosdb-datasource/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ]
        .into_iter()
        .flatten()
        .collect();

        Self::load_first(&config_paths)
    }

    /// Load the first existing candidate that parses
    fn load_first(candidates: &[PathBuf]) -> LoadedConfig {
        let mut skipped = Vec::new();

        for path in candidates.iter().filter(|p| p.exists()) {
            match Self::load_with_env(path) {
                Ok(config) => {
                    return LoadedConfig {
                        config,
                        source: ConfigSource::File(path.clone()),
                        skipped,
                    }
                }
                Err(e) => skipped.push(e),
            }
        }

        LoadedConfig {
            config: Self::from_env(),
            source: ConfigSource::Defaults,
            skipped,
        }
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        // Datasource overrides
        if let Some(url) = lookup("CNOSDB_DS_URL") {
            self.datasource.url = url;
        }
        if let Some(database) = lookup("CNOSDB_DS_DATABASE") {
            self.datasource.database = database;
        }
        if let Some(auth) = lookup("CNOSDB_DS_AUTH") {
            self.datasource.auth = Some(auth);
        }

        // API overrides
        if let Some(host) = lookup("CNOSDB_DS_API_HOST") {
            self.api.host = host;
        }
        if let Some(port) = lookup("CNOSDB_DS_API_PORT") {
            if let Ok(p) = port.parse() {
                self.api.port = p;
            }
        }

        // Logging overrides
        if let Some(level) = lookup("CNOSDB_DS_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("CNOSDB_DS_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Where the active configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    Defaults,
}

/// A resolved configuration and how it was found
///
/// Loading happens before logging is set up, so the outcome is kept here
/// and reported through [`LoadedConfig::log`] afterwards.
#[derive(Debug)]
pub struct LoadedConfig {
    pub config: Config,
    pub source: ConfigSource,
    /// Candidate files that exist but failed to load
    pub skipped: Vec<ConfigError>,
}

impl LoadedConfig {
    /// Report how the configuration was resolved
    pub fn log(&self) {
        for err in &self.skipped {
            tracing::warn!("Skipping config: {}", err);
        }
        match &self.source {
            ConfigSource::File(path) => tracing::info!("Loaded config from {:?}", path),
            ConfigSource::Defaults => {
                tracing::info!("Using default config with environment overrides")
            }
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# CnosDB Datasource Configuration
#
# Environment variables override these settings:
# - CNOSDB_DS_URL
# - CNOSDB_DS_DATABASE
# - CNOSDB_DS_AUTH
# - CNOSDB_DS_API_HOST
# - CNOSDB_DS_API_PORT
# - CNOSDB_DS_LOG_LEVEL
# - CNOSDB_DS_LOG_FORMAT

[datasource]
# CnosDB HTTP endpoint
url = "http://localhost:8902"

# Database queries run against
database = "public"

# Base64 of "user:password", sent as a Basic credential
# auth = "cm9vdDo="

# Request timeout in seconds
timeout_secs = 10

[api]
# API server host
host = "0.0.0.0"

# API server port
port = 8903

# Allowed CORS origins (empty allows any origin)
cors_origins = []

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config_template_matches_defaults() {
        let parsed: Config = toml::from_str(&generate_default_config()).unwrap();
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[datasource]\nurl = \"http://cnosdb:8902\"\nauth = \"cm9vdDo=\"\n\n[api]\nport = 9000"
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.datasource.url, "http://cnosdb:8902");
        assert_eq!(config.datasource.database, "public");
        assert_eq!(config.datasource.auth.as_deref(), Some("cm9vdDo="));
        assert_eq!(config.api.port, 9000);
        assert_eq!(config.api.host, "0.0.0.0");
        assert_eq!(config.logging, LoggingConfig::default());
    }

    #[test]
    fn test_load_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.toml");
        assert!(matches!(Config::load(&missing), Err(ConfigError::Io { .. })));

        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[api\nport = ").unwrap();
        assert!(matches!(
            Config::load(file.path()),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_resolve_reports_source() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[api]\nport = 9100").unwrap();

        let loaded = Config::resolve(Some(file.path())).unwrap();
        assert_eq!(loaded.source, ConfigSource::File(file.path().to_path_buf()));
        assert!(loaded.skipped.is_empty());

        let missing = file.path().with_extension("missing");
        assert!(matches!(
            Config::resolve(Some(&missing)),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn test_load_first_skips_broken_candidates() {
        let dir = tempfile::tempdir().unwrap();
        let absent = dir.path().join("absent.toml");
        let broken = dir.path().join("broken.toml");
        let good = dir.path().join("good.toml");
        std::fs::write(&broken, "[api\nport = ").unwrap();
        std::fs::write(&good, "[datasource]\ndatabase = \"metrics\"").unwrap();

        let loaded = Config::load_first(&[absent.clone(), broken.clone(), good.clone()]);
        assert_eq!(loaded.source, ConfigSource::File(good));
        assert_eq!(loaded.skipped.len(), 1);
        assert!(matches!(
            &loaded.skipped[0],
            ConfigError::Parse { path, .. } if *path == broken
        ));

        let loaded = Config::load_first(&[absent]);
        assert_eq!(loaded.source, ConfigSource::Defaults);
        assert!(loaded.skipped.is_empty());
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("CNOSDB_DS_URL", "http://db:8902"),
            ("CNOSDB_DS_DATABASE", "metrics"),
            ("CNOSDB_DS_API_PORT", "not-a-port"),
            ("CNOSDB_DS_API_HOST", "127.0.0.1"),
            ("CNOSDB_DS_LOG_FORMAT", "json"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.datasource.url, "http://db:8902");
        assert_eq!(config.datasource.database, "metrics");
        assert_eq!(config.datasource.auth, None);
        assert_eq!(config.api.host, "127.0.0.1");
        assert_eq!(config.api.port, 8903);
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_api_addr() {
        assert_eq!(ApiConfig::new("127.0.0.1", 3000).addr(), "127.0.0.1:3000");
    }
}
